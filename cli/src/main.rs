/*
    etsy-seo-rs | Rust CLI tool to audit and fix Etsy listing SEO.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use etsy_seo_core::bulk;
use etsy_seo_core::seo::{process_tags, process_titles_and_descriptions};
use etsy_seo_core::{
    Authenticator, Config, EtsyClient, ListingManager, ListingUpdate, UpdateOutcome,
};
use futures::TryStreamExt;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "etsy-seo")]
#[command(about = "A tool to audit and fix the SEO of your Etsy listings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the OAuth2 PKCE flow in your browser and stores the token
    Auth,
    /// Lists all active listings of the shop
    List,
    /// Prints the full JSON of a single listing
    Get {
        /// The Etsy listing ID
        #[arg(value_name = "LISTING_ID")]
        listing_id: u64,
    },
    /// Updates the title, tags or description of a listing. Dry run unless --apply is given.
    Update {
        #[arg(value_name = "LISTING_ID")]
        listing_id: u64,
        #[arg(long)]
        title: Option<String>,
        /// Comma-separated tags (e.g., --tags "gift for her,boho style")
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Read the new description from a file
        #[arg(long)]
        description_file: Option<PathBuf>,
        /// Actually send the PATCH request
        #[arg(long)]
        apply: bool,
    },
    /// Checks every active listing for common SEO issues
    Audit {
        /// Output the audit to a JSON file (e.g., --json=audit.json)
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Rewrites titles and descriptions in a semicolon-separated CSV export
    FixTitles {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Rewrites the tag columns in a semicolon-separated CSV export
    FixTags {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Applies a JSON lookup table of titles and HTML blocks to a product export
    Bulk {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// JSON object keyed by product id: {"<id>": {"title": ..., "html_block": ...}}
        #[arg(long)]
        updates: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // A missing .env is fine; the variables may come from the environment.
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => handle_auth().await,
        Commands::List => handle_list().await,
        Commands::Get { listing_id } => handle_get(listing_id).await,
        Commands::Update {
            listing_id,
            title,
            tags,
            description_file,
            apply,
        } => {
            handle_update(listing_id, title, tags, description_file.as_deref(), apply).await;
        }
        Commands::Audit { json } => handle_audit(json.as_deref()).await,
        Commands::FixTitles { input, output } => handle_fix_titles(&input, &output),
        Commands::FixTags { input, output } => handle_fix_tags(&input, &output),
        Commands::Bulk {
            input,
            output,
            updates,
        } => handle_bulk(&input, &output, &updates),
    }
}

fn load_config() -> Config {
    match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] Configuration error: {}", e);
            process::exit(1);
        }
    }
}

async fn build_manager() -> anyhow::Result<ListingManager> {
    let config = Config::from_env().context("Configuration error")?;
    let shop_id = config.require_shop_id()?.to_string();
    debug!("Using shop {} at {}", shop_id, config.api_base_url);
    let token = Authenticator::new(&config)
        .load_or_authenticate()
        .await
        .context("Authentication failed")?;
    let client = EtsyClient::new(
        config.api_key.clone(),
        &token,
        config.api_base_url.clone(),
        config.request_interval,
    );
    Ok(ListingManager::new(client, shop_id))
}

async fn get_manager() -> ListingManager {
    match build_manager().await {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error initializing Etsy client: {:#}", e);
            process::exit(1);
        }
    }
}

async fn handle_auth() {
    let config = load_config();
    let authenticator = Authenticator::new(&config);
    println!("Opening Etsy authorization in your browser...");

    match authenticator.authenticate().await {
        Ok(token) => {
            println!();
            println!(
                "[OK] Token saved to: {}",
                authenticator.store().path().display()
            );
            println!("Expires in:     {}s", token.expires_in);
            println!(
                "Refresh token:  {}",
                if token.refresh_token.is_some() { "Yes" } else { "No" }
            );
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Authentication failed: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_list() {
    let manager = get_manager().await;
    println!("Fetching active listings...");

    let listings: Result<Vec<_>, _> = manager.iterate_active_listings().try_collect().await;
    match listings {
        Ok(listings) => {
            println!();
            println!("{:<12} | {:<60} | {:<4}", "ID", "Title", "Tags");
            println!("{:-<12}-+-{:-<60}-+-{:-<4}", "", "", "");

            for listing in &listings {
                let title = if listing.title.chars().count() > 58 {
                    format!("{}..", listing.title.chars().take(58).collect::<String>())
                } else {
                    listing.title.clone()
                };
                println!(
                    "{:<12} | {:<60} | {:<4}",
                    listing.listing_id,
                    title,
                    listing.tags.len()
                );
            }
            println!();
            println!("Total: {} active listings", listings.len());
            println!("Tip: Copy an ID and run 'etsy-seo get <ID>'");
        }
        Err(e) => {
            eprintln!("Failed to list listings: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_get(listing_id: u64) {
    let manager = get_manager().await;

    match manager.get_listing(listing_id).await {
        Ok(listing) => match serde_json::to_string_pretty(&listing) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("[ERROR] Failed to render listing: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Failed to fetch listing {}: {}", listing_id, e);
            process::exit(1);
        }
    }
}

async fn handle_update(
    listing_id: u64,
    title: Option<String>,
    tags: Option<Vec<String>>,
    description_file: Option<&Path>,
    apply: bool,
) {
    let description = match description_file {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                eprintln!(
                    "[ERROR] Failed to read description file '{}': {}",
                    path.display(),
                    e
                );
                process::exit(1);
            }
        },
        None => None,
    };

    let update = ListingUpdate {
        title,
        tags: tags.map(|tags| tags.into_iter().map(|t| t.trim().to_string()).collect()),
        description,
    };

    let manager = get_manager().await;

    match manager.update_listing(listing_id, update, !apply).await {
        Ok(UpdateOutcome::NoChanges) => {
            println!("[OK] No changes requested for listing {}.", listing_id);
        }
        Ok(UpdateOutcome::DryRun { listing_id, payload }) => {
            println!("[DRY RUN] Would PATCH listing {}:", listing_id);
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_default()
            );
            println!();
            println!("Re-run with --apply to send the update.");
        }
        Ok(UpdateOutcome::Applied { response }) => {
            println!("[UPDATED] Listing {} updated.", listing_id);
            println!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_default()
            );
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Update failed: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_audit(json_path: Option<&Path>) {
    let manager = get_manager().await;
    println!("Starting audit of active listings...");

    match manager.audit_listings(json_path).await {
        Ok(report) => {
            println!();
            println!("---------------------------------------------------");
            println!("SEO AUDIT REPORT");
            println!("---------------------------------------------------");
            println!("Total Listings Scanned: {}", report.total());
            println!("Listings With Issues:   {}", report.with_issues());
            println!("---------------------------------------------------");

            if report.with_issues() > 0 {
                println!();
                println!("Found the following issues:");
                for (i, entry) in report.entries.iter().filter(|e| e.has_issues()).enumerate() {
                    println!("{}. {}", i + 1, entry);
                }
            } else {
                println!();
                println!("No SEO issues found. Clean!");
            }

            if let Some(path) = json_path {
                println!();
                println!("[SAVED] Audit saved to: {}", path.display());
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("Audit failed: {}", e);
            process::exit(1);
        }
    }
}

fn handle_fix_titles(input: &Path, output: &Path) {
    match process_titles_and_descriptions(input, output) {
        Ok(rows) => {
            for row in &rows {
                println!("[{}] {}", row.produkt_id, row.poprzedni_tytul_seo);
                println!("   -> {}", row.nowy_tytul_seo);
            }
            println!();
            println!("[SAVED] {} rows saved to: {}", rows.len(), output.display());
        }
        Err(e) => {
            eprintln!("[ERROR] Failed to fix titles: {}", e);
            process::exit(1);
        }
    }
}

fn handle_fix_tags(input: &Path, output: &Path) {
    match process_tags(input, output) {
        Ok(rows) => {
            for row in &rows {
                println!("[{}] {} tags: {}", row.produkt_id, row.tags.len(), row.tags.join(", "));
            }
            println!();
            println!("[SAVED] {} rows saved to: {}", rows.len(), output.display());
        }
        Err(e) => {
            eprintln!("[ERROR] Failed to fix tags: {}", e);
            process::exit(1);
        }
    }
}

fn handle_bulk(input: &Path, output: &Path, updates_path: &Path) {
    let result = bulk::load_updates(updates_path)
        .and_then(|updates| bulk::rewrite(input, output, &updates));

    match result {
        Ok(count) => println!("[SAVED] {} updated rows saved to: {}", count, output.display()),
        Err(e) => {
            eprintln!("[ERROR] Bulk rewrite failed: {}", e);
            process::exit(1);
        }
    }
}
