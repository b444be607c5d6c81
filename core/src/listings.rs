use crate::client::{ClientError, EtsyClient};
use crate::models::{AuditReport, Listing, ListingAudit, ListingUpdate, ListingsPage, UpdateOutcome};
use crate::validation::{validate_update, ValidationError};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use log::{debug, info};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Etsy's maximum page size for listing queries.
pub const PAGE_SIZE: u64 = 100;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Failed to write audit file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize audit: {0}")]
    Json(#[from] serde_json::Error),
}

/// Heuristics applied by [`ListingManager::audit_listings`].
#[derive(Debug, Clone)]
pub struct AuditRules {
    /// Lower-case prefix every title should start with.
    pub title_prefix: String,
    pub min_tags: usize,
}

impl Default for AuditRules {
    fn default() -> Self {
        Self {
            title_prefix: "polymer clay".to_string(),
            min_tags: 10,
        }
    }
}

impl AuditRules {
    pub fn check(&self, listing: &Listing) -> ListingAudit {
        let mut issues = Vec::new();

        if !listing
            .title
            .to_lowercase()
            .starts_with(&self.title_prefix.to_lowercase())
        {
            issues.push(format!("title: missing '{}' prefix", self.title_prefix));
        }
        if listing.tags.len() < self.min_tags {
            issues.push(format!(
                "tags: only {} tags (aim for 13)",
                listing.tags.len()
            ));
        }
        let single_word: Vec<&str> = listing
            .tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.contains(char::is_whitespace))
            .collect();
        if !single_word.is_empty() {
            issues.push(format!("tags: single-word tags: {single_word:?}"));
        }

        ListingAudit {
            listing_id: listing.listing_id,
            title: listing.title.clone(),
            tag_count: listing.tags.len(),
            issues,
            url: listing.url.clone(),
        }
    }
}

/// Reads, updates and audits the listings of one Etsy shop.
pub struct ListingManager {
    client: EtsyClient,
    shop_id: String,
    rules: AuditRules,
}

impl ListingManager {
    pub fn new(client: EtsyClient, shop_id: impl Into<String>) -> Self {
        Self {
            client,
            shop_id: shop_id.into(),
            rules: AuditRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: AuditRules) -> Self {
        self.rules = rules;
        self
    }

    /// Streams every active listing, one page of [`PAGE_SIZE`] at a time.
    ///
    /// Pagination stops once the offset reaches the total `count` reported by
    /// the API. Each call starts again from offset zero.
    pub fn iterate_active_listings(&self) -> BoxStream<'_, Result<Listing, ListingError>> {
        stream::try_unfold(Some(0u64), move |offset| async move {
            let Some(offset) = offset else {
                return Ok::<_, ListingError>(None);
            };
            let page = self.fetch_active_page(offset).await?;
            let next = offset + PAGE_SIZE;
            let next_state = (next < page.count).then_some(next);
            Ok(Some((page.results, next_state)))
        })
        .map_ok(|results| stream::iter(results.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn fetch_active_page(&self, offset: u64) -> Result<ListingsPage, ListingError> {
        debug!("Fetching active listings at offset {offset}");
        let path = format!("/application/shops/{}/listings", self.shop_id);
        let page = self
            .client
            .get(
                &path,
                &[
                    ("state", "active".to_string()),
                    ("limit", PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                    ("includes", "Images".to_string()),
                ],
            )
            .await?;
        Ok(page)
    }

    pub async fn get_listing(&self, listing_id: u64) -> Result<Listing, ListingError> {
        let path = format!("/application/listings/{listing_id}");
        Ok(self.client.get(&path, &[]).await?)
    }

    /// Validates and applies a partial update.
    ///
    /// Limits are checked before any request is made. With `dry_run` the
    /// payload is only echoed back.
    pub async fn update_listing(
        &self,
        listing_id: u64,
        update: ListingUpdate,
        dry_run: bool,
    ) -> Result<UpdateOutcome, ListingError> {
        validate_update(&update)?;

        if update.is_empty() {
            return Ok(UpdateOutcome::NoChanges);
        }

        if dry_run {
            info!(
                "[DRY RUN] Would PATCH listing {listing_id}:\n{}",
                serde_json::to_string_pretty(&update)?
            );
            return Ok(UpdateOutcome::DryRun {
                listing_id,
                payload: update,
            });
        }

        let path = format!("/application/shops/{}/listings/{listing_id}", self.shop_id);
        let response = self.client.patch(&path, &update).await?;
        info!("Updated listing {listing_id}");
        Ok(UpdateOutcome::Applied { response })
    }

    /// Checks every active listing against the audit rules.
    ///
    /// When `output_file` is given the per-listing entries are written there
    /// as a JSON array.
    pub async fn audit_listings(
        &self,
        output_file: Option<&Path>,
    ) -> Result<AuditReport, ListingError> {
        info!("Fetching all active listings...");
        let mut report = AuditReport::new();
        let mut listings = self.iterate_active_listings();

        while let Some(listing) = listings.try_next().await? {
            report.add(self.rules.check(&listing));
        }

        if let Some(path) = output_file {
            fs::write(path, serde_json::to_string_pretty(&report.entries)?)?;
            info!("Audit saved to {}", path.display());
        }

        info!(
            "Total: {} listings, {} with issues",
            report.total(),
            report.with_issues()
        );
        Ok(report)
    }
}
