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

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_AUTH_URL: &str = "https://www.etsy.com/oauth/connect";
pub const DEFAULT_TOKEN_URL: &str = "https://api.etsy.com/v3/public/oauth/token";
pub const DEFAULT_API_BASE_URL: &str = "https://openapi.etsy.com/v3";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_TOKEN_FILE: &str = ".etsy_token.json";
pub const DEFAULT_SCOPES: &str = "listings_r listings_w";

/// Etsy allows roughly 10 requests per second; stay a little under that.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings shared by the authenticator, the API client and the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Etsy keystring. Doubles as the OAuth `client_id` and the `x-api-key` header.
    pub api_key: String,
    pub shop_id: Option<String>,
    pub redirect_uri: Url,
    pub scopes: String,
    pub token_file: PathBuf,
    pub auth_url: String,
    pub token_url: String,
    pub api_base_url: String,
    pub request_interval: Duration,
    /// `None` waits for the OAuth callback forever.
    pub callback_timeout: Option<Duration>,
}

impl Config {
    /// Builds the configuration from process environment variables.
    ///
    /// The CLI loads a `.env` file first, so values there are picked up too.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("ETSY_API_KEY").ok_or(ConfigError::Missing("ETSY_API_KEY"))?;

        let redirect_raw = get("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        let redirect_uri = Url::parse(&redirect_raw).map_err(|e| ConfigError::Invalid {
            name: "REDIRECT_URI",
            reason: e.to_string(),
        })?;

        let request_interval_ms = match get("REQUEST_INTERVAL_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "REQUEST_INTERVAL_MS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_REQUEST_INTERVAL_MS,
        };

        let callback_timeout = match get("CALLBACK_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse::<u64>().map_err(
                |e| ConfigError::Invalid {
                    name: "CALLBACK_TIMEOUT_SECS",
                    reason: e.to_string(),
                },
            )?)),
            None => None,
        };

        Ok(Self {
            api_key,
            shop_id: get("ETSY_SHOP_ID"),
            redirect_uri,
            scopes: get("ETSY_SCOPES").unwrap_or_else(|| DEFAULT_SCOPES.to_string()),
            token_file: PathBuf::from(
                get("TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string()),
            ),
            auth_url: get("ETSY_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("ETSY_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: get("ETSY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_interval: Duration::from_millis(request_interval_ms),
            callback_timeout,
        })
    }

    /// Listing operations are scoped to a shop; auth alone does not need one.
    pub fn require_shop_id(&self) -> Result<&str, ConfigError> {
        self.shop_id
            .as_deref()
            .ok_or(ConfigError::Missing("ETSY_SHOP_ID"))
    }
}
