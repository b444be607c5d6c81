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

use crate::http::build_client;
use crate::rate_limit::RateLimiter;
use crate::token::Token;
use log::{debug, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Wait applied on HTTP 429 when the response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Rate limited by Etsy (waited {0:?}); retry the request")]
    RateLimited(Duration),
    #[error("Etsy API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Thin authenticated wrapper around the Etsy Open API v3.
///
/// Every request carries `x-api-key` and the bearer token, and passes through
/// the fixed-interval limiter first.
pub struct EtsyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: String,
    limiter: Mutex<RateLimiter>,
}

impl EtsyClient {
    pub fn new(
        api_key: impl Into<String>,
        token: &Token,
        base_url: impl Into<String>,
        min_interval: Duration,
    ) -> Self {
        Self {
            http: build_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: token.access_token.clone(),
            limiter: Mutex::new(RateLimiter::new(min_interval)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url} {query:?}");
        let request = self.http.get(url).query(query);
        self.execute(request).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PATCH {url}");
        let request = self.http.patch(url).json(body);
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.limiter.lock().await.wait().await;

        let response = request
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let response = handle_response(response).await?;
        Ok(response.json().await?)
    }
}

/// Maps non-success responses onto [`ClientError`].
///
/// A 429 sleeps for the advertised `Retry-After` before returning, so the
/// caller can re-issue the request immediately.
async fn handle_response(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let wait = retry_after(response.headers());
        warn!("Rate limited. Waiting {}s...", wait.as_secs());
        sleep(wait).await;
        return Err(ClientError::RateLimited(wait));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Seconds from the `Retry-After` header, falling back to five seconds.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}
