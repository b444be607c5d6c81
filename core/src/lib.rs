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

pub mod auth;
pub mod bulk;
pub mod client;
pub mod config;
pub mod http;
pub mod listings;
pub mod models;
pub mod rate_limit;
pub mod seo;
pub mod token;
pub mod validation;

// Re-export key items for convenience
pub use auth::{AuthError, Authenticator, BrowserPrompt, ConsentPrompt};
pub use client::{ClientError, EtsyClient};
pub use config::{Config, ConfigError};
pub use listings::{AuditRules, ListingError, ListingManager};
pub use models::{AuditReport, Listing, ListingAudit, ListingUpdate, UpdateOutcome};
pub use seo::SeoError;
pub use token::{Token, TokenError, TokenStore};
pub use validation::ValidationError;
