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

use serde::{Deserialize, Serialize};
use std::fmt;

/// An Etsy shop listing as returned by the Open API v3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub state: String, // "active", "inactive", "draft", ...
    #[serde(default)]
    pub url: String,
}

/// One page of `GET /application/shops/{shop_id}/listings`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingsPage {
    pub count: u64, // Total across all pages, not the page size.
    #[serde(default)]
    pub results: Vec<Listing>,
}

/// Partial update; only the supplied fields are sent in the PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ListingUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_none() && self.description.is_none()
    }
}

/// What `update_listing` did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Nothing was supplied, so nothing was sent.
    NoChanges,
    /// The payload that would have been sent.
    DryRun {
        listing_id: u64,
        payload: ListingUpdate,
    },
    /// Raw API response of the PATCH.
    Applied { response: serde_json::Value },
}

/// Heuristic findings for a single listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingAudit {
    pub listing_id: u64,
    pub title: String,
    pub tag_count: usize,
    pub issues: Vec<String>,
    pub url: String,
}

impl ListingAudit {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ListingAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.issues.is_empty() {
            "OK".to_string()
        } else {
            self.issues.join("; ")
        };

        write!(
            f,
            "[{}] {} ({} tags) -> {}",
            self.listing_id, self.title, self.tag_count, status
        )
    }
}

/// Summary of an audit run over all active listings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub entries: Vec<ListingAudit>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ListingAudit) {
        self.entries.push(entry);
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn with_issues(&self) -> usize {
        self.entries.iter().filter(|e| e.has_issues()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn audit(id: u64, issues: &[&str]) -> ListingAudit {
        ListingAudit {
            listing_id: id,
            title: "Polymer Clay Daisy Earrings".to_string(),
            tag_count: 13,
            issues: issues.iter().map(|s| s.to_string()).collect(),
            url: "https://www.etsy.com/listing/1".to_string(),
        }
    }

    #[test]
    fn test_listing_deserializes_with_missing_optional_fields() {
        let listing: Listing = serde_json::from_value(json!({
            "listing_id": 123,
            "title": "Daisy Earrings",
            "state": "active",
            "images": []
        }))
        .unwrap();
        assert_eq!(listing.listing_id, 123);
        assert!(listing.tags.is_empty());
        assert!(listing.url.is_empty());
    }

    #[test]
    fn test_update_serializes_only_supplied_fields() {
        let update = ListingUpdate {
            title: Some("New".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"title": "New"}));
        assert!(!update.is_empty());
        assert!(ListingUpdate::default().is_empty());
    }

    #[test]
    fn test_audit_display() {
        let clean = format!("{}", audit(1, &[]));
        assert!(clean.contains("-> OK"));

        let flagged = format!("{}", audit(2, &["tags: only 4 tags (aim for 13)", "x"]));
        assert!(flagged.contains("[2]"));
        assert!(flagged.contains("only 4 tags (aim for 13); x"));
    }

    #[test]
    fn test_audit_report_aggregation() {
        let mut report = AuditReport::new();
        assert_eq!(report.total(), 0);

        report.add(audit(1, &[]));
        report.add(audit(2, &["title: missing 'polymer clay' prefix"]));
        report.add(audit(3, &["a", "b"]));

        assert_eq!(report.total(), 3);
        assert_eq!(report.with_issues(), 2);
    }
}
