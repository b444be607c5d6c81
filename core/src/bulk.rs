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

use crate::seo::fixer::CSV_DELIMITER;
use crate::seo::SeoError;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Export rows shorter than this are ignored.
pub const MIN_COLUMNS: usize = 10;

const ID_COLUMN: usize = 0;
const NAME_COLUMN: usize = 1;
const SKU_COLUMN: usize = 4;
const DESCRIPTION_COLUMN: usize = 9;

const OUTPUT_HEADER: [&str; 5] = ["produkt_id", "sku", "stara_nazwa", "nowa_nazwa", "opis"];

/// New title and the HTML block appended to the description of one product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkUpdate {
    pub title: String,
    pub html_block: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkRow {
    pub produkt_id: String,
    pub sku: String,
    pub stara_nazwa: String,
    pub nowa_nazwa: String,
    pub opis: String,
}

/// Reads the lookup table, keyed by product id.
pub fn load_updates(path: &Path) -> Result<HashMap<String, BulkUpdate>, SeoError> {
    let content = fs::read_to_string(path)?;
    let updates: HashMap<String, BulkUpdate> = serde_json::from_str(&content)?;
    debug!("Loaded {} bulk updates from {}", updates.len(), path.display());
    Ok(updates)
}

/// Builds the output row for a product listed in `updates`.
pub fn rewrite_record(
    record: &StringRecord,
    updates: &HashMap<String, BulkUpdate>,
) -> Option<BulkRow> {
    if record.len() < MIN_COLUMNS {
        return None;
    }
    let field = |i: usize| record.get(i).unwrap_or_default().to_string();
    let produkt_id = field(ID_COLUMN);
    let update = updates.get(&produkt_id)?;

    Some(BulkRow {
        sku: field(SKU_COLUMN),
        stara_nazwa: field(NAME_COLUMN),
        nowa_nazwa: update.title.clone(),
        opis: format!("{}{}", field(DESCRIPTION_COLUMN), update.html_block),
        produkt_id,
    })
}

/// Rewrites a product export, keeping only products found in `updates`.
///
/// Returns the number of rows written, not counting the header.
pub fn rewrite(
    input: &Path,
    output: &Path,
    updates: &HashMap<String, BulkUpdate>,
) -> Result<usize, SeoError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .from_path(input)?;

    let mut writer = WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_path(output)?;
    writer.write_record(OUTPUT_HEADER)?;

    let mut written = 0;
    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row {} in {}: {}", i + 1, input.display(), e);
                continue;
            }
        };
        if let Some(row) = rewrite_record(&record, updates) {
            writer.serialize(&row)?;
            written += 1;
        }
    }
    writer.flush()?;

    info!("Saved {written} updated rows to {}", output.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn updates() -> HashMap<String, BulkUpdate> {
        HashMap::from([(
            "42".to_string(),
            BulkUpdate {
                title: "Polymer Clay Pearl Petal Earrings".to_string(),
                html_block: "<p>tags</p>".to_string(),
            },
        )])
    }

    #[test]
    fn test_rewrite_record_maps_columns() {
        let record = StringRecord::from(vec!["42", "Old", "x", "x", "SKU-1", "x", "x", "x", "x", "Desc"]);
        let row = rewrite_record(&record, &updates()).unwrap();
        assert_eq!(row.produkt_id, "42");
        assert_eq!(row.sku, "SKU-1");
        assert_eq!(row.stara_nazwa, "Old");
        assert_eq!(row.nowa_nazwa, "Polymer Clay Pearl Petal Earrings");
        assert_eq!(row.opis, "Desc<p>tags</p>");
    }

    #[test]
    fn test_short_and_unknown_rows_dropped() {
        let short = StringRecord::from(vec!["42", "Old", "x"]);
        assert!(rewrite_record(&short, &updates()).is_none());

        let unknown = StringRecord::from(vec!["7"; 10]);
        assert!(rewrite_record(&unknown, &updates()).is_none());
    }

    #[test]
    fn test_load_updates() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"42": {{"title": "New", "html_block": "<b>x</b>"}}}}"#
        )
        .unwrap();

        let loaded = load_updates(file.path()).unwrap();
        assert_eq!(loaded["42"].title, "New");
        assert_eq!(loaded["42"].html_block, "<b>x</b>");
    }

    #[test]
    fn test_load_updates_rejects_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_updates(file.path()), Err(SeoError::Json(_))));
    }
}
