//! CSV front-end for the title, description and tag rules.
//!
//! Inputs are semicolon-delimited, quoted exports. Outputs quote every field
//! so they re-import cleanly.

use super::description::fix_description;
use super::tags::fix_tags;
use super::title::fix_title;
use super::SeoError;
use crate::validation::MAX_TAGS;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const CSV_DELIMITER: u8 = b';';

/// Input row of the titles/descriptions export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleInputRow {
    #[serde(default)]
    pub produkt_id: String,
    #[serde(default)]
    pub produkt_sku: String,
    #[serde(default)]
    pub stary_tytul: String,
    #[serde(default)]
    pub nowy_tytul_seo: String,
    #[serde(default)]
    pub nowy_opis_seo: String,
}

/// Output row: the previous SEO title is kept next to the rewritten one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleRow {
    pub produkt_id: String,
    pub produkt_sku: String,
    pub stary_tytul: String,
    pub poprzedni_tytul_seo: String,
    pub nowy_tytul_seo: String,
    pub nowy_opis_seo: String,
}

impl From<TitleInputRow> for TitleRow {
    fn from(row: TitleInputRow) -> Self {
        let nowy_tytul_seo = fix_title(&row.nowy_tytul_seo);
        let nowy_opis_seo = fix_description(&row.nowy_opis_seo, &nowy_tytul_seo);
        Self {
            produkt_id: row.produkt_id,
            produkt_sku: row.produkt_sku,
            stary_tytul: row.stary_tytul,
            poprzedni_tytul_seo: row.nowy_tytul_seo,
            nowy_tytul_seo,
            nowy_opis_seo,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagRow {
    pub produkt_id: String,
    pub produkt_sku: String,
    pub tytul: String,
    pub tags: Vec<String>,
}

impl TagRow {
    /// Reads `tag_1` .. `tag_13` from a header-keyed row and fixes them.
    pub fn from_columns(row: &HashMap<String, String>) -> Self {
        let get = |key: &str| row.get(key).cloned().unwrap_or_default();
        let old_tags: Vec<String> = (1..=MAX_TAGS)
            .map(|i| get(&format!("tag_{i}")))
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            produkt_id: get("produkt_id"),
            produkt_sku: get("produkt_sku"),
            tytul: get("tytul"),
            tags: fix_tags(&old_tags),
        }
    }

    fn header() -> Vec<String> {
        let mut header = vec![
            "produkt_id".to_string(),
            "produkt_sku".to_string(),
            "tytul".to_string(),
        ];
        header.extend((1..=MAX_TAGS).map(|i| format!("tag_{i}")));
        header
    }

    fn record(&self) -> Vec<&str> {
        let mut record = vec![
            self.produkt_id.as_str(),
            self.produkt_sku.as_str(),
            self.tytul.as_str(),
        ];
        record.extend((0..MAX_TAGS).map(|i| self.tags.get(i).map_or("", String::as_str)));
        record
    }
}

/// Rewrites titles and descriptions. Rows that fail to parse are skipped.
pub fn process_titles_and_descriptions(
    input: &Path,
    output: &Path,
) -> Result<Vec<TitleRow>, SeoError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(input)?;

    let mut results = Vec::new();
    for (i, row) in reader.deserialize::<TitleInputRow>().enumerate() {
        match row {
            Ok(row) => results.push(TitleRow::from(row)),
            Err(e) => warn!("Skipping malformed row {} in {}: {}", i + 1, input.display(), e),
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .from_path(output)?;
    for row in &results {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} title rows to {}", results.len(), output.display());
    Ok(results)
}

/// Rewrites the tag columns. Rows that fail to parse are skipped.
pub fn process_tags(input: &Path, output: &Path) -> Result<Vec<TagRow>, SeoError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(input)?;
    let headers = reader.headers()?.clone();

    let mut results = Vec::new();
    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => results.push(TagRow::from_columns(&keyed(&headers, &record))),
            Err(e) => warn!("Skipping malformed row {} in {}: {}", i + 1, input.display(), e),
        }
    }

    let mut writer = WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .from_path(output)?;
    writer.write_record(TagRow::header())?;
    for row in &results {
        writer.write_record(row.record())?;
    }
    writer.flush()?;

    info!("Wrote {} tag rows to {}", results.len(), output.display());
    Ok(results)
}

fn keyed(headers: &StringRecord, record: &StringRecord) -> HashMap<String, String> {
    headers
        .iter()
        .zip(record.iter())
        .map(|(h, v)| (h.trim().to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_row_conversion_keeps_previous_title() {
        let row = TitleRow::from(TitleInputRow {
            produkt_id: "1".to_string(),
            produkt_sku: "SKU-1".to_string(),
            stary_tytul: "Old".to_string(),
            nowy_tytul_seo: "Boho Clay Earrings, Gift for Her".to_string(),
            nowy_opis_seo: "★ COLORS: Mint".to_string(),
        });
        assert_eq!(row.poprzedni_tytul_seo, "Boho Clay Earrings, Gift for Her");
        assert_eq!(row.nowy_tytul_seo, "Polymer Clay Boho Earrings, Gift for Her");
        assert!(row.nowy_opis_seo.contains("feature mint tones"));
    }

    #[test]
    fn test_tag_row_from_columns() {
        let mut columns = HashMap::new();
        columns.insert("produkt_id".to_string(), "9".to_string());
        columns.insert("tag_1".to_string(), "Boho".to_string());
        columns.insert("tag_2".to_string(), String::new());
        columns.insert("tag_3".to_string(), "daisy".to_string());

        let row = TagRow::from_columns(&columns);
        assert_eq!(row.produkt_id, "9");
        assert_eq!(row.produkt_sku, "");
        assert_eq!(&row.tags[..2], &["boho style", "daisy earrings"]);
    }

    #[test]
    fn test_tag_record_is_padded_to_thirteen() {
        let row = TagRow {
            produkt_id: "1".to_string(),
            produkt_sku: "S".to_string(),
            tytul: "T".to_string(),
            tags: vec!["a b".to_string()],
        };
        let record = row.record();
        assert_eq!(record.len(), 16);
        assert_eq!(record[3], "a b");
        assert_eq!(record[15], "");
        assert_eq!(TagRow::header().len(), 16);
    }
}
