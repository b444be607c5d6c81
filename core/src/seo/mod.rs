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

//! Offline SEO rewriting of titles, descriptions and tags.

pub mod description;
pub mod fixer;
pub mod tags;
pub mod title;

pub use description::{fix_description, DescriptionMarkers};
pub use fixer::{process_tags, process_titles_and_descriptions, TagRow, TitleRow};
pub use tags::{fix_tag, fix_tags};
pub use title::fix_title;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeoError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
