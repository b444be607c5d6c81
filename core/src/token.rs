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

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Failed to access token file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Token file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// OAuth token as returned by the token endpoint.
///
/// Expiry is recorded but never checked; an expired token surfaces as an
/// API error on the first request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Single-file token cache.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Token, TokenError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| TokenError::Io {
            path: self.path.clone(),
            source,
        })?;
        let token = serde_json::from_str(&raw)?;
        debug!("Loaded token from {}", self.path.display());
        Ok(token)
    }

    /// Overwrites the token file with whatever the token endpoint returned.
    pub fn save_raw(&self, value: &serde_json::Value) -> Result<(), TokenError> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, content).map_err(|source| TokenError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Token written to {}", self.path.display());
        Ok(())
    }

    pub fn save(&self, token: &Token) -> Result<(), TokenError> {
        self.save_raw(&serde_json::to_value(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(!store.exists());

        let token = Token {
            access_token: "123.abc".to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
            refresh_token: Some("123.refresh".to_string()),
        };
        store.save(&token).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap(), token);
    }

    #[test]
    fn test_raw_value_saved_without_validation() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save_raw(&json!({"unexpected": true})).unwrap();

        assert!(store.exists());
        assert!(matches!(store.load(), Err(TokenError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(TokenError::Io { .. })));
    }

    #[test]
    fn test_expires_in_defaults_to_zero() {
        let token: Token = serde_json::from_str(r#"{"access_token":"t"}"#).unwrap();
        assert_eq!(token.expires_in, 0);
        assert!(token.refresh_token.is_none());
    }
}
