// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image reference resolution.
//
// Store rows carry either an absolute URL or a path relative to the public
// storage bucket.  Some relative prefixes point at assets that were never
// uploaded; those rows are flagged invalid so photo-bearing feeds skip them,
// but their joined URL is still reported for diagnostics.

use souk_core::AppConfig;
use souk_core::types::{RawProductRecord, ResolvedProductRecord};

/// Schemes that mark a reference as already absolute.
const ABSOLUTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Outcome of resolving one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: Option<String>,
    pub valid: bool,
}

impl ResolvedImage {
    fn missing() -> Self {
        Self {
            url: None,
            valid: false,
        }
    }
}

/// Resolves image references against a storage base URL.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    /// Base URL without a trailing slash.
    base_url: String,
    broken_prefixes: Vec<String>,
}

impl ImageResolver {
    /// Empty prefixes are ignored; they would otherwise mark every path broken.
    pub fn new(base_url: &str, broken_prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            broken_prefixes: broken_prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.storage_base_url, config.broken_image_prefixes.iter().cloned())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(&self, raw_ref: Option<&str>) -> ResolvedImage {
        let Some(raw) = raw_ref.filter(|r| !r.is_empty()) else {
            return ResolvedImage::missing();
        };

        if ABSOLUTE_SCHEMES.iter().any(|s| raw.starts_with(s)) {
            return ResolvedImage {
                url: Some(raw.to_string()),
                valid: true,
            };
        }

        let broken = self.broken_prefixes.iter().any(|p| raw.starts_with(p.as_str()));
        ResolvedImage {
            url: Some(self.join(raw)),
            valid: !broken,
        }
    }

    /// Annotate a store row with its resolved image.
    pub fn resolve_record(&self, record: RawProductRecord) -> ResolvedProductRecord {
        let image = self.resolve(record.image_ref());
        ResolvedProductRecord {
            record,
            resolved_image_url: image.url,
            has_valid_image: image.valid,
        }
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
