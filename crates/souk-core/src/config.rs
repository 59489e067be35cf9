// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Everything that describes the store's asset layout or its legacy
// vocabulary lives here rather than in code, so it can change without a
// release.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoukError};

/// Public storage bucket that relative image paths are resolved against.
pub const DEFAULT_STORAGE_BASE_URL: &str =
    "https://enbrhhuubjvapadqyvds.supabase.co/storage/v1/object/public/products";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL prepended to storage-relative image paths.
    pub storage_base_url: String,
    /// Relative path prefixes whose assets no longer exist in storage.
    pub broken_image_prefixes: Vec<String>,
    /// Per-feed result caps.
    pub feeds: FeedCaps,
    /// Canonical category table, in match-priority order.
    pub categories: Vec<CategoryAliases>,
    /// Freelance rows hidden from listings (seeded test data).
    pub test_records: Vec<TestRecordRule>,
    /// Hosted backend connection.
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_base_url: DEFAULT_STORAGE_BASE_URL.into(),
            broken_image_prefixes: vec!["/winter/".into(), "/perfums/".into()],
            feeds: FeedCaps::default(),
            categories: default_categories(),
            test_records: vec![TestRecordRule {
                title_contains: "sdfgs".into(),
                provider_contains: "tayeb".into(),
            }],
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings that would make every feed silently empty or
    /// produce unusable image URLs.
    pub fn validate(&self) -> Result<()> {
        if !(self.storage_base_url.starts_with("http://")
            || self.storage_base_url.starts_with("https://"))
        {
            return Err(SoukError::Config(format!(
                "storage_base_url must be an http(s) URL, got {:?}",
                self.storage_base_url
            )));
        }
        let caps = [
            ("new_arrivals", self.feeds.new_arrivals),
            ("supplier", self.feeds.supplier),
            ("promo", self.feeds.promo),
            ("all_products", self.feeds.all_products),
            ("by_category", self.feeds.by_category),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, cap)| *cap == 0) {
            return Err(SoukError::Config(format!("feed cap for {name} must be positive")));
        }
        if let Some(cat) = self.categories.iter().find(|c| c.id.is_empty()) {
            return Err(SoukError::Config(format!(
                "category with aliases {:?} has an empty id",
                cat.aliases
            )));
        }
        Ok(())
    }
}

/// Maximum number of records each feed returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCaps {
    pub new_arrivals: usize,
    pub supplier: usize,
    pub promo: usize,
    pub all_products: usize,
    pub by_category: usize,
}

impl Default for FeedCaps {
    fn default() -> Self {
        Self {
            new_arrivals: 10,
            supplier: 20,
            promo: 10,
            all_products: 100,
            by_category: 20,
        }
    }
}

/// One canonical category and the labels it subsumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAliases {
    pub id: String,
    pub aliases: Vec<String>,
}

/// A service is hidden when its title and provider name both contain the
/// given fragments (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecordRule {
    pub title_contains: String,
    pub provider_contains: String,
}

/// Hosted backend (Supabase REST) connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// PostgREST endpoint, e.g. `https://<project>.supabase.co/rest/v1`.
    pub rest_url: Option<String>,
    /// Anonymous API key sent as `apikey` and bearer token.
    pub anon_key: Option<String>,
}

fn category(id: &str, aliases: &[&str]) -> CategoryAliases {
    CategoryAliases {
        id: id.into(),
        aliases: aliases.iter().map(|a| (*a).into()).collect(),
    }
}

/// Legacy French labels and English variants, kept in sync with the website.
pub fn default_categories() -> Vec<CategoryAliases> {
    vec![
        category(
            "Automobiles",
            &["Automobiles", "Véhicules", "Automobiles & Véhicules", "Auto", "Voiture", "Car"],
        ),
        category(
            "Telephones",
            &["Téléphones", "Téléphones & Accessoires", "Mobile", "Phone", "Smartphone"],
        ),
        category("Accessoires", &["Accessoires", "Téléphones & Accessoires", "Accessories"]),
        category(
            "Vetements",
            &["Vêtements", "Vêtements & Mode", "Mode", "Clothes", "Fashion", "Clothing"],
        ),
        category(
            "Electronique",
            &[
                "Électronique",
                "Électroménager",
                "Électroménager & Électronique",
                "Informatique",
                "Technologie",
                "Electronics",
            ],
        ),
        category(
            "Maison",
            &["Maison", "Meubles & Maison", "Meubles", "Matériaux & Équipement", "Home", "Furniture"],
        ),
        category(
            "Beaute",
            &[
                "Beauté",
                "Santé & Beauté",
                "Santé",
                "Parfums",
                "Beauty",
                "Health",
                "Cosmétique",
                "Parfum",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AppConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"feeds": {"new_arrivals": 4}}"#).expect("parse");
        assert_eq!(config.feeds.new_arrivals, 4);
        assert_eq!(config.feeds.supplier, 20);
        assert_eq!(config.storage_base_url, DEFAULT_STORAGE_BASE_URL);
        assert_eq!(config.categories.len(), 7);
    }

    #[test]
    fn rejects_zero_cap() {
        let mut config = AppConfig::default();
        config.feeds.promo = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("promo"));
    }

    #[test]
    fn rejects_relative_base_url() {
        let config = AppConfig {
            storage_base_url: "/storage".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(SoukError::Config(_))));
    }
}
