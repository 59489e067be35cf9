// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Souk marketplace catalog.
//
// Rows are declared statically here and decoded once at the store boundary;
// nothing downstream inspects loosely typed JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Seller-category tag used by supplier listings.
pub const SELLER_FOURNISSEUR: &str = "fournisseur";

/// Unique identifier for a product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backing-store tables this crate reads from or watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Products,
    ProductImages,
    FreelanceServices,
}

impl Table {
    /// Table name as known to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::ProductImages => "product_images",
            Self::FreelanceServices => "freelance_services",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic change notification. The payload is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    Insert(Table),
    Update(Table),
    Delete(Table),
}

impl ChangeEvent {
    pub fn table(&self) -> Table {
        match self {
            Self::Insert(t) | Self::Update(t) | Self::Delete(t) => *t,
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// One row of `product_images`, embedded in its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A product exactly as the store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Free text; legacy rows carry old French labels.  Null reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    pub in_stock: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_promo: bool,
    #[serde(default)]
    pub seller_category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "product_images", default)]
    pub images: Vec<ProductImage>,
}

impl RawProductRecord {
    /// The reference to display: the first primary image, else the first
    /// image with a URL.
    pub fn image_ref(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .and_then(|img| img.image_url.as_deref())
            .filter(|url| !url.is_empty())
            .or_else(|| self.images.first().and_then(|img| img.image_url.as_deref()))
    }
}

/// Legacy rows hold `null` in some text columns the screens treat as plain
/// strings.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A product annotated with its resolved image.
///
/// When `has_valid_image` is false, `resolved_image_url` is either absent or
/// a diagnostic pass-through that must not be rendered as a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProductRecord {
    #[serde(flatten)]
    pub record: RawProductRecord,
    pub resolved_image_url: Option<String>,
    pub has_valid_image: bool,
}

/// Store-side predicate a product query applies beyond stock status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductFilter {
    All,
    New,
    Promo,
    SellerCategory(String),
    Category(String),
}

/// A read over `products`, always ordered by `created_at` descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub in_stock_only: bool,
    pub filter: ProductFilter,
    /// Store-side row limit, applied after ordering.
    pub limit: Option<usize>,
}

impl ProductQuery {
    /// All in-stock products, newest first.
    pub fn in_stock() -> Self {
        Self {
            in_stock_only: true,
            filter: ProductFilter::All,
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies this query's predicates (ignoring limit).
    pub fn accepts(&self, record: &RawProductRecord) -> bool {
        if self.in_stock_only && !record.in_stock {
            return false;
        }
        match &self.filter {
            ProductFilter::All => true,
            ProductFilter::New => record.is_new,
            ProductFilter::Promo => record.is_promo,
            ProductFilter::SellerCategory(tag) => {
                record.seller_category.as_deref() == Some(tag.as_str())
            }
            ProductFilter::Category(label) => record.category == *label,
        }
    }
}

// ---------------------------------------------------------------------------
// Freelance services
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Fixed,
    Hourly,
    Negotiable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
    Unavailable,
}

/// Public profile of the person offering a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub full_name: Option<String>,
}

/// A row of `freelance_services` with its embedded provider profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreelanceService {
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    pub price: f64,
    pub price_type: PriceType,
    pub experience_level: ExperienceLevel,
    pub availability: Availability,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// A read over `freelance_services`: active rows, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuery {
    pub category: Option<String>,
}

impl ServiceQuery {
    pub fn accepts(&self, service: &FreelanceService) -> bool {
        service.is_active
            && self
                .category
                .as_deref()
                .is_none_or(|cat| service.category == cat)
    }
}
