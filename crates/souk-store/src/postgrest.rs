// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Query source over the hosted Supabase REST (PostgREST) API.
//
// Each query is a single GET with PostgREST's filter syntax in the query
// string, e.g.
//
//   products?select=*,product_images(image_url,is_primary)
//           &in_stock=eq.true&is_new=eq.true&order=created_at.desc&limit=10
//
// Responses are decoded straight into the typed rows from `souk-core`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use souk_core::config::StoreConfig;
use souk_core::error::{Result, SoukError};
use souk_core::types::{
    FreelanceService, ProductFilter, ProductQuery, RawProductRecord, ServiceQuery, Table,
};

use crate::traits::QuerySource;

/// Product columns plus the embedded image rows.
const PRODUCT_SELECT: &str = "*,product_images(image_url,is_primary)";

/// Service columns plus the provider's public profile.
const SERVICE_SELECT: &str = "*,provider:profiles(full_name)";

const NEWEST_FIRST: &str = "created_at.desc";

/// `QuerySource` backed by a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct PostgrestSource {
    client: Client,
    /// REST root, always ending in `/` so table names join beneath it.
    rest_url: Url,
}

impl PostgrestSource {
    /// Build a source for `rest_url` (e.g. `https://<project>.supabase.co/rest/v1`)
    /// authenticating with the project's anonymous key.
    pub fn new(rest_url: &str, anon_key: &str) -> Result<Self> {
        let mut root = rest_url.trim_end_matches('/').to_string();
        root.push('/');
        let rest_url = Url::parse(&root)
            .map_err(|e| SoukError::Config(format!("invalid REST URL {rest_url:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(anon_key)
            .map_err(|e| SoukError::Config(format!("invalid anon key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {anon_key}"))
            .map_err(|e| SoukError::Config(format!("invalid anon key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SoukError::Http(format!("client build: {e}")))?;

        Ok(Self { client, rest_url })
    }

    /// Build a source from configuration, or `None` when no backend is set.
    pub fn from_config(config: &StoreConfig) -> Result<Option<Self>> {
        match (&config.rest_url, &config.anon_key) {
            (Some(url), Some(key)) => Self::new(url, key).map(Some),
            (None, None) => Ok(None),
            _ => Err(SoukError::Config(
                "store.rest_url and store.anon_key must be set together".into(),
            )),
        }
    }

    fn table_url(&self, table: Table) -> Result<Url> {
        self.rest_url
            .join(table.as_str())
            .map_err(|e| SoukError::Config(format!("join {table}: {e}")))
    }

    /// URL for a product query.
    pub fn products_url(&self, query: &ProductQuery) -> Result<Url> {
        let mut url = self.table_url(Table::Products)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", PRODUCT_SELECT);
            if query.in_stock_only {
                pairs.append_pair("in_stock", "eq.true");
            }
            match &query.filter {
                ProductFilter::All => {}
                ProductFilter::New => {
                    pairs.append_pair("is_new", "eq.true");
                }
                ProductFilter::Promo => {
                    pairs.append_pair("is_promo", "eq.true");
                }
                ProductFilter::SellerCategory(tag) => {
                    pairs.append_pair("seller_category", &format!("eq.{tag}"));
                }
                ProductFilter::Category(label) => {
                    pairs.append_pair("category", &format!("eq.{label}"));
                }
            }
            pairs.append_pair("order", NEWEST_FIRST);
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// URL listing the category column of in-stock products.
    pub fn categories_url(&self) -> Result<Url> {
        let mut url = self.table_url(Table::Products)?;
        url.query_pairs_mut()
            .append_pair("select", "category")
            .append_pair("in_stock", "eq.true");
        Ok(url)
    }

    /// URL for a freelance service query.
    pub fn services_url(&self, query: &ServiceQuery) -> Result<Url> {
        let mut url = self.table_url(Table::FreelanceServices)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", SERVICE_SELECT);
            pairs.append_pair("is_active", "eq.true");
            if let Some(category) = &query.category {
                pairs.append_pair("category", &format!("eq.{category}"));
            }
            pairs.append_pair("order", NEWEST_FIRST);
        }
        Ok(url)
    }

    async fn get_rows<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SoukError::Http(format!("GET {}: {e}", url.path())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SoukError::Http(format!("read body of {}: {e}", url.path())))?;

        if !status.is_success() {
            return Err(SoukError::QuerySource(format!(
                "{} returned {status}: {body}",
                url.path()
            )));
        }

        let rows: Vec<T> = serde_json::from_str(&body)
            .map_err(|e| SoukError::Decode(format!("{}: {e}", url.path())))?;
        debug!(path = url.path(), count = rows.len(), "rows decoded");
        Ok(rows)
    }
}

#[derive(Deserialize)]
struct CategoryRow {
    category: Option<String>,
}

#[async_trait]
impl QuerySource for PostgrestSource {
    #[instrument(skip(self))]
    async fn select_products(&self, query: &ProductQuery) -> Result<Vec<RawProductRecord>> {
        let url = self.products_url(query)?;
        self.get_rows(url).await
    }

    #[instrument(skip(self))]
    async fn select_product_categories(&self) -> Result<Vec<String>> {
        let url = self.categories_url()?;
        let rows: Vec<CategoryRow> = self.get_rows(url).await?;
        Ok(rows.into_iter().filter_map(|r| r.category).collect())
    }

    #[instrument(skip(self))]
    async fn select_freelance_services(
        &self,
        query: &ServiceQuery,
    ) -> Result<Vec<FreelanceService>> {
        let url = self.services_url(query)?;
        self.get_rows(url).await
    }
}
