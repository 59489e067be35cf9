// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feed composition.
//
// A feed is a primary store query, an optional fallback query, a cap, and a
// policy on whether image-less records may appear.  Composition is:
//
//   1. run the primary query (newest first)
//   2. resolve images; drop invalid ones if the feed requires a photo
//   3. if nothing survived and there is a fallback, run it and repeat 2
//   4. truncate to the cap, keeping source order
//
// Store faults never escape: they are logged and the feed comes back empty.
// An empty feed is a normal outcome the screens already know how to show.

use std::sync::Arc;

use souk_core::config::FeedCaps;
use souk_core::types::{
    ProductFilter, ProductQuery, RawProductRecord, ResolvedProductRecord, SELLER_FOURNISSEUR,
};
use souk_store::QuerySource;
use tracing::{debug, error, instrument, warn};

use crate::image::ImageResolver;

/// Realtime channel every product feed refreshes from.
pub const PRODUCTS_CHANNEL: &str = "products-channel";

/// Definition of a named feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub primary: ProductQuery,
    /// Consulted only when the primary yields nothing after filtering.
    pub fallback: Option<ProductQuery>,
    pub cap: usize,
    /// Drop records whose image did not resolve to a valid URL.
    pub require_image: bool,
    /// Channel whose change events make this feed stale.
    pub channel: String,
}

impl FeedSpec {
    fn products(name: &str, primary: ProductQuery, cap: usize) -> Self {
        Self {
            name: name.into(),
            primary,
            fallback: None,
            cap,
            require_image: true,
            channel: PRODUCTS_CHANNEL.into(),
        }
    }

    pub fn with_fallback(mut self, fallback: ProductQuery) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn allow_missing_images(mut self) -> Self {
        self.require_image = false;
        self
    }

    /// Products flagged new; falls back to everything in stock.
    pub fn new_arrivals(cap: usize) -> Self {
        Self::products(
            "new_arrivals",
            ProductQuery::in_stock().with_filter(ProductFilter::New),
            cap,
        )
        .with_fallback(ProductQuery::in_stock())
    }

    /// Products posted by suppliers; falls back to everything in stock.
    pub fn supplier(cap: usize) -> Self {
        Self::products(
            "supplier",
            ProductQuery::in_stock()
                .with_filter(ProductFilter::SellerCategory(SELLER_FOURNISSEUR.into())),
            cap,
        )
        .with_fallback(ProductQuery::in_stock())
    }

    /// Products on promotion.  Limited store-side; photos optional.
    pub fn promo(cap: usize) -> Self {
        Self::products(
            "promo",
            ProductQuery::in_stock()
                .with_filter(ProductFilter::Promo)
                .with_limit(cap),
            cap,
        )
        .allow_missing_images()
    }

    /// The full marketplace listing.
    pub fn all_products(cap: usize) -> Self {
        Self::products("all_products", ProductQuery::in_stock(), cap)
    }

    /// Products whose stored category equals `label` exactly.
    pub fn by_category(label: &str, cap: usize) -> Self {
        Self::products(
            &format!("category:{label}"),
            ProductQuery::in_stock()
                .with_filter(ProductFilter::Category(label.into()))
                .with_limit(cap),
            cap,
        )
        .allow_missing_images()
    }

    /// Built-in feeds with their configured caps.
    pub fn defaults(caps: &FeedCaps) -> Vec<Self> {
        vec![
            Self::new_arrivals(caps.new_arrivals),
            Self::supplier(caps.supplier),
            Self::promo(caps.promo),
            Self::all_products(caps.all_products),
        ]
    }
}

/// Assembles feeds from a query source.  Holds no per-call state, so the
/// same composer can serve concurrent compositions.
#[derive(Clone)]
pub struct FeedComposer {
    source: Arc<dyn QuerySource>,
    images: ImageResolver,
}

impl FeedComposer {
    pub fn new(source: Arc<dyn QuerySource>, images: ImageResolver) -> Self {
        Self { source, images }
    }

    pub fn images(&self) -> &ImageResolver {
        &self.images
    }

    /// Compose `spec`.  Never fails; faults degrade to an empty feed.
    #[instrument(skip(self, spec), fields(feed = %spec.name, cap = spec.cap))]
    pub async fn compose(&self, spec: &FeedSpec) -> Vec<ResolvedProductRecord> {
        let Some(rows) = self.run(spec, &spec.primary, "primary").await else {
            return Vec::new();
        };
        let mut kept = self.retain(spec, rows);

        if kept.is_empty()
            && let Some(fallback) = &spec.fallback
        {
            warn!(feed = %spec.name, "primary query empty after filtering, using fallback");
            kept = match self.run(spec, fallback, "fallback").await {
                Some(rows) => self.retain(spec, rows),
                None => Vec::new(),
            };
        }

        kept.truncate(spec.cap);
        debug!(feed = %spec.name, count = kept.len(), "feed composed");
        kept
    }

    /// Distinct non-empty categories of in-stock products, first seen first.
    #[instrument(skip(self))]
    pub async fn category_names(&self) -> Vec<String> {
        match self.source.select_product_categories().await {
            Ok(labels) => distinct_labels(labels),
            Err(e) => {
                error!(error = %e, "category query failed, returning none");
                Vec::new()
            }
        }
    }

    async fn run(
        &self,
        spec: &FeedSpec,
        query: &ProductQuery,
        which: &'static str,
    ) -> Option<Vec<RawProductRecord>> {
        match self.source.select_products(query).await {
            Ok(rows) => {
                debug!(feed = %spec.name, source = which, rows = rows.len(), "query returned");
                Some(rows)
            }
            Err(e) => {
                error!(feed = %spec.name, source = which, error = %e, "feed query failed, returning empty feed");
                None
            }
        }
    }

    fn retain(&self, spec: &FeedSpec, rows: Vec<RawProductRecord>) -> Vec<ResolvedProductRecord> {
        rows.into_iter()
            .map(|row| self.images.resolve_record(row))
            .filter(|r| !spec.require_image || r.has_valid_image)
            .collect()
    }
}

/// Collapse labels to distinct non-empty values, keeping first-seen order.
pub(crate) fn distinct_labels(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use souk_core::types::{ProductId, ProductImage};
    use souk_store::MemoryStore;

    fn product(name: &str, minutes: i64, image: Option<&str>) -> RawProductRecord {
        RawProductRecord {
            id: ProductId::new(),
            name: name.into(),
            description: None,
            brand: None,
            category: "Maison".into(),
            price: 2500.0,
            original_price: None,
            in_stock: true,
            is_new: false,
            is_promo: false,
            seller_category: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            images: image
                .map(|url| {
                    vec![ProductImage {
                        image_url: Some(url.into()),
                        is_primary: true,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn composer(store: &Arc<MemoryStore>) -> FeedComposer {
        FeedComposer::new(
            Arc::clone(store) as Arc<dyn QuerySource>,
            ImageResolver::new("https://store/base", ["/winter/", "/perfums/"]),
        )
    }

    fn names(feed: &[ResolvedProductRecord]) -> Vec<&str> {
        feed.iter().map(|r| r.record.name.as_str()).collect()
    }

    /// 15 in-stock products, none new; every fifth has a broken image.
    fn fallback_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..15 {
            let image = if i % 5 == 0 {
                format!("/winter/{i}.png")
            } else {
                format!("/shoes/{i}.png")
            };
            store.insert_product(product(&format!("p{i}"), i, Some(&image)));
        }
        store
    }

    #[tokio::test]
    async fn fallback_scenario_returns_first_ten_valid_newest_first() {
        let store = fallback_store();
        let feed = composer(&store).compose(&FeedSpec::new_arrivals(10)).await;

        // Valid: every i not divisible by 5, i.e. 12 records; newest first.
        assert_eq!(
            names(&feed),
            ["p14", "p13", "p12", "p11", "p9", "p8", "p7", "p6", "p4", "p3"]
        );
        assert!(feed.iter().all(|r| r.has_valid_image));
        assert_eq!(store.product_queries(), 2);
    }

    #[tokio::test]
    async fn fallback_not_consulted_when_primary_has_results() {
        let store = fallback_store();
        let mut fresh = product("fresh", 100, Some("/shoes/fresh.png"));
        fresh.is_new = true;
        store.insert_product(fresh);

        let feed = composer(&store).compose(&FeedSpec::new_arrivals(10)).await;
        assert_eq!(names(&feed), ["fresh"]);
        assert_eq!(store.product_queries(), 1);
    }

    #[tokio::test]
    async fn primary_with_only_broken_images_triggers_fallback() {
        let store = Arc::new(MemoryStore::new());
        let mut broken = product("broken-new", 10, Some("/perfums/a.png"));
        broken.is_new = true;
        store.insert_product(broken);
        store.insert_product(product("older", 1, Some("https://cdn/x.png")));

        let feed = composer(&store).compose(&FeedSpec::new_arrivals(10)).await;
        assert_eq!(names(&feed), ["older"]);
    }

    #[tokio::test]
    async fn cap_truncates_in_source_order() {
        let store = fallback_store();
        let feed = composer(&store).compose(&FeedSpec::all_products(3)).await;
        assert_eq!(names(&feed), ["p14", "p13", "p12"]);
    }

    #[tokio::test]
    async fn listing_feeds_keep_image_less_records() {
        let store = Arc::new(MemoryStore::new());
        let mut a = product("no-photo", 2, None);
        a.is_promo = true;
        let mut b = product("broken", 1, Some("/winter/b.png"));
        b.is_promo = true;
        store.insert_product(a);
        store.insert_product(b);

        let feed = composer(&store).compose(&FeedSpec::promo(10)).await;
        assert_eq!(names(&feed), ["no-photo", "broken"]);
        assert!(feed.iter().all(|r| !r.has_valid_image));
        assert_eq!(
            feed[1].resolved_image_url.as_deref(),
            Some("https://store/base/winter/b.png")
        );
    }

    #[tokio::test]
    async fn store_fault_degrades_to_empty_feed() {
        let store = fallback_store();
        store.set_failing(true);
        let composer = composer(&store);
        assert!(composer.compose(&FeedSpec::new_arrivals(10)).await.is_empty());
        assert!(composer.category_names().await.is_empty());
        // The fallback is for "no data", not for outages.
        assert_eq!(store.product_queries(), 1);
    }

    #[tokio::test]
    async fn compose_is_idempotent() {
        let store = fallback_store();
        let composer = composer(&store);
        let spec = FeedSpec::supplier(5);
        let first = composer.compose(&spec).await;
        let second = composer.compose(&spec).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[tokio::test]
    async fn empty_store_gives_empty_feed() {
        let store = Arc::new(MemoryStore::new());
        assert!(composer(&store).compose(&FeedSpec::supplier(20)).await.is_empty());
    }

    #[tokio::test]
    async fn category_names_are_distinct_and_non_empty() {
        let store = Arc::new(MemoryStore::new());
        for (i, cat) in ["Meubles", "", "Voiture", "Meubles"].iter().enumerate() {
            let mut p = product(&format!("p{i}"), i as i64, None);
            p.category = (*cat).into();
            store.insert_product(p);
        }
        assert_eq!(composer(&store).category_names().await, ["Meubles", "Voiture"]);
    }

    #[test]
    fn default_feeds_use_configured_caps() {
        let caps = FeedCaps {
            new_arrivals: 3,
            ..FeedCaps::default()
        };
        let feeds = FeedSpec::defaults(&caps);
        assert_eq!(feeds[0].name, "new_arrivals");
        assert_eq!(feeds[0].cap, 3);
        assert!(feeds[0].fallback.is_some());
        assert!(!feeds[2].require_image);
        assert_eq!(feeds[2].primary.limit, Some(caps.promo));
        assert!(feeds.iter().all(|f| f.channel == PRODUCTS_CHANNEL));
    }
}
