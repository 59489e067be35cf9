// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer.  Picks a store, builds the catalog components on
// top of it, and exposes one async method per screen query.
//
// With `store.rest_url`/`store.anon_key` configured the hosted backend is
// queried over REST and no change notifications are available.  Otherwise an
// in-memory store is used, seeded from `snapshot.json` in the data directory
// when present, and it drives the change notifier.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use souk_catalog::feed::PRODUCTS_CHANNEL;
use souk_catalog::{
    ChangeNotifier, CategoryTaxonomy, FeedComposer, FeedSpec, FreelanceListing, ImageResolver,
    SubscriptionHandle, TestRecordFilter,
};
use souk_core::AppConfig;
use souk_core::error::Result;
use souk_core::types::{FreelanceService, ResolvedProductRecord, Table};
use souk_store::{MemoryStore, PostgrestSource, QuerySource, SubscriptionSource};
use tokio::sync::Notify;
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Everything the marketplace screen needs on first paint.
#[derive(Debug, Default)]
pub struct InitialLoad {
    pub new_arrivals: Vec<ResolvedProductRecord>,
    pub supplier: Vec<ResolvedProductRecord>,
    pub categories: Vec<String>,
}

/// Shared application services.
///
/// All fields are Arc-backed so the struct can be cloned into tasks.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<Mutex<AppConfig>>,
    data_dir: PathBuf,
    taxonomy: Arc<CategoryTaxonomy>,
    composer: FeedComposer,
    freelance: FreelanceListing,
    notifier: Option<ChangeNotifier>,
}

#[allow(dead_code)]
impl AppServices {
    /// Initialise all services.  Call once at startup.
    pub fn init() -> Result<Self> {
        let dir = data_dir::data_dir()?;
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(&dir).unwrap_or_default();

        match PostgrestSource::from_config(&config.store)? {
            Some(rest) => {
                info!("using hosted REST store; change notifications unavailable");
                Self::with_stores(config, dir, Arc::new(rest), None)
            }
            None => {
                let store = Arc::new(load_snapshot(&dir)?);
                let subscriptions: Arc<dyn SubscriptionSource> = store.clone();
                Self::with_stores(config, dir, store, Some(subscriptions))
            }
        }
    }

    /// Assemble services over explicit stores.
    pub fn with_stores(
        config: AppConfig,
        data_dir: PathBuf,
        query: Arc<dyn QuerySource>,
        subscriptions: Option<Arc<dyn SubscriptionSource>>,
    ) -> Result<Self> {
        config.validate()?;

        let taxonomy = CategoryTaxonomy::from_config(&config.categories);
        let composer = FeedComposer::new(Arc::clone(&query), ImageResolver::from_config(&config));
        let freelance = FreelanceListing::new(query, TestRecordFilter::new(&config.test_records));

        info!(
            categories = taxonomy.categories().len(),
            realtime = subscriptions.is_some(),
            "app services initialised"
        );

        Ok(Self {
            config: Arc::new(Mutex::new(config)),
            data_dir,
            taxonomy: Arc::new(taxonomy),
            composer,
            freelance,
            notifier: subscriptions.map(ChangeNotifier::new),
        })
    }

    // -- Products ------------------------------------------------------------

    pub async fn new_arrivals(&self) -> Vec<ResolvedProductRecord> {
        let cap = self.config().feeds.new_arrivals;
        self.composer.compose(&FeedSpec::new_arrivals(cap)).await
    }

    pub async fn supplier_products(&self) -> Vec<ResolvedProductRecord> {
        let cap = self.config().feeds.supplier;
        self.composer.compose(&FeedSpec::supplier(cap)).await
    }

    pub async fn promo_products(&self) -> Vec<ResolvedProductRecord> {
        let cap = self.config().feeds.promo;
        self.composer.compose(&FeedSpec::promo(cap)).await
    }

    /// The marketplace listing, optionally narrowed to a canonical category.
    /// The category is applied client-side after the cap; an empty id keeps
    /// everything.
    pub async fn all_products(&self, canonical_id: &str) -> Vec<ResolvedProductRecord> {
        let cap = self.config().feeds.all_products;
        let feed = self.composer.compose(&FeedSpec::all_products(cap)).await;
        self.taxonomy
            .filter(feed, canonical_id, |r| r.record.category.as_str())
    }

    /// Products whose stored category is exactly `label`.
    pub async fn products_in_category(&self, label: &str) -> Vec<ResolvedProductRecord> {
        let cap = self.config().feeds.by_category;
        self.composer.compose(&FeedSpec::by_category(label, cap)).await
    }

    pub async fn category_names(&self) -> Vec<String> {
        self.composer.category_names().await
    }

    /// Fetch the three first-paint queries concurrently.
    pub async fn initial_load(&self) -> InitialLoad {
        let (new_arrivals, supplier, categories) = tokio::join!(
            self.new_arrivals(),
            self.supplier_products(),
            self.category_names(),
        );
        InitialLoad {
            new_arrivals,
            supplier,
            categories,
        }
    }

    pub fn taxonomy(&self) -> &CategoryTaxonomy {
        &self.taxonomy
    }

    // -- Freelance -----------------------------------------------------------

    pub async fn freelance_services(&self, category: Option<&str>) -> Vec<FreelanceService> {
        self.freelance.services(category).await
    }

    pub async fn service_categories(&self) -> Vec<String> {
        self.freelance.service_categories().await
    }

    // -- Realtime ------------------------------------------------------------

    /// Watch the products table.  The returned `Notify` is signalled on every
    /// change; `None` when the store has no change feed.
    pub fn watch_products(&self) -> Result<Option<(SubscriptionHandle, Arc<Notify>)>> {
        let Some(notifier) = &self.notifier else {
            return Ok(None);
        };
        let notify = Arc::new(Notify::new());
        let signal = Arc::clone(&notify);
        let handle = notifier.subscribe(PRODUCTS_CHANNEL, Table::Products, move || {
            signal.notify_one();
        })?;
        Ok(Some((handle, notify)))
    }

    // -- Config --------------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate, store, and persist `config`.  Feed caps apply to the next
    /// composition; the category table, image settings and store selection
    /// apply on the next `init`.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        persist_config(&self.data_dir, config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

fn load_snapshot(data_dir: &Path) -> Result<MemoryStore> {
    let path = data_dir.join(SNAPSHOT_FILE);
    if !path.exists() {
        info!("no snapshot found; starting with an empty in-memory store");
        return Ok(MemoryStore::new());
    }
    MemoryStore::from_json(&std::fs::read_to_string(&path)?)
}
