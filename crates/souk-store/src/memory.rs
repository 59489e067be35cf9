// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process store for desktop/CI builds and tests.
//
// Holds the `products` and `freelance_services` tables in memory, answers
// queries with the same ordering rules as the hosted backend, and broadcasts
// a change event on every mutation.  A failure switch turns every query into
// a `QuerySource` error so degraded paths can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use souk_core::error::{Result, SoukError};
use souk_core::types::{
    ChangeEvent, FreelanceService, ProductId, ProductQuery, RawProductRecord, ServiceQuery, Table,
};

use crate::traits::{ChangeReceiver, QuerySource, SubscriptionSource};

/// Buffered events per table before slow subscribers start lagging.
const CHANGE_BUFFER: usize = 64;

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub products: Vec<RawProductRecord>,
    pub freelance_services: Vec<FreelanceService>,
}

/// Table store kept entirely in memory.
pub struct MemoryStore {
    tables: RwLock<Snapshot>,
    /// One broadcast sender per watched table.
    changes: HashMap<Table, broadcast::Sender<ChangeEvent>>,
    /// Open channels keyed by name.
    channels: Mutex<HashMap<String, Table>>,
    failing: AtomicBool,
    product_queries: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let changes = [Table::Products, Table::ProductImages, Table::FreelanceServices]
            .into_iter()
            .map(|t| (t, broadcast::channel(CHANGE_BUFFER).0))
            .collect();
        Self {
            tables: RwLock::new(snapshot),
            changes,
            channels: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            product_queries: AtomicUsize::new(0),
        }
    }

    /// Seed a store from a JSON snapshot (`{"products": [...], ...}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        info!(
            products = snapshot.products.len(),
            services = snapshot.freelance_services.len(),
            "memory store seeded from snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Make every subsequent query fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `select_products` calls served so far.
    pub fn product_queries(&self) -> usize {
        self.product_queries.load(Ordering::SeqCst)
    }

    /// Names of channels currently open.
    pub fn open_channels(&self) -> Vec<String> {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = channels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn insert_product(&self, product: RawProductRecord) {
        self.write().products.push(product);
        self.notify(ChangeEvent::Insert(Table::Products));
    }

    /// Apply `edit` to the product with `id`.  Returns false if absent.
    pub fn update_product(&self, id: ProductId, edit: impl FnOnce(&mut RawProductRecord)) -> bool {
        let updated = {
            let mut tables = self.write();
            match tables.products.iter_mut().find(|p| p.id == id) {
                Some(product) => {
                    edit(product);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.notify(ChangeEvent::Update(Table::Products));
        }
        updated
    }

    pub fn delete_product(&self, id: ProductId) -> bool {
        let removed = {
            let mut tables = self.write();
            let before = tables.products.len();
            tables.products.retain(|p| p.id != id);
            tables.products.len() != before
        };
        if removed {
            self.notify(ChangeEvent::Delete(Table::Products));
        }
        removed
    }

    pub fn insert_service(&self, service: FreelanceService) {
        self.write().freelance_services.push(service);
        self.notify(ChangeEvent::Insert(Table::FreelanceServices));
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: ChangeEvent) {
        if let Some(tx) = self.changes.get(&event.table()) {
            // No receivers is fine: nobody is watching.
            let receivers = tx.send(event).unwrap_or(0);
            debug!(?event, receivers, "change broadcast");
        }
    }

    fn check_failing(&self, what: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SoukError::QuerySource(format!("{what}: store unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl QuerySource for MemoryStore {
    #[instrument(skip(self))]
    async fn select_products(&self, query: &ProductQuery) -> Result<Vec<RawProductRecord>> {
        self.product_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failing("select products")?;

        let mut rows: Vec<RawProductRecord> = self
            .read()
            .products
            .iter()
            .filter(|p| query.accepts(p))
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        debug!(count = rows.len(), "products selected");
        Ok(rows)
    }

    async fn select_product_categories(&self) -> Result<Vec<String>> {
        self.check_failing("select categories")?;
        Ok(self
            .read()
            .products
            .iter()
            .filter(|p| p.in_stock)
            .map(|p| p.category.clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn select_freelance_services(
        &self,
        query: &ServiceQuery,
    ) -> Result<Vec<FreelanceService>> {
        self.check_failing("select freelance services")?;

        let mut rows: Vec<FreelanceService> = self
            .read()
            .freelance_services
            .iter()
            .filter(|s| query.accepts(s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

impl SubscriptionSource for MemoryStore {
    fn open_channel(&self, channel: &str, table: Table) -> Result<ChangeReceiver> {
        let tx = self
            .changes
            .get(&table)
            .ok_or_else(|| SoukError::Subscription(format!("table {table} is not watchable")))?;

        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if channels.contains_key(channel) {
            return Err(SoukError::Subscription(format!("channel {channel} already open")));
        }
        channels.insert(channel.to_string(), table);
        info!(channel, %table, "channel opened");
        Ok(tx.subscribe())
    }

    /// Frees the channel name only.  Receivers already handed out keep
    /// receiving until their owner drops them.
    fn close_channel(&self, channel: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if channels.remove(channel).is_some() {
            info!(channel, "channel closed");
        }
    }
}
