// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store-agnostic trait definitions.
//
// The catalog only ever reads.  Implementations return rows already decoded
// into the typed schema from `souk-core`; shape errors surface here as
// `SoukError::Decode` and never reach the feed logic.

use async_trait::async_trait;
use souk_core::error::Result;
use souk_core::types::{
    ChangeEvent, FreelanceService, ProductQuery, RawProductRecord, ServiceQuery, Table,
};
use tokio::sync::broadcast;

/// Receiving end of a realtime channel.
pub type ChangeReceiver = broadcast::Receiver<ChangeEvent>;

/// Filterable, sortable reads over the marketplace tables.
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Products matching `query`, newest first, each with its embedded
    /// `product_images` rows.
    async fn select_products(&self, query: &ProductQuery) -> Result<Vec<RawProductRecord>>;

    /// The raw `category` column of every in-stock product, in store order.
    /// Duplicates and empty labels are left for the caller to collapse.
    async fn select_product_categories(&self) -> Result<Vec<String>>;

    /// Active freelance services matching `query`, newest first.
    async fn select_freelance_services(&self, query: &ServiceQuery)
    -> Result<Vec<FreelanceService>>;
}

/// Channel-based change notification scoped to a table.
pub trait SubscriptionSource: Send + Sync {
    /// Open a named channel delivering insert/update/delete events for
    /// `table`.  Channel names are unique per source.
    fn open_channel(&self, channel: &str, table: Table) -> Result<ChangeReceiver>;

    /// Release a channel.  Closing an unknown channel is a no-op.  This need
    /// not stop delivery to an outstanding receiver; the subscriber ends its
    /// own receive loop.
    fn close_channel(&self, channel: &str);
}
