// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Marketplace screen state and the stale-response guard.
//
// Recompositions are not cancelled when a newer one starts, so an old
// response can land after a fresh one.  Every refresh takes a token from
// `FeedGeneration`; only the most recently issued token may write state.

use std::sync::atomic::{AtomicU64, Ordering};

use souk_core::types::ResolvedProductRecord;
use tracing::{debug, warn};

use crate::services::app_services::InitialLoad;

/// Identifies one refresh request.  Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Monotonic issuer of [`RequestToken`]s.
#[derive(Debug, Default)]
pub struct FeedGeneration {
    latest: AtomicU64,
}

impl FeedGeneration {
    /// Start a new request, superseding every earlier token.
    pub fn begin(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` is still the newest request.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// What the marketplace screen renders.
#[derive(Debug, Default)]
pub struct MarketplaceState {
    generation: FeedGeneration,
    pub new_arrivals: Vec<ResolvedProductRecord>,
    pub supplier: Vec<ResolvedProductRecord>,
    pub categories: Vec<String>,
    /// Token of the load currently displayed.
    pub shown: Option<RequestToken>,
}

impl MarketplaceState {
    pub fn begin_refresh(&self) -> RequestToken {
        self.generation.begin()
    }

    /// Replace the displayed feeds with `load` unless a newer refresh has
    /// been started since `token` was issued.  Returns whether it applied.
    pub fn apply(&mut self, token: RequestToken, load: InitialLoad) -> bool {
        if !self.generation.is_current(token) {
            warn!(?token, "discarding stale feed response");
            return false;
        }
        self.new_arrivals = load.new_arrivals;
        self.supplier = load.supplier;
        self.categories = load.categories;
        self.shown = Some(token);
        debug!(
            ?token,
            new_arrivals = self.new_arrivals.len(),
            supplier = self.supplier.len(),
            categories = self.categories.len(),
            "marketplace state replaced"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(categories: &[&str]) -> InitialLoad {
        InitialLoad {
            new_arrivals: Vec::new(),
            supplier: Vec::new(),
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    #[test]
    fn tokens_increase() {
        let generation = FeedGeneration::default();
        let a = generation.begin();
        let b = generation.begin();
        assert!(b > a);
        assert!(!generation.is_current(a));
        assert!(generation.is_current(b));
    }

    #[test]
    fn late_stale_response_is_discarded() {
        let mut state = MarketplaceState::default();
        let first = state.begin_refresh();
        let second = state.begin_refresh();

        assert!(state.apply(second, load(&["Maison"])));
        assert!(!state.apply(first, load(&["Ancien"])));
        assert_eq!(state.categories, ["Maison"]);
        assert_eq!(state.shown, Some(second));
    }

    #[test]
    fn early_stale_response_is_also_discarded() {
        let mut state = MarketplaceState::default();
        let first = state.begin_refresh();
        let _second = state.begin_refresh();
        assert!(!state.apply(first, load(&["Ancien"])));
        assert!(state.categories.is_empty());
        assert_eq!(state.shown, None);
    }
}
