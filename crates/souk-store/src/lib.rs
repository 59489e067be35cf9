// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Souk Store: the seam between catalog logic and the hosted backend.
//
// `traits` defines what the catalog needs from a store.  `postgrest` talks to
// the hosted Supabase REST API; `memory` is an in-process store used for
// desktop/CI builds and tests, and the only one that emits change events
// without a realtime socket.

pub mod memory;
pub mod postgrest;
pub mod traits;

pub use memory::MemoryStore;
pub use postgrest::PostgrestSource;
pub use traits::{ChangeReceiver, QuerySource, SubscriptionSource};
