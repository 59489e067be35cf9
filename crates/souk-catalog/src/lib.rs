// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Souk Catalog: the logic between raw store rows and what the screens show:
// category taxonomy matching, image URL resolution, feed composition with
// fallback and caps, freelance listings, and realtime change notification.
// Everything here except the notifier is stateless per call.

pub mod feed;
pub mod freelance;
pub mod image;
pub mod notifier;
pub mod pricing;
pub mod taxonomy;

pub use feed::{FeedComposer, FeedSpec};
pub use freelance::{FreelanceListing, TestRecordFilter};
pub use image::{ImageResolver, ResolvedImage};
pub use notifier::{ChangeNotifier, SubscriptionHandle, SubscriptionState};
pub use pricing::discount_percent;
pub use taxonomy::{CanonicalCategory, CategoryTaxonomy};
