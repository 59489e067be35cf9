// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Freelance service listings.
//
// Production still carries rows seeded while the screen was being built.
// They are hidden client-side by configurable rules rather than deleted.

use std::sync::Arc;

use souk_core::config::TestRecordRule;
use souk_core::types::{FreelanceService, ServiceQuery};
use souk_store::QuerySource;
use tracing::{debug, error, instrument};

use crate::feed::distinct_labels;

/// Lower-cased rule fragments.
#[derive(Debug, Clone, Default)]
pub struct TestRecordFilter {
    rules: Vec<(String, String)>,
}

impl TestRecordFilter {
    /// Rules with an empty fragment are dropped; they would hide too much.
    pub fn new(rules: &[TestRecordRule]) -> Self {
        Self {
            rules: rules
                .iter()
                .filter(|r| !r.title_contains.is_empty() && !r.provider_contains.is_empty())
                .map(|r| (r.title_contains.to_lowercase(), r.provider_contains.to_lowercase()))
                .collect(),
        }
    }

    /// A service is a test record when some rule matches both its title and
    /// its provider's name.  Services without a provider name never are.
    pub fn is_test_record(&self, service: &FreelanceService) -> bool {
        let Some(provider) = service.provider.as_ref().and_then(|p| p.full_name.as_deref()) else {
            return false;
        };
        let title = service.service_title.to_lowercase();
        let provider = provider.to_lowercase();
        self.rules
            .iter()
            .any(|(t, p)| title.contains(t.as_str()) && provider.contains(p.as_str()))
    }

    pub fn apply(&self, services: Vec<FreelanceService>) -> Vec<FreelanceService> {
        services.into_iter().filter(|s| !self.is_test_record(s)).collect()
    }
}

/// Reads freelance services with test data removed.
#[derive(Clone)]
pub struct FreelanceListing {
    source: Arc<dyn QuerySource>,
    filter: TestRecordFilter,
}

impl FreelanceListing {
    pub fn new(source: Arc<dyn QuerySource>, filter: TestRecordFilter) -> Self {
        Self { source, filter }
    }

    /// Active services, newest first, optionally for one category.
    /// Faults degrade to an empty list.
    #[instrument(skip(self))]
    pub async fn services(&self, category: Option<&str>) -> Vec<FreelanceService> {
        let query = ServiceQuery {
            category: category.map(str::to_string),
        };
        match self.source.select_freelance_services(&query).await {
            Ok(rows) => {
                let total = rows.len();
                let kept = self.filter.apply(rows);
                debug!(total, kept = kept.len(), "freelance services loaded");
                kept
            }
            Err(e) => {
                error!(error = %e, "freelance query failed");
                Vec::new()
            }
        }
    }

    /// Distinct categories of active services, first seen first.
    pub async fn service_categories(&self) -> Vec<String> {
        let services = self.services(None).await;
        distinct_labels(services.into_iter().map(|s| s.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use souk_core::types::{Availability, ExperienceLevel, PriceType, Provider};
    use souk_store::MemoryStore;

    fn service(title: &str, provider: Option<&str>, category: &str, minutes: i64) -> FreelanceService {
        FreelanceService {
            id: uuid::Uuid::new_v4(),
            service_title: title.into(),
            description: None,
            category: category.into(),
            price: 5000.0,
            price_type: PriceType::Fixed,
            experience_level: ExperienceLevel::Intermediate,
            availability: Availability::Available,
            skills: vec!["figma".into()],
            provider: provider.map(|name| Provider {
                full_name: Some(name.into()),
            }),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    fn legacy_rule() -> Vec<TestRecordRule> {
        vec![TestRecordRule {
            title_contains: "sdfgs".into(),
            provider_contains: "tayeb".into(),
        }]
    }

    #[test]
    fn hides_only_when_title_and_provider_both_match() {
        let filter = TestRecordFilter::new(&legacy_rule());
        assert!(filter.is_test_record(&service("SDFGS test", Some("Tayeb B."), "Design", 0)));
        assert!(!filter.is_test_record(&service("SDFGS test", Some("Amina"), "Design", 0)));
        assert!(!filter.is_test_record(&service("Logo design", Some("Tayeb B."), "Design", 0)));
        assert!(!filter.is_test_record(&service("sdfgs", None, "Design", 0)));
    }

    #[test]
    fn empty_fragments_are_ignored() {
        let filter = TestRecordFilter::new(&[TestRecordRule {
            title_contains: String::new(),
            provider_contains: "a".into(),
        }]);
        assert!(!filter.is_test_record(&service("Logo", Some("Amina"), "Design", 0)));
    }

    #[tokio::test]
    async fn listing_filters_and_orders() {
        let store = Arc::new(MemoryStore::new());
        store.insert_service(service("Logo design", Some("Amina"), "Design", 1));
        store.insert_service(service("sdfgs", Some("tayeb"), "Design", 3));
        store.insert_service(service("Site vitrine", Some("Karim"), "Développement", 2));
        let mut inactive = service("Old offer", Some("Karim"), "Design", 4);
        inactive.is_active = false;
        store.insert_service(inactive);

        let listing = FreelanceListing::new(store.clone(), TestRecordFilter::new(&legacy_rule()));

        let all: Vec<_> = listing
            .services(None)
            .await
            .into_iter()
            .map(|s| s.service_title)
            .collect();
        assert_eq!(all, ["Site vitrine", "Logo design"]);

        let design = listing.services(Some("Design")).await;
        assert_eq!(design.len(), 1);

        assert_eq!(listing.service_categories().await, ["Développement", "Design"]);
    }

    #[tokio::test]
    async fn fault_degrades_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.insert_service(service("Logo design", Some("Amina"), "Design", 1));
        store.set_failing(true);
        let listing = FreelanceListing::new(store, TestRecordFilter::default());
        assert!(listing.services(None).await.is_empty());
        assert!(listing.service_categories().await.is_empty());
    }
}
