// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Category taxonomy: canonical UI categories and the legacy labels they
// subsume.
//
// Matching is a case-insensitive *substring* test against every alias, so
// inflected or compound legacy labels ("Meubles & Maison", "Téléphones &
// Accessoires") land in the right bucket.  There is no accent folding:
// accented and unaccented spellings must both be listed as aliases.

use std::collections::HashMap;

use souk_core::config::{CategoryAliases, default_categories};

/// A canonical category and its alias list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCategory {
    id: String,
    aliases: Vec<String>,
    /// Lower-cased copies of `aliases`, same order.
    lowered: Vec<String>,
}

impl CanonicalCategory {
    /// The id is always one of its own aliases; it is put first if missing.
    pub fn new(id: impl Into<String>, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let id = id.into();
        let mut aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if !aliases.iter().any(|a| *a == id) {
            aliases.insert(0, id.clone());
        }
        let lowered = aliases.iter().map(|a| a.to_lowercase()).collect();
        Self {
            id,
            aliases,
            lowered,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn contained_in(&self, raw_lower: &str) -> bool {
        self.lowered
            .iter()
            .any(|alias| !alias.is_empty() && raw_lower.contains(alias.as_str()))
    }
}

/// Ordered set of canonical categories.  Alias sets may overlap; where a
/// single answer is needed, the earliest category wins.
#[derive(Debug, Clone)]
pub struct CategoryTaxonomy {
    categories: Vec<CanonicalCategory>,
    by_id: HashMap<String, usize>,
}

impl Default for CategoryTaxonomy {
    fn default() -> Self {
        Self::from_config(&default_categories())
    }
}

impl CategoryTaxonomy {
    pub fn new(categories: impl IntoIterator<Item = CanonicalCategory>) -> Self {
        let categories: Vec<CanonicalCategory> = categories.into_iter().collect();
        let mut by_id = HashMap::with_capacity(categories.len());
        for (idx, cat) in categories.iter().enumerate() {
            by_id.entry(cat.id.clone()).or_insert(idx);
        }
        Self { categories, by_id }
    }

    pub fn from_config(table: &[CategoryAliases]) -> Self {
        Self::new(
            table
                .iter()
                .map(|c| CanonicalCategory::new(c.id.clone(), c.aliases.iter().cloned())),
        )
    }

    pub fn categories(&self) -> &[CanonicalCategory] {
        &self.categories
    }

    pub fn get(&self, canonical_id: &str) -> Option<&CanonicalCategory> {
        self.by_id.get(canonical_id).map(|&idx| &self.categories[idx])
    }

    /// Alias list for `canonical_id`; empty for unknown ids.
    pub fn aliases(&self, canonical_id: &str) -> &[String] {
        self.get(canonical_id).map(|c| c.aliases()).unwrap_or(&[])
    }

    /// Whether a raw store label belongs to `canonical_id`.
    ///
    /// An empty id means "no filter" and matches everything.  An unknown id
    /// only matches labels exactly equal to it.
    pub fn matches(&self, raw_label: &str, canonical_id: &str) -> bool {
        if canonical_id.is_empty() || raw_label == canonical_id {
            return true;
        }
        match self.get(canonical_id) {
            Some(cat) => cat.contained_in(&raw_label.to_lowercase()),
            None => false,
        }
    }

    /// First canonical category, in table order, that `raw_label` belongs to.
    pub fn classify(&self, raw_label: &str) -> Option<&CanonicalCategory> {
        let lower = raw_label.to_lowercase();
        self.categories
            .iter()
            .find(|c| raw_label == c.id || c.contained_in(&lower))
    }

    /// Keep the items whose label matches `canonical_id`, preserving order.
    pub fn filter<T>(
        &self,
        items: Vec<T>,
        canonical_id: &str,
        label: impl Fn(&T) -> &str,
    ) -> Vec<T> {
        if canonical_id.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.matches(label(item), canonical_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let tax = CategoryTaxonomy::default();
        for raw in ["", "Maison", "anything at all", "Électronique"] {
            assert!(tax.matches(raw, ""));
        }
    }

    #[test]
    fn exact_canonical_label_matches() {
        let tax = CategoryTaxonomy::default();
        assert!(tax.matches("Beaute", "Beaute"));
        // Unknown ids still match themselves exactly.
        assert!(tax.matches("Jouets", "Jouets"));
        assert!(!tax.matches("Jouets pour enfants", "Jouets"));
    }

    #[test]
    fn legacy_labels_match_by_substring() {
        let tax = CategoryTaxonomy::default();
        assert!(tax.matches("Meubles & Maison", "Maison"));
        assert!(tax.matches("téléphones & accessoires", "Telephones"));
        assert!(tax.matches("Téléphones & Accessoires", "Accessoires"));
        assert!(tax.matches("Smartphones reconditionnés", "Telephones"));
        assert!(tax.matches("VÊTEMENTS HOMME", "Vetements"));
        assert!(!tax.matches("Meubles & Maison", "Automobiles"));
    }

    #[test]
    fn no_accent_folding() {
        let tax = CategoryTaxonomy::new([CanonicalCategory::new("Electronique", ["Électronique"])]);
        assert!(tax.matches("électronique grand public", "Electronique"));
        // The canonical id is an alias, so this spelling matches through it.
        assert!(tax.matches("electronique", "Electronique"));

        let strict = CategoryTaxonomy::new([CanonicalCategory::new("Élec", ["Électronique"])]);
        assert!(!strict.matches("electronique", "Élec"));
    }

    #[test]
    fn canonical_id_is_always_an_alias() {
        let cat = CanonicalCategory::new("Telephones", ["Téléphones", "Mobile"]);
        assert_eq!(cat.aliases()[0], "Telephones");
        assert_eq!(cat.aliases().len(), 3);

        let cat = CanonicalCategory::new("Maison", ["Home", "Maison"]);
        assert_eq!(cat.aliases(), ["Home", "Maison"]);
    }

    #[test]
    fn unknown_id_has_no_aliases() {
        let tax = CategoryTaxonomy::default();
        assert!(tax.aliases("Jardin").is_empty());
        assert!(!tax.matches("Jardinage", "Jardin"));
    }

    #[test]
    fn classify_prefers_earlier_category_on_overlap() {
        let tax = CategoryTaxonomy::default();
        // Listed under both Telephones and Accessoires.
        let cat = tax.classify("Téléphones & Accessoires").expect("classified");
        assert_eq!(cat.id(), "Telephones");
        assert_eq!(tax.classify("Parfums de luxe").map(|c| c.id()), Some("Beaute"));
        assert!(tax.classify("Jouets").is_none());
    }

    #[test]
    fn substring_matching_can_over_match() {
        // Short aliases like "Auto" and "Car" hit unrelated labels. Kept as-is.
        let tax = CategoryTaxonomy::default();
        assert!(tax.matches("Autocollants", "Automobiles"));
        assert!(tax.matches("Carnet de notes", "Automobiles"));
    }

    #[test]
    fn filter_preserves_order() {
        let tax = CategoryTaxonomy::default();
        let labels = vec!["Meubles", "Voiture", "Maison", "Santé"];
        let kept = tax.filter(labels, "Maison", |l| *l);
        assert_eq!(kept, ["Meubles", "Maison"]);
    }
}
