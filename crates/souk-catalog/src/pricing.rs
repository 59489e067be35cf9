// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Promo badge arithmetic.

use souk_core::types::RawProductRecord;

/// Whole-percent reduction from `original_price` to `price`.
///
/// `None` when there is no meaningful reduction: the original is absent, not
/// positive, or not above the current price.
pub fn discount_percent(price: f64, original_price: Option<f64>) -> Option<u8> {
    let original = original_price?;
    if !(original > 0.0) || !(original > price) {
        return None;
    }
    let pct = ((original - price) / original * 100.0).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// Discount badge value for a store row.
pub fn record_discount(record: &RawProductRecord) -> Option<u8> {
    discount_percent(record.price, record.original_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_whole_percent() {
        assert_eq!(discount_percent(8000.0, Some(10000.0)), Some(20));
        assert_eq!(discount_percent(9500.0, Some(12000.0)), Some(21));
        assert_eq!(discount_percent(3400.0, Some(4500.0)), Some(24));
    }

    #[test]
    fn no_badge_without_real_reduction() {
        assert_eq!(discount_percent(8000.0, None), None);
        assert_eq!(discount_percent(8000.0, Some(8000.0)), None);
        assert_eq!(discount_percent(9000.0, Some(8000.0)), None);
        assert_eq!(discount_percent(0.0, Some(0.0)), None);
        assert_eq!(discount_percent(10.0, Some(f64::NAN)), None);
    }

    #[test]
    fn free_item_is_full_discount() {
        assert_eq!(discount_percent(0.0, Some(500.0)), Some(100));
    }
}
