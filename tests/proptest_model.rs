//! Property-based tests for delivery ordering.
//!
//! Deliveries must form a strict total order so that "the former delivery"
//! is always well defined, whatever mix of version labels and free-form
//! names a project uses.

use delivery_docs::model::{compare_ids, Delivery, DeliveryRegistry};
use proptest::prelude::*;
use std::cmp::Ordering;

/// Version labels like `1`, `v2.10`, `3.0.1-rc1`, plus free-form names
fn delivery_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "v?(0|[1-9][0-9]{0,2})(\\.(0|[1-9][0-9]{0,2})){0,2}",
        "(0|[1-9][0-9]{0,1})\\.(0|[1-9])\\.(0|[1-9])-(alpha|beta|rc)(\\.[1-9])?",
        "[a-z]{1,6}(-[a-z0-9]{1,4})?",
        "0[0-9]{1,2}(\\.[0-9]{1,2})?",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn ordering_is_antisymmetric(a in delivery_id(), b in delivery_id()) {
        prop_assert_eq!(compare_ids(&a, &b), compare_ids(&b, &a).reverse());
    }

    #[test]
    fn only_identical_ids_compare_equal(a in delivery_id(), b in delivery_id()) {
        prop_assert_eq!(compare_ids(&a, &b) == Ordering::Equal, a == b);
    }

    #[test]
    fn ordering_is_transitive(a in delivery_id(), b in delivery_id(), c in delivery_id()) {
        let mut ids = [a, b, c];
        ids.sort_by(|x, y| compare_ids(x, y));
        prop_assert_ne!(compare_ids(&ids[0], &ids[1]), Ordering::Greater);
        prop_assert_ne!(compare_ids(&ids[1], &ids[2]), Ordering::Greater);
        prop_assert_ne!(compare_ids(&ids[0], &ids[2]), Ordering::Greater);
    }

    #[test]
    fn numeric_components_compare_as_numbers(major in 0u64..50, x in 0u64..200, y in 0u64..200) {
        let a = format!("{major}.{x}");
        let b = format!("{major}.{y}");
        prop_assert_eq!(compare_ids(&a, &b), x.cmp(&y).then_with(|| a.cmp(&b)));
    }

    #[test]
    fn registry_lists_in_order_and_links_former(ids in prop::collection::vec(delivery_id(), 1..20)) {
        let mut registry = DeliveryRegistry::new();
        for id in &ids {
            registry.add(Delivery::new(id.as_str()));
        }

        let listed: Vec<&str> = registry.iter().map(Delivery::id).collect();
        for pair in listed.windows(2) {
            prop_assert_eq!(compare_ids(pair[0], pair[1]), Ordering::Less);
        }

        prop_assert_eq!(registry.former(listed[0]), None);
        for pair in listed.windows(2) {
            prop_assert_eq!(registry.former(pair[1]).map(Delivery::id), Some(pair[0]));
        }
        prop_assert_eq!(registry.latest().map(Delivery::id), listed.last().copied());
    }
}

#[test]
fn prerelease_sorts_before_release() {
    assert_eq!(compare_ids("2.0.0-rc.1", "2.0.0"), Ordering::Less);
    assert_eq!(compare_ids("1.9", "1.10"), Ordering::Less);
    assert_eq!(compare_ids("v1.2", "1.3"), Ordering::Less);
    assert_eq!(compare_ids("1.0", "nightly"), Ordering::Less);
}
