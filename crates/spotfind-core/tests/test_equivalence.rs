use std::collections::BTreeMap;

use spotfind_core::detection::{merge_equivalent_blobs, Blob, EquivalenceList};

#[test]
fn test_register_orders_pairs_and_skips_self() {
    let mut eq = EquivalenceList::new();
    eq.register(2, 5);
    eq.register(5, 2);
    eq.register(3, 3);
    assert_eq!(eq.pairs(), &[(5, 2), (5, 2)]);

    eq.dedup();
    assert_eq!(eq.len(), 1);
    eq.clear();
    assert!(eq.is_empty());
}

#[test]
fn test_transitive_chain_resolves_to_smallest_label() {
    let mut eq = EquivalenceList::new();
    eq.register(1, 2);
    eq.register(2, 3);
    let mapping = eq.reduce();
    assert_eq!(mapping.get(&2), Some(&1));
    assert_eq!(mapping.get(&3), Some(&1));
    assert!(!mapping.contains_key(&1));
}

#[test]
fn test_long_chain_registered_out_of_order() {
    // One indirection hop is not enough to flatten this.
    let mut eq = EquivalenceList::new();
    eq.register(9, 8);
    eq.register(7, 6);
    eq.register(8, 7);
    eq.register(6, 4);
    eq.register(4, 12);
    eq.register(20, 21);
    let mapping = eq.reduce();
    for label in [6, 7, 8, 9, 12] {
        assert_eq!(mapping[&label], 4, "label {label}");
    }
    assert_eq!(mapping[&21], 20);
    assert_eq!(mapping.len(), 6);
}

#[test]
fn test_merge_equivalent_blobs() {
    let mut blobs = BTreeMap::new();
    blobs.insert(1, Blob::from_point(0.0, 0.0, 0.0, 5.0));
    blobs.insert(2, Blob::from_point(1.0, 0.0, 0.0, 5.0));
    blobs.insert(3, Blob::from_point(2.0, 0.0, 0.0, 5.0));
    blobs.insert(10, Blob::from_point(9.0, 9.0, 0.0, 1.0));

    let mut eq = EquivalenceList::new();
    eq.register(3, 2);
    eq.register(2, 1);
    let removed = merge_equivalent_blobs(&mut blobs, &eq);

    assert_eq!(removed, 2);
    assert_eq!(blobs.keys().copied().collect::<Vec<_>>(), vec![1, 10]);
    assert_eq!(blobs[&1].components(), 3);
    assert!((blobs[&1].center_of_mass().x - 1.0).abs() < 1e-12);

    // Nothing left to merge.
    assert_eq!(merge_equivalent_blobs(&mut blobs, &eq), 0);
}

#[test]
fn test_merge_into_missing_root_keeps_blob() {
    let mut blobs = BTreeMap::new();
    blobs.insert(7, Blob::from_point(0.0, 0.0, 0.0, 5.0));
    let mut eq = EquivalenceList::new();
    eq.register(7, 3);
    merge_equivalent_blobs(&mut blobs, &eq);
    assert_eq!(blobs.keys().copied().collect::<Vec<_>>(), vec![3]);
}
