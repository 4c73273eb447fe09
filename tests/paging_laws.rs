use cursor_table::domain::{CursorListResult, QueryIdentity, SortSpec, has_query_identity_changed};
use cursor_table::paging::{
    CursorChain, PageCache, build_next_page_cursors, build_trimmed_cache, has_total_count_changed,
};
use cursor_table::query::{parse_cursor_param, parse_sort_param, serialize_cursor_param};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn cache_of(indices: &BTreeSet<usize>) -> PageCache<usize> {
    indices
        .iter()
        .map(|&i| (i, Arc::new(CursorListResult::done(vec![i]))))
        .collect()
}

fn arb_identity() -> impl Strategy<Value = QueryIdentity> {
    (
        "[a-z ]{0,6}",
        1usize..200,
        prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,4}", 0..3),
        prop::option::of(("[a-z]{1,6}", any::<bool>())),
    )
        .prop_map(|(search, page_size, filters, sort)| QueryIdentity {
            search,
            page_size,
            filters,
            sort_by: sort.map(|(field, asc)| {
                if asc {
                    SortSpec::asc(field)
                } else {
                    SortSpec::desc(field)
                }
            }),
        })
}

proptest! {
    #[test]
    fn trim_within_bounds_is_identity(
        indices in prop::collection::btree_set(0usize..64, 0..8),
        current in 0usize..64,
        extra in 0usize..4,
    ) {
        let cache = cache_of(&indices);
        let max = indices.len() + extra;
        let trimmed = build_trimmed_cache(&cache, current, max);
        prop_assert_eq!(trimmed.indices().collect::<Vec<_>>(), cache.indices().collect::<Vec<_>>());
    }

    #[test]
    fn trim_keeps_closest_pages(
        indices in prop::collection::btree_set(0usize..64, 2..20),
        current in 0usize..64,
        max in 1usize..10,
    ) {
        prop_assume!(indices.len() > max);
        let cache = cache_of(&indices);
        let trimmed = build_trimmed_cache(&cache, current, max);
        prop_assert_eq!(trimmed.len(), max);

        let mut distances: Vec<usize> = indices.iter().map(|i| i.abs_diff(current)).collect();
        distances.sort_unstable();
        let cutoff = distances[max - 1];
        for index in trimmed.indices() {
            prop_assert!(index.abs_diff(current) <= cutoff);
        }
    }

    #[test]
    fn next_page_cursor_lands_at_index(
        known in prop::collection::vec("[a-z0-9]{1,6}", 0..8),
        next_index in 1usize..12,
        cursor in "[a-z0-9]{1,6}",
    ) {
        let mut chain = CursorChain::new();
        for (i, c) in known.iter().enumerate() {
            chain.record(i + 1, c);
        }
        let next = build_next_page_cursors(&chain, next_index, cursor.clone());
        prop_assert_eq!(next.cursor_for(next_index), Some(Some(cursor.as_str())));
        prop_assert_eq!(next.last_index(), Some(next_index));
        prop_assert_eq!(next.len(), known.len().min(next_index - 1) + 1);
        for i in 1..next_index {
            prop_assert_eq!(next.cursor_for(i), chain.cursor_for(i));
        }
    }

    #[test]
    fn cursor_param_round_trips(cursor in any::<String>()) {
        prop_assume!(!cursor.is_empty());
        let encoded = serialize_cursor_param(&cursor);
        prop_assert_eq!(parse_cursor_param(&encoded), Some(cursor));
    }

    #[test]
    fn sort_param_requires_direction(field in "[a-z_]{1,8}", suffix in "[a-z]{0,5}") {
        let parsed = parse_sort_param(&format!("{field}.{suffix}"));
        match suffix.as_str() {
            "asc" => prop_assert_eq!(parsed, Some(SortSpec::asc(field))),
            "desc" => prop_assert_eq!(parsed, Some(SortSpec::desc(field))),
            _ => prop_assert_eq!(parsed, None),
        }
    }

    #[test]
    fn identity_equal_to_itself(identity in arb_identity()) {
        prop_assert!(!has_query_identity_changed(&identity, &identity.clone()));
    }

    #[test]
    fn identity_search_change_detected(identity in arb_identity(), suffix in "[a-z]{1,3}") {
        let mut changed = identity.clone();
        changed.search.push_str(&suffix);
        prop_assert!(has_query_identity_changed(&identity, &changed));
    }

    #[test]
    fn total_count_change_needs_both_sides(a in any::<u64>(), b in any::<u64>()) {
        prop_assert!(!has_total_count_changed(None, Some(b)));
        prop_assert!(!has_total_count_changed(Some(a), None));
        prop_assert_eq!(has_total_count_changed(Some(a), Some(b)), a != b);
    }
}

#[test]
fn filter_order_does_not_change_identity() {
    let a = QueryIdentity {
        search: String::new(),
        page_size: 10,
        filters: BTreeMap::from([("role".into(), "all".into()), ("team".into(), "x".into())]),
        sort_by: None,
    };
    let mut filters = BTreeMap::new();
    filters.insert("team".to_string(), "x".to_string());
    filters.insert("role".to_string(), "all".to_string());
    let b = QueryIdentity { filters, ..a.clone() };
    assert!(!has_query_identity_changed(&a, &b));
}
