//! Property tests for the filter-and-sort pipeline

use meshping_core::Target;
use meshping_core::address::rank_or_fallback;
use meshping_core::pipeline::derive;
use proptest::prelude::*;

fn ipv4() -> impl Strategy<Value = String> {
    any::<[u8; 4]>().prop_map(|o| format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3]))
}

fn ipv6() -> impl Strategy<Value = String> {
    any::<[u16; 8]>().prop_map(|groups| {
        groups
            .iter()
            .map(|g| format!("{:x}", g))
            .collect::<Vec<_>>()
            .join(":")
    })
}

fn address() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => ipv4(),
        3 => ipv6(),
        1 => "[a-z]{1,6}",
    ]
}

/// Targets with unique names, so positions can be traced through the view
fn targets() -> impl Strategy<Value = Vec<Target>> {
    prop::collection::vec(("[a-zA-Z]{1,6}", address()), 0..24).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (name, addr))| Target::new(format!("{}-{}", name, i), addr))
            .collect()
    })
}

fn search() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-zA-Z0-9.:]{1,3}"]
}

fn position(all: &[Target], target: &Target) -> usize {
    all.iter()
        .position(|t| t == target)
        .expect("view entries come from the collection")
}

proptest! {
    #[test]
    fn prop_derive_is_idempotent(all in targets(), search in search()) {
        prop_assert_eq!(derive(&all, &search), derive(&all, &search));
    }

    #[test]
    fn prop_derive_of_view_is_unchanged(all in targets(), search in search()) {
        let once = derive(&all, &search);
        let twice = derive(&once, &search);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_view_is_subset_of_collection(all in targets(), search in search()) {
        let view = derive(&all, &search);
        prop_assert!(view.len() <= all.len());
        for target in &view {
            prop_assert!(all.contains(target));
        }
    }

    #[test]
    fn prop_view_is_ordered_by_rank(all in targets(), search in search()) {
        let view = derive(&all, &search);
        for pair in view.windows(2) {
            prop_assert!(rank_or_fallback(&pair[0].addr) <= rank_or_fallback(&pair[1].addr));
        }
    }

    #[test]
    fn prop_equal_ranks_keep_collection_order(all in targets(), search in search()) {
        let view = derive(&all, &search);
        for pair in view.windows(2) {
            if rank_or_fallback(&pair[0].addr) == rank_or_fallback(&pair[1].addr) {
                prop_assert!(position(&all, &pair[0]) < position(&all, &pair[1]));
            }
        }
    }

    #[test]
    fn prop_filter_keeps_exactly_matching_targets(all in targets(), search in search()) {
        let view = derive(&all, &search);
        let needle = search.to_lowercase();
        let expected = all
            .iter()
            .filter(|t| {
                search.is_empty()
                    || t.name.to_lowercase().contains(&needle)
                    || t.addr.contains(&needle)
            })
            .count();
        prop_assert_eq!(view.len(), expected);
    }

    #[test]
    fn prop_empty_search_keeps_everything(all in targets()) {
        prop_assert_eq!(derive(&all, "").len(), all.len());
    }
}
