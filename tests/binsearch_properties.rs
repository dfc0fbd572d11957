//! Property-based tests for the binary-search primitives over sorted u64
//! columns. These operate directly on in-memory sorted `Vec<u64>` through
//! the closure-based `get` callback, independent of any mmap-backed file.

use proptest::prelude::*;
use variantkey::core::binsearch::{col_find_first, col_find_last, col_has_next};

fn sorted_u64_vec_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..1000, 0..100).prop_map(|mut v| {
        v.sort_unstable();
        v
    })
}

proptest! {
    /// col_find_first returns the index of the first element >= value, or
    /// `last` if none qualifies -- verified against a linear scan.
    #[test]
    fn prop_col_find_first_matches_linear_scan(arr in sorted_u64_vec_strategy(), value in 0u64..1000) {
        let last = arr.len() as u64;
        let get = |i: u64| arr[i as usize];
        let found = col_find_first(get, 0, last, value);
        let expected = arr.iter().position(|&v| v >= value).map(|i| i as u64).unwrap_or(last);
        prop_assert_eq!(found, expected);
    }

    /// col_find_last returns the index of the last element <= value, or
    /// `last` if none qualifies.
    #[test]
    fn prop_col_find_last_matches_linear_scan(arr in sorted_u64_vec_strategy(), value in 0u64..1000) {
        let last = arr.len() as u64;
        let get = |i: u64| arr[i as usize];
        let found = col_find_last(get, 0, last, value);
        let expected = arr.iter().rposition(|&v| v <= value).map(|i| i as u64).unwrap_or(last);
        prop_assert_eq!(found, expected);
    }

    /// Every index col_find_first returns within range actually satisfies
    /// `get(idx) >= value`, and every element before it does not.
    #[test]
    fn prop_col_find_first_is_a_true_lower_bound(arr in sorted_u64_vec_strategy(), value in 0u64..1000) {
        let last = arr.len() as u64;
        let get = |i: u64| arr[i as usize];
        let found = col_find_first(get, 0, last, value);
        if found < last {
            prop_assert!(arr[found as usize] >= value);
        }
        for i in 0..found.min(last) {
            prop_assert!(arr[i as usize] < value);
        }
    }

    /// col_has_next walks to the next row still holding `value`, or returns
    /// None once the run ends -- exercised over runs of a repeated key.
    #[test]
    fn prop_col_has_next_walks_exactly_the_duplicate_run(
        prefix_len in 0..20usize,
        run_len in 1..20usize,
        suffix_len in 0..20usize,
    ) {
        let value = 500u64;
        let mut arr = Vec::new();
        arr.extend(std::iter::repeat(value - 1).take(prefix_len));
        arr.extend(std::iter::repeat(value).take(run_len));
        arr.extend(std::iter::repeat(value + 1).take(suffix_len));
        let last = arr.len() as u64;
        let get = |i: u64| arr[i as usize];

        let mut pos = prefix_len as u64;
        let mut visited = 1;
        while let Some(next) = col_has_next(get, pos, last, value) {
            prop_assert_eq!(arr[next as usize], value);
            pos = next;
            visited += 1;
        }
        prop_assert_eq!(visited, run_len as u64);
    }
}
