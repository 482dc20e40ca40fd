//! Benchmark profiles and deterministic tree generation for the datasource
//! store.
//!
//! - [`random_paths`]: seeded dotted paths over a small segment alphabet
//! - [`populate`]: create those paths in a store with integer leaf values
//! - [`wide_array`]: an array node with `n` elements

#![forbid(unsafe_code)]

use datasource::prelude::*;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Segment alphabet; small enough that generated paths share prefixes.
pub const SEGMENTS: [&str; 8] = [
    "Player", "Stats", "Health", "Mana", "Inventory", "Quest", "Party", "Settings",
];

/// `count` dotted paths of 1 to `max_depth` segments, reproducible from
/// `seed`.
pub fn random_paths(seed: u64, count: usize, max_depth: usize) -> Vec<String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max_depth = max_depth.max(1) as u32;
    (0..count)
        .map(|_| {
            let depth = 1 + rng.next_u32() % max_depth;
            (0..depth)
                .map(|_| SEGMENTS[rng.next_u32() as usize % SEGMENTS.len()])
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect()
}

/// Create every path in `paths`, setting each leaf to its index. Returns the
/// leaf handles in path order.
pub fn populate(store: &mut Store, paths: &[String]) -> Vec<Handle> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let leaf = store.find_or_create(Handle::INVALID, path);
            store.set(leaf, i as i32);
            leaf
        })
        .collect()
}

/// An array node named `List` with `n` elements.
pub fn wide_array(store: &mut Store, n: usize) -> Handle {
    let list = store.find_or_create(Handle::INVALID, "List");
    store.make_array(list, true);
    for _ in 0..n {
        store.array_append(list);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_reproducible() {
        assert_eq!(random_paths(7, 20, 4), random_paths(7, 20, 4));
        assert_ne!(random_paths(7, 20, 4), random_paths(8, 20, 4));
        assert!(random_paths(1, 50, 3)
            .iter()
            .all(|p| (1..=3).contains(&p.split('.').count())));
    }

    #[test]
    fn populate_resolves_every_path() {
        let paths = random_paths(42, 100, 5);
        let mut store = Store::new(StoreConfig::with_capacity(4096)).unwrap();
        let leaves = populate(&mut store, &paths);
        for (path, leaf) in paths.iter().zip(&leaves) {
            assert_eq!(store.find(Handle::INVALID, path), Some(*leaf));
        }
    }

    #[test]
    fn wide_array_has_n_elements() {
        let mut store = Store::default();
        let list = wide_array(&mut store, 32);
        assert_eq!(store.array_num(list), 32);
    }
}
