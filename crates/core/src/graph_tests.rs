// SPDX-License-Identifier: MIT

use super::*;

fn key(name: &str) -> ServiceKey {
    ServiceKey::named::<()>(name)
}

#[test]
fn independent_vertices_share_a_single_layer() {
    let keys = vec![key("a"), key("b")];
    let layers = layer(&keys, &[]).unwrap();
    assert_eq!(layers.len(), 1);
}

#[test]
fn a_chain_produces_one_layer_per_link() {
    let keys = vec![key("a"), key("b"), key("c")];
    // a depends on b, b depends on c: c starts first.
    let edges = vec![(key("a"), key("b")), (key("b"), key("c"))];
    let layers = layer(&keys, &edges).unwrap();
    let forward: Vec<_> = layers.forward().cloned().collect();
    assert_eq!(forward, vec![vec![key("c")], vec![key("b")], vec![key("a")]]);
}

#[test]
fn non_lifecycle_intermediary_collapses_to_a_direct_edge() {
    let keys = vec![key("a"), key("b")];
    // a depends on helper (no lifecycle), helper depends on b.
    let edges = vec![(key("a"), key("helper")), (key("helper"), key("b"))];
    let layers = layer(&keys, &edges).unwrap();
    let forward: Vec<_> = layers.forward().cloned().collect();
    assert_eq!(forward, vec![vec![key("b")], vec![key("a")]]);
}

#[test]
fn three_way_cycle_is_reported_with_all_members() {
    let keys = vec![key("a"), key("b"), key("c")];
    let edges = vec![(key("a"), key("b")), (key("b"), key("c")), (key("c"), key("a"))];
    let err = layer(&keys, &edges).unwrap_err();
    match err {
        GraphError::LifecycleCycle(members) => {
            let mut names: Vec<&str> = members.iter().map(ServiceKey::as_str).collect();
            names.sort();
            assert_eq!(names, vec!["a", "b", "c"]);
        }
    }
}
