// SPDX-License-Identifier: MIT
//! The dependency graph engine: turns raw resolve edges into ordered layers
//! of lifecycle-bearing vertices, ready for parallel-within-layer start/stop.

use std::collections::{HashMap, HashSet};

use crate::error::GraphError;
use crate::key::ServiceKey;

/// Lifecycle vertices grouped into start-order layers. Layer 0 has no
/// dependencies on any other lifecycle vertex; layer N depends only on
/// vertices in layers `< N`. Shutdown runs the layers in reverse.
pub struct Layers(Vec<Vec<ServiceKey>>);

impl Layers {
    pub fn forward(&self) -> impl Iterator<Item = &Vec<ServiceKey>> {
        self.0.iter()
    }

    pub fn reverse(&self) -> impl Iterator<Item = &Vec<ServiceKey>> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build start-order layers from the resolver's recorded requester-requested
/// edges, restricted to `lifecycle_keys`.
///
/// Intermediaries with no lifecycle hooks are invisible to the layering: a
/// chain `A -> X -> B` where `X` carries no hooks collapses to a direct edge
/// `A -> B`, so a non-lifecycle helper sitting between two lifecycle-bearing
/// services never breaks them into separate layers than if it weren't there.
pub fn layer(lifecycle_keys: &[ServiceKey], edges: &[(ServiceKey, ServiceKey)]) -> Result<Layers, GraphError> {
    let lifecycle_set: HashSet<&ServiceKey> = lifecycle_keys.iter().collect();

    let mut adjacency: HashMap<&ServiceKey, Vec<&ServiceKey>> = HashMap::new();
    for (from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }

    // For each lifecycle vertex, collapse through non-lifecycle requested
    // vertices to find the set of lifecycle vertices it actually depends on.
    let mut depends_on: HashMap<&ServiceKey, HashSet<&ServiceKey>> = HashMap::new();
    for key in lifecycle_keys {
        let mut deps: HashSet<&ServiceKey> = HashSet::new();
        let mut visited: HashSet<&ServiceKey> = HashSet::new();
        let mut stack: Vec<&ServiceKey> = vec![key];
        while let Some(current) = stack.pop() {
            let Some(next_hops) = adjacency.get(current) else { continue };
            for next in next_hops {
                if !visited.insert(next) {
                    continue;
                }
                if lifecycle_set.contains(next) {
                    if *next != key {
                        deps.insert(next);
                    }
                } else {
                    stack.push(next);
                }
            }
        }
        depends_on.insert(key, deps);
    }

    let mut placed: HashSet<&ServiceKey> = HashSet::new();
    let mut layers: Vec<Vec<ServiceKey>> = Vec::new();

    while placed.len() < lifecycle_keys.len() {
        let ready: Vec<&ServiceKey> = lifecycle_keys
            .iter()
            .filter(|key| !placed.contains(*key))
            .filter(|key| depends_on[*key].iter().all(|dep| placed.contains(dep)))
            .collect();

        if ready.is_empty() {
            let stuck: Vec<ServiceKey> = lifecycle_keys.iter().filter(|key| !placed.contains(key)).cloned().collect();
            return Err(GraphError::LifecycleCycle(stuck));
        }

        for key in &ready {
            placed.insert(key);
        }
        layers.push(ready.into_iter().cloned().collect());
    }

    Ok(Layers(layers))
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;

#[cfg(all(test, feature = "test-support"))]
#[path = "graph_property_tests.rs"]
mod property_tests;
