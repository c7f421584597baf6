// SPDX-License-Identifier: MIT
//! The shared-instance map: one single-winner latch per `shared`/
//! `eager-shared` key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::descriptor::AnyArc;
use crate::key::ServiceKey;

type Cell = Arc<Mutex<Option<AnyArc>>>;

/// Per-key instance cells. The outer `RwLock` only ever guards the map of
/// cells, never a construction itself — holding a cell's own `Mutex` across
/// an `.await` is what gives "at most one concurrent construction per key"
/// without a registry-wide lock on the hot path.
pub(crate) struct InstanceStore {
    cells: RwLock<HashMap<ServiceKey, Cell>>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self { cells: RwLock::new(HashMap::new()) }
    }

    pub fn cell_for(&self, key: &ServiceKey) -> Cell {
        if let Some(cell) = self.cells.read().get(key) {
            return cell.clone();
        }
        self.cells.write().entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(None))).clone()
    }
}
