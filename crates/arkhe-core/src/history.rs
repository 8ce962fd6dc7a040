//! Bounded history of state snapshots

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity ring buffer of state snapshots (oldest first).
///
/// Once full, every push evicts the oldest snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryWindow {
    capacity: usize,
    snapshots: VecDeque<Vec<f64>>,
}

impl HistoryWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            snapshots: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a snapshot, evicting the oldest one if the window is full
    pub fn push(&mut self, snapshot: Vec<f64>) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.snapshots.len() == self.capacity
    }

    /// Snapshots in insertion order (oldest first)
    pub fn snapshots(&self) -> impl Iterator<Item = &Vec<f64>> {
        self.snapshots.iter()
    }

    /// Contiguous copy of the window, oldest first
    pub fn to_vec(&self) -> Vec<Vec<f64>> {
        self.snapshots.iter().cloned().collect()
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<&Vec<f64>> {
        self.snapshots.back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
