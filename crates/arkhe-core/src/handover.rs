//! Handover events and the rate×intensity coherence source
//!
//! A handover is a directed interaction between two nodes. The hypergraph
//! can derive coherence from recent handover activity instead of edge
//! weights by consulting a [`HandoverProvider`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::hypergraph::NodeId;

/// How a handover treats the information it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PreservationProtocol {
    /// Conserved quantities pass through unchanged
    #[default]
    Conservative,
    /// New structure emerges on the target
    Creative,
    /// Information is dissipated
    Destructive,
    /// The carried state changes kind
    Transmutative,
}

/// Source of interaction statistics for a node over a trailing window
pub trait HandoverProvider: Send + Sync {
    /// Interactions involving `node` per second over the last `window`
    fn handover_rate(&self, node: &NodeId, window: Duration) -> f64;

    /// Mean intensity of those interactions (0 when there were none)
    fn average_intensity(&self, node: &NodeId, window: Duration) -> f64;
}

/// One recorded interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handover {
    pub source: NodeId,
    pub target: NodeId,
    pub intensity: f64,
    pub protocol: PreservationProtocol,
    pub at: DateTime<Utc>,
}

impl Handover {
    pub fn involves(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Bounded in-memory handover log (oldest events evicted first)
#[derive(Debug, Clone)]
pub struct HandoverLog {
    events: VecDeque<Handover>,
    max_events: usize,
}

impl HandoverLog {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        let max_events = max_events.max(1);
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Record a handover happening now
    pub fn record(
        &mut self,
        source: NodeId,
        target: NodeId,
        intensity: f64,
        protocol: PreservationProtocol,
    ) {
        self.record_at(source, target, intensity, protocol, Utc::now());
    }

    /// Record a handover with an explicit timestamp
    pub fn record_at(
        &mut self,
        source: NodeId,
        target: NodeId,
        intensity: f64,
        protocol: PreservationProtocol,
        at: DateTime<Utc>,
    ) {
        if self.events.len() == self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(Handover {
            source,
            target,
            intensity,
            protocol,
            at,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &Handover> {
        self.events.iter()
    }

    fn recent<'a>(
        &'a self,
        node: &'a NodeId,
        window: Duration,
    ) -> impl Iterator<Item = &'a Handover> + 'a {
        let since = Utc::now() - window;
        self.events
            .iter()
            .filter(move |h| h.at >= since && h.involves(node))
    }
}

impl Default for HandoverLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HandoverProvider for HandoverLog {
    fn handover_rate(&self, node: &NodeId, window: Duration) -> f64 {
        let seconds = window.num_milliseconds() as f64 / 1000.0;
        if seconds <= 0.0 {
            return 0.0;
        }
        self.recent(node, window).count() as f64 / seconds
    }

    fn average_intensity(&self, node: &NodeId, window: Duration) -> f64 {
        let intensities: Vec<f64> = self.recent(node, window).map(|h| h.intensity).collect();
        crate::numerics::mean(&intensities)
    }
}
