//! Weighted hypergraph shared by the population
//!
//! Nodes carry an opaque attribute bag plus derived coherence and
//! integration values; hyperedges relate two or more nodes with a weight.
//! Edges are append-only and keep their creation order.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use crate::error::HypergraphError;
use crate::handover::HandoverProvider;
use crate::numerics::mean;

/// Coherence assigned to a freshly added node
pub const INITIAL_COHERENCE: f64 = 1.0;

/// Weight of the dissipation penalty in [`Hypergraph::global_coherence`]
pub const DISSIPATION_WEIGHT: f64 = 0.5;

/// Weight of the integration bonus in [`Hypergraph::global_coherence`]
pub const INTEGRATION_WEIGHT: f64 = 0.1;

/// Stable node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Index of an edge in creation order
pub type EdgeId = usize;

/// Node entry of the hypergraph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Opaque attribute bag supplied by the caller
    pub attributes: Value,
    /// Derived; recomputed by [`Hypergraph::update_coherence`]
    pub coherence: f64,
    /// Last integration measure reported for this node
    pub integration: f64,
}

/// Weighted relation over two or more nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperedge {
    pub id: EdgeId,
    /// Distinct members, sorted
    pub members: Vec<NodeId>,
    pub weight: f64,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Hyperedge {
    pub fn contains(&self, id: &NodeId) -> bool {
        self.members.binary_search(id).is_ok()
    }
}

/// Persisted topology: node attribute bags plus edge membership and weight.
///
/// Coherence and integration are derived values and are not carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypergraphSnapshot {
    pub nodes: BTreeMap<NodeId, Value>,
    pub edges: Vec<EdgeRecord>,
}

/// One edge of a [`HypergraphSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub nodes: Vec<NodeId>,
    pub weight: f64,
}

impl HypergraphSnapshot {
    pub fn to_json(&self) -> Result<String, HypergraphError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, HypergraphError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Weighted hypergraph with derived coherence
#[derive(Debug, Clone)]
pub struct Hypergraph {
    name: String,
    nodes: HashMap<NodeId, GraphNode>,
    edges: Vec<Hyperedge>,
    incidence: HashMap<NodeId, Vec<EdgeId>>,
    dissipation: f64,
    integration: f64,
    coherence_window: Duration,
}

impl Hypergraph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            incidence: HashMap::new(),
            dissipation: 0.0,
            integration: 0.0,
            coherence_window: Duration::seconds(60),
        }
    }

    /// Trailing window used by the rate×intensity coherence mode
    pub fn with_coherence_window(mut self, window: Duration) -> Self {
        self.coherence_window = window;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a node; an identifier is generated when none is given.
    pub fn add_node(
        &mut self,
        id: Option<NodeId>,
        attributes: Value,
    ) -> Result<NodeId, HypergraphError> {
        let id = id.unwrap_or_else(NodeId::generate);
        if self.nodes.contains_key(&id) {
            return Err(HypergraphError::DuplicateNode(id));
        }

        let attributes = match attributes {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        self.nodes.insert(
            id.clone(),
            GraphNode {
                id: id.clone(),
                attributes,
                coherence: INITIAL_COHERENCE,
                integration: 0.0,
            },
        );
        self.incidence.insert(id.clone(), Vec::new());
        Ok(id)
    }

    /// Append a hyperedge over existing nodes.
    ///
    /// Members are de-duplicated. Fails without touching the graph if any
    /// member is unknown, fewer than two distinct members remain, or the
    /// weight is not finite.
    pub fn add_edge<I>(
        &mut self,
        members: I,
        weight: f64,
        metadata: Option<Value>,
    ) -> Result<EdgeId, HypergraphError>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let members: BTreeSet<NodeId> = members.into_iter().map(Into::into).collect();
        if let Some(missing) = members.iter().find(|m| !self.nodes.contains_key(*m)) {
            return Err(HypergraphError::UnknownNode(missing.clone()));
        }
        if members.len() < 2 {
            return Err(HypergraphError::DegenerateEdge {
                members: members.len(),
            });
        }
        if !weight.is_finite() {
            return Err(HypergraphError::InvalidWeight(weight));
        }

        let id = self.edges.len();
        for m in &members {
            self.incidence.entry(m.clone()).or_default().push(id);
        }
        self.edges.push(Hyperedge {
            id,
            members: members.into_iter().collect(),
            weight,
            metadata,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Edges in creation order
    pub fn edges(&self) -> &[Hyperedge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn incident_edges<'a>(&'a self, id: &NodeId) -> impl Iterator<Item = &'a Hyperedge> + 'a {
        self.incidence
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|&e| self.edges.get(e))
    }

    /// Nodes sharing at least one edge with `id` (sorted, excluding `id`)
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        let set: BTreeSet<&NodeId> = self
            .incident_edges(id)
            .flat_map(|e| e.members.iter())
            .filter(|m| *m != id)
            .collect();
        set.into_iter().cloned().collect()
    }

    /// Record the last integration measure of a node (ignored if unknown)
    pub fn set_node_integration(&mut self, id: &NodeId, phi: f64) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.integration = phi;
        }
    }

    pub fn set_dissipation(&mut self, dissipation: f64) {
        self.dissipation = dissipation.max(0.0);
    }

    pub fn dissipation(&self) -> f64 {
        self.dissipation
    }

    /// Set the population integration term of the global coherence
    pub fn set_integration(&mut self, phi: f64) {
        self.integration = phi.max(0.0);
    }

    pub fn integration(&self) -> f64 {
        self.integration
    }

    /// Recompute per-node coherence.
    ///
    /// Without a provider each node gets the plain average weight of its
    /// incident edges (zero without edges). With a provider each node gets
    /// `tanh(rate × intensity)` over the trailing coherence window.
    pub fn update_coherence(&mut self, provider: Option<&dyn HandoverProvider>) {
        let window = self.coherence_window;
        let updated: Vec<(NodeId, f64)> = self
            .nodes
            .keys()
            .map(|id| {
                let coherence = match provider {
                    Some(p) => {
                        let rate = p.handover_rate(id, window);
                        let intensity = p.average_intensity(id, window);
                        (rate * intensity).tanh()
                    }
                    None => {
                        let weights: Vec<f64> = self.incident_edges(id).map(|e| e.weight).collect();
                        mean(&weights)
                    }
                };
                (id.clone(), coherence)
            })
            .collect();

        for (id, coherence) in updated {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.coherence = coherence;
            }
        }
    }

    /// Mean per-node coherence (0 for an empty graph)
    pub fn average_coherence(&self) -> f64 {
        let values: Vec<f64> = self.nodes.values().map(|n| n.coherence).collect();
        mean(&values)
    }

    /// Node average minus a dissipation penalty plus an integration bonus,
    /// clamped to `[0, 1]`
    pub fn global_coherence(&self) -> f64 {
        (self.average_coherence() - DISSIPATION_WEIGHT * self.dissipation
            + INTEGRATION_WEIGHT * self.integration.tanh())
        .clamp(0.0, 1.0)
    }

    /// Partition nodes by edge connectivity (breadth-first).
    ///
    /// Each component is sorted; components are ordered by their smallest
    /// member. Nodes without edges form singleton components.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut order: Vec<&NodeId> = self.nodes.keys().collect();
        order.sort();

        let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
        let mut components = Vec::new();
        for start in order {
            if !visited.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for edge in self.incident_edges(current) {
                    for member in &edge.members {
                        if visited.insert(member) {
                            component.push(member.clone());
                            queue.push_back(member);
                        }
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// Topology and attribute bags for persistence
    pub fn snapshot(&self) -> HypergraphSnapshot {
        HypergraphSnapshot {
            nodes: self
                .nodes
                .values()
                .map(|n| (n.id.clone(), n.attributes.clone()))
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeRecord {
                    nodes: e.members.clone(),
                    weight: e.weight,
                })
                .collect(),
        }
    }

    /// Rebuild a graph from a snapshot; edge reference errors surface.
    pub fn from_snapshot(
        name: &str,
        snapshot: &HypergraphSnapshot,
    ) -> Result<Self, HypergraphError> {
        let mut graph = Self::new(name);
        for (id, attributes) in &snapshot.nodes {
            graph.add_node(Some(id.clone()), attributes.clone())?;
        }
        for edge in &snapshot.edges {
            graph.add_edge(edge.nodes.iter().cloned(), edge.weight, None)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_with(ids: &[&str]) -> Hypergraph {
        let mut g = Hypergraph::new("test");
        for id in ids {
            g.add_node(Some(NodeId::from(*id)), Value::Null).unwrap();
        }
        g
    }

    #[test]
    fn test_add_node_generates_id() {
        let mut g = Hypergraph::new("test");
        let id = g.add_node(None, json!({"kind": "seed"})).unwrap();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_eq!(g.node(&id).unwrap().coherence, INITIAL_COHERENCE);
        assert_eq!(g.node(&id).unwrap().attributes["kind"], "seed");
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut g = graph_with(&["a"]);
        assert_eq!(
            g.add_node(Some("a".into()), Value::Null),
            Err(HypergraphError::DuplicateNode("a".into()))
        );
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_unknown_member_leaves_graph_unchanged() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(["a", "b"], 0.5, None).unwrap();

        let err = g.add_edge(["a", "ghost"], 0.9, None).unwrap_err();
        assert_eq!(err, HypergraphError::UnknownNode("ghost".into()));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.incident_edges(&"a".into()).count(), 1);
    }

    #[test]
    fn test_degenerate_edges_rejected() {
        let mut g = graph_with(&["a", "b"]);
        assert!(matches!(
            g.add_edge(["a", "a"], 0.5, None),
            Err(HypergraphError::DegenerateEdge { members: 1 })
        ));
        assert!(matches!(
            g.add_edge(["a", "b"], f64::NAN, None),
            Err(HypergraphError::InvalidWeight(_))
        ));
        assert_eq!(g.edge_count(), 0);
    }

    /// Two nodes joined by a 0.5 edge both end at coherence 0.5
    #[test]
    fn test_plain_coherence_two_nodes() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(["a", "b"], 0.5, None).unwrap();
        g.update_coherence(None);

        assert_eq!(g.node(&"a".into()).unwrap().coherence, 0.5);
        assert_eq!(g.node(&"b".into()).unwrap().coherence, 0.5);
        assert_eq!(g.average_coherence(), 0.5);
        assert_eq!(g.global_coherence(), 0.5);
    }

    #[test]
    fn test_isolated_node_has_zero_coherence() {
        let mut g = graph_with(&["a", "b", "c"]);
        g.add_edge(["a", "b"], 0.9, None).unwrap();
        g.add_edge(["a", "b"], 0.3, None).unwrap();
        g.update_coherence(None);

        assert!((g.node(&"a".into()).unwrap().coherence - 0.6).abs() < 1e-12);
        assert_eq!(g.node(&"c".into()).unwrap().coherence, 0.0);
    }

    #[test]
    fn test_global_coherence_terms() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(["a", "b"], 0.5, None).unwrap();
        g.update_coherence(None);

        g.set_dissipation(0.2);
        assert!((g.global_coherence() - 0.4).abs() < 1e-12);

        g.set_dissipation(0.0);
        g.set_integration(100.0);
        assert!((g.global_coherence() - 0.6).abs() < 1e-9);

        g.set_dissipation(5.0);
        assert_eq!(g.global_coherence(), 0.0);
    }

    #[test]
    fn test_connected_components() {
        let mut g = graph_with(&["a", "b", "c", "d", "e", "f"]);
        g.add_edge(["a", "b"], 1.0, None).unwrap();
        g.add_edge(["b", "c"], 1.0, None).unwrap();
        g.add_edge(["d", "e", "f"], 1.0, None).unwrap();

        let components = g.connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec![NodeId::from("a"), "b".into(), "c".into()]);
        assert_eq!(components[1], vec![NodeId::from("d"), "e".into(), "f".into()]);
    }

    #[test]
    fn test_singleton_components() {
        let g = graph_with(&["x", "y"]);
        assert_eq!(
            g.connected_components(),
            vec![vec![NodeId::from("x")], vec![NodeId::from("y")]]
        );
    }

    #[test]
    fn test_neighbors() {
        let mut g = graph_with(&["a", "b", "c", "d"]);
        g.add_edge(["a", "b", "c"], 1.0, None).unwrap();
        assert_eq!(g.neighbors(&"a".into()), vec![NodeId::from("b"), "c".into()]);
        assert!(g.neighbors(&"d".into()).is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut g = graph_with(&["a", "b", "c"]);
        g.add_edge(["a", "b"], 0.25, Some(json!({"origin": "test"}))).unwrap();
        g.add_edge(["a", "b", "c"], 0.75, None).unwrap();

        let json = g.snapshot().to_json().unwrap();
        let restored =
            Hypergraph::from_snapshot("restored", &HypergraphSnapshot::from_json(&json).unwrap())
                .unwrap();

        assert_eq!(restored.snapshot(), g.snapshot());
        assert_eq!(restored.edges()[1].weight, 0.75);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(["b", "a"], 0.5, None).unwrap();
        let value = serde_json::to_value(g.snapshot()).unwrap();
        assert_eq!(
            value,
            json!({"nodes": {"a": {}, "b": {}}, "edges": [{"nodes": ["a", "b"], "weight": 0.5}]})
        );
    }

    #[test]
    fn test_snapshot_with_dangling_edge_fails() {
        let snapshot = HypergraphSnapshot {
            nodes: BTreeMap::from([(NodeId::from("a"), json!({}))]),
            edges: vec![EdgeRecord {
                nodes: vec!["a".into(), "b".into()],
                weight: 1.0,
            }],
        };
        assert_eq!(
            Hypergraph::from_snapshot("bad", &snapshot).unwrap_err(),
            HypergraphError::UnknownNode("b".into())
        );
    }
}
