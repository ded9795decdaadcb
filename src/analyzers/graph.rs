//! Origin → destination diagrams for a handful of trips.
//!
//! Nodes are identified by location name, so trips from unrelated vehicles
//! that share a place name meet at the same node. Every trip adds its own
//! edge: repeated journeys show up as parallel edges and round trips from a
//! place back to itself stay as self-loops.
//!
//! [`build_geofence_graph`] draws the same trips between geofences instead,
//! which shows where out-of-route journeys leave and rejoin known areas.

use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};

use crate::trip::Trip;

/// Number of trips drawn when the caller does not ask for a different limit.
pub const DEFAULT_GRAPH_LIMIT: usize = 5;

/// Node label used for a trip endpoint outside every geofence.
pub const MISSING_GEOFENCE: &str = "Out of geofence";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEdge {
    pub from: String,
    pub to: String,
    /// Raw trip distance in km.
    pub weight: f64,
}

#[derive(Debug, Default)]
pub struct TripGraph {
    graph: DiGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

#[derive(Serialize)]
struct GraphView<'a> {
    nodes: Vec<&'a str>,
    edges: Vec<TripEdge>,
}

impl TripGraph {
    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: &str, to: &str, distance: f64) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.add_edge(from, to, distance);
    }

    /// Location names in the order they were first seen.
    pub fn nodes(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].as_str())
            .collect()
    }

    /// One edge per trip, in trip order.
    pub fn edges(&self) -> Vec<TripEdge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (from, to) = self.graph.edge_endpoints(e)?;
                Some(TripEdge {
                    from: self.graph[from].clone(),
                    to: self.graph[to].clone(),
                    weight: self.graph[e],
                })
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Graphviz rendering with distances as edge labels.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for TripGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphView {
            nodes: self.nodes(),
            edges: self.edges(),
        }
        .serialize(serializer)
    }
}

/// Builds a diagram from the first `limit` trips in source order.
///
/// The cut-off keeps the diagram readable; it is a sample, not a summary of
/// the whole selection.
pub fn build_graph(trips: &[&Trip], limit: usize) -> TripGraph {
    let mut graph = TripGraph::default();
    for trip in trips.iter().take(limit) {
        graph.add_edge(&trip.start_location, &trip.end_location, trip.distance);
    }
    graph
}

/// Like [`build_graph`], with start and end geofences as the endpoints.
///
/// Missing geofences all map to the [`MISSING_GEOFENCE`] node.
pub fn build_geofence_graph(trips: &[&Trip], limit: usize) -> TripGraph {
    let mut graph = TripGraph::default();
    for trip in trips.iter().take(limit) {
        graph.add_edge(
            trip.start_geofence.as_deref().unwrap_or(MISSING_GEOFENCE),
            trip.end_geofence.as_deref().unwrap_or(MISSING_GEOFENCE),
            trip.distance,
        );
    }
    graph
}
