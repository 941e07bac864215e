use eframe::egui::Color32;
use serde::Serialize;

use crate::people::{Person, ProcessingError};
use crate::util::{serialize_color, serialize_colors};

use super::config::TopologyMode;
use super::dimension::Dimension;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Entity { entity: Person },
    Group { key: String, members: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub radius: f32,
    #[serde(serialize_with = "serialize_color")]
    pub color: Color32,
    /// Colors of every featured group an entity belongs to, when it belongs
    /// to more than one.
    #[serde(serialize_with = "serialize_colors")]
    pub secondary_colors: Vec<Color32>,
    /// Group this node is colored by (or its fallback group when gray).
    pub group_key: Option<String>,
    pub group_label: Option<String>,
    pub featured: bool,
}

impl Node {
    pub fn entity_id(person_id: &str) -> String {
        format!("entity:{person_id}")
    }

    pub fn group_id(group_key: &str) -> String {
        format!("group:{group_key}")
    }

    pub fn entity(&self) -> Option<&Person> {
        match &self.kind {
            NodeKind::Entity { entity } => Some(entity),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f32,
    #[serde(serialize_with = "serialize_color")]
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub rest_length: f32,
}

impl Edge {
    pub const MIN_WIDTH: f32 = 1.0;
    pub const MAX_WIDTH: f32 = 4.0;

    pub fn new(source: usize, target: usize, weight: f32, color: Color32, rest_length: f32) -> Self {
        let weight = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            source,
            target,
            weight,
            color,
            width: Self::MIN_WIDTH + (Self::MAX_WIDTH - Self::MIN_WIDTH) * weight,
            opacity: 0.25 + 0.6 * weight,
            rest_length,
        }
    }
}

/// A retained pairwise similarity between two people.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Connection {
    pub a: String,
    pub b: String,
    pub strength: f32,
    pub dimension: Dimension,
    pub shared: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub key: String,
    pub label: String,
    #[serde(serialize_with = "serialize_color")]
    pub color: Color32,
    pub count: usize,
    /// Number of gray groups folded into this entry; zero for featured groups.
    pub collapsed_groups: usize,
}

impl LegendEntry {
    pub fn is_overflow(&self) -> bool {
        self.collapsed_groups > 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphMetadata {
    pub total_entities: usize,
    pub total_edges: usize,
    pub average_degree: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolated_count: Option<usize>,
    pub processing_errors: Vec<ProcessingError>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphOutput {
    pub dimension: Dimension,
    pub mode: TopologyMode,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub connections: Vec<Connection>,
    pub legend: Vec<LegendEntry>,
    pub metadata: GraphMetadata,
}

impl GraphOutput {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }

    /// Indices of nodes sharing an edge with `index`.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let mut neighbors = self
            .edges
            .iter()
            .filter_map(|edge| {
                if edge.source == index {
                    Some(edge.target)
                } else if edge.target == index {
                    Some(edge.source)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }
}
