mod build;
mod config;
mod dimension;
mod legend;
mod ranking;
mod types;

pub use build::build_graph;
pub use config::{GraphConfig, MAX_NODES_RANGE, PhysicsParams, THRESHOLD_RANGE, TOP_N_RANGE, TopologyMode};
pub use dimension::Dimension;
pub use ranking::PALETTE;
pub use types::{Edge, GraphMetadata, GraphOutput, LegendEntry, Node, NodeKind};
