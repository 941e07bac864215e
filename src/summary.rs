//! Headless rendition of one generation pass: build the graph, run the layout
//! until it settles and report where everything ended up.

use std::collections::BTreeMap;

use eframe::egui::{Vec2, vec2};
use serde::Serialize;
use tracing::{debug, warn};

use crate::graph::{Dimension, GraphConfig, GraphMetadata, LegendEntry, TopologyMode, build_graph};
use crate::layout::{Simulation, SimulationState};
use crate::people::{Person, ProcessingError};

pub const SUMMARY_VIEWPORT: Vec2 = vec2(1200.0, 800.0);
/// Upper bound on ticks; the default cooling settles in about 300.
pub const MAX_SETTLE_STEPS: usize = 5_000;
const TICK_SECONDS: f32 = 1.0 / 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GraphSummary {
    pub dimension: Dimension,
    pub mode: TopologyMode,
    pub metadata: GraphMetadata,
    pub legend: Vec<LegendEntry>,
    /// Keyed by node id.
    pub positions: BTreeMap<String, Position>,
    pub settled: bool,
    pub steps: usize,
    /// Entries dropped while reading the input.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_errors: Vec<ProcessingError>,
}

pub fn summarize(people: &[Person], load_errors: &[ProcessingError], config: &GraphConfig) -> GraphSummary {
    let output = build_graph(people, config);
    let mut simulation = Simulation::new(
        &output.nodes,
        &output.edges,
        config.physics,
        SUMMARY_VIEWPORT,
        None,
    );

    simulation.start();
    let mut steps = 0;
    while steps < MAX_SETTLE_STEPS && simulation.step(TICK_SECONDS) {
        steps += 1;
    }

    let settled = simulation.state() == SimulationState::Settled;
    if settled {
        debug!(steps, "summary layout settled");
    } else {
        warn!(steps, alpha = simulation.alpha(), "summary layout did not settle");
    }

    let positions = simulation
        .bodies()
        .iter()
        .map(|body| {
            (
                body.id.clone(),
                Position {
                    x: body.position.x,
                    y: body.position.y,
                },
            )
        })
        .collect();

    GraphSummary {
        dimension: output.dimension,
        mode: output.mode,
        metadata: output.metadata,
        legend: output.legend,
        positions,
        settled,
        steps,
        load_errors: load_errors.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::people::parse_population;

    fn population() -> crate::people::Population {
        let raw = json!([
            { "id": "ana", "name": "Ana", "companies": [{ "key": "acme", "name": "Acme" }] },
            { "id": "bo", "name": "Bo", "companies": [{ "key": "acme" }, { "key": "globex" }] },
            { "id": "cy", "name": "Cy", "companies": [{ "key": "globex", "name": "Globex" }] },
            { "id": "di", "name": "Di" },
            { "id": "ed", "name": "Ed", "companies": "not a list" }
        ]);
        parse_population(&raw.to_string()).unwrap()
    }

    #[test]
    fn summary_settles_with_every_node_in_bounds() {
        let population = population();
        let config = GraphConfig {
            dimension: Dimension::Company,
            ..GraphConfig::default()
        };
        let summary = summarize(&population.people, &population.errors, &config);

        assert!(summary.settled);
        assert!(summary.steps < MAX_SETTLE_STEPS);
        // two groups and the three people who belong to them
        assert_eq!(summary.positions.len(), 5);
        assert_eq!(summary.metadata.isolated_count, Some(1));
        for position in summary.positions.values() {
            assert!(position.x >= 0.0 && position.x <= SUMMARY_VIEWPORT.x);
            assert!(position.y >= 0.0 && position.y <= SUMMARY_VIEWPORT.y);
        }
    }

    #[test]
    fn summary_serializes_metadata_legend_and_positions() {
        let population = population();
        let config = GraphConfig {
            dimension: Dimension::Company,
            mode: TopologyMode::Pairwise,
            ..GraphConfig::default()
        };
        let summary = summarize(&population.people, &population.errors, &config);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["mode"], "pairwise");
        assert_eq!(value["metadata"]["total_entities"], 4);
        assert!(value["positions"]["entity:bo"]["x"].is_number());
        assert!(value["legend"].as_array().is_some_and(|legend| !legend.is_empty()));
        assert_eq!(value["load_errors"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["metadata"].get("isolated_count"), None::<&Value>);
    }
}
