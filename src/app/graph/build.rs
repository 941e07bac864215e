use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::{debug, info};

use crate::graph::{GraphConfig, GraphOutput, Node, build_graph};
use crate::layout::Simulation;
use crate::people::Person;

use super::super::{NodeClicked, ViewModel};

/// Used until the canvas has been laid out once.
pub(in crate::app) const INITIAL_VIEWPORT: Vec2 = vec2(1000.0, 720.0);

pub(in crate::app) fn generate(
    people: &[Person],
    config: &GraphConfig,
    viewport: Vec2,
    seed: Option<&HashMap<String, Vec2>>,
) -> (GraphOutput, Simulation) {
    let output = build_graph(people, config);
    let simulation = Simulation::new(
        &output.nodes,
        &output.edges,
        config.physics,
        viewport,
        seed,
    );
    (output, simulation)
}

impl ViewModel {
    /// Rebuilds the graph and restarts the layout when the controls changed
    /// anything. The previous simulation is dropped before the new one runs,
    /// seeded with the last known positions.
    pub(in crate::app) fn apply_pending_config(&mut self) {
        if self.config == self.applied_config {
            return;
        }

        self.config = self.config.sanitized();
        let seed = self.simulation.positions();
        let viewport = self.simulation.viewport();
        let (output, simulation) = generate(&self.people, &self.config, viewport, Some(&seed));

        if let Some(index) = self.gestures.cancel() {
            debug!(index, "dropped in-flight drag on regeneration");
        }
        self.output = output;
        self.simulation = simulation;
        self.applied_config = self.config;
        self.graph_revision = self.graph_revision.wrapping_add(1);
        self.search_match_cache = None;

        if self
            .selected
            .as_deref()
            .is_some_and(|id| self.output.node_index(id).is_none())
        {
            self.selected = None;
        }

        self.register_click_handlers();
        if self.live_physics {
            self.simulation.start();
        }

        info!(
            nodes = self.output.nodes.len(),
            edges = self.output.edges.len(),
            revision = self.graph_revision,
            "restarted layout"
        );
    }

    pub(in crate::app) fn register_click_handlers(&mut self) {
        self.clicks.clear();
        for node in &self.output.nodes {
            let tx = self.click_tx.clone();
            self.clicks.register(
                node.id.clone(),
                Box::new(move |node: &Node| {
                    let _ = tx.send(NodeClicked {
                        node: Box::new(node.clone()),
                    });
                }),
            );
        }
    }

    /// Applies clicks reported by the handlers since the last frame.
    pub(in crate::app) fn drain_clicks(&mut self) {
        while let Ok(NodeClicked { node }) = self.click_rx.try_recv() {
            debug!(id = %node.id, label = %node.label, "node clicked");
            let already_selected = self.selected.as_deref() == Some(node.id.as_str());
            self.set_selected((!already_selected).then_some(node.id));
        }
    }
}
