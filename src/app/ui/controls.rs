use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};

use crate::graph::{Dimension, MAX_NODES_RANGE, PALETTE, PhysicsParams, THRESHOLD_RANGE, TOP_N_RANGE, TopologyMode};

use super::super::ViewModel;

fn range((min, max): (f32, f32)) -> RangeInclusive<f32> {
    min..=max
}

fn physics_slider(ui: &mut Ui, value: &mut f32, bounds: (f32, f32), text: &str, hint: &str) {
    ui.add(
        egui::Slider::new(value, range(bounds))
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hint);
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search people")
            .on_hover_text("Fuzzy-highlight matching people without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.label("Relationship");
        ui.horizontal_wrapped(|ui| {
            for dimension in Dimension::ALL {
                ui.selectable_value(&mut self.config.dimension, dimension, dimension.label())
                    .on_hover_text(format!("Connect people through shared {}.", dimension.plural_label().to_lowercase()));
            }
        });

        ui.add_space(4.0);
        ui.label("Layout");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.config.mode, TopologyMode::Bipartite, TopologyMode::Bipartite.label())
                .on_hover_text("Link each person to the groups they belong to.");
            ui.selectable_value(&mut self.config.mode, TopologyMode::Pairwise, TopologyMode::Pairwise.label())
                .on_hover_text("Link people directly by how similar they are.");
        });

        ui.separator();

        ui.add_enabled_ui(self.config.mode == TopologyMode::Pairwise, |ui| {
            ui.add(egui::Slider::new(&mut self.config.threshold, range(THRESHOLD_RANGE)).text("Min similarity"))
                .on_hover_text("Hide connections weaker than this.");
        });

        ui.add(
            egui::Slider::new(&mut self.config.max_nodes, MAX_NODES_RANGE.0..=MAX_NODES_RANGE.1)
                .text("Max people"),
        )
        .on_hover_text("Keep only the best-connected people.");

        ui.add(
            egui::Slider::new(&mut self.config.top_n, TOP_N_RANGE.0..=TOP_N_RANGE.1.min(PALETTE.len()))
                .text("Colored groups"),
        )
        .on_hover_text("Largest groups that get their own color; the rest are gray.");

        ui.add_enabled_ui(self.config.mode == TopologyMode::Bipartite, |ui| {
            ui.checkbox(&mut self.config.include_isolated, "Show people outside colored groups");
        });

        ui.separator();

        ui.horizontal(|ui| {
            if ui
                .checkbox(&mut self.live_physics, "Live physics")
                .on_hover_text("Keep simulating layout forces while viewing the graph.")
                .changed()
            {
                if self.live_physics {
                    self.simulation.start();
                } else {
                    self.simulation.stop();
                }
            }
            if ui
                .add_enabled(self.live_physics, egui::Button::new("Reheat"))
                .on_hover_text("Restart the layout from the current positions.")
                .clicked()
            {
                self.simulation.reheat();
            }
            if ui
                .add_enabled(!self.transform.is_identity(), egui::Button::new("Reset view"))
                .clicked()
            {
                self.transform.reset();
            }
        });

        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut self.config.physics;
            physics_slider(
                ui,
                &mut physics.repulsion,
                PhysicsParams::REPULSION_RANGE,
                "Repulsion",
                "How strongly nodes push away from each other.",
            );
            physics_slider(
                ui,
                &mut physics.link_strength,
                PhysicsParams::LINK_STRENGTH_RANGE,
                "Link strength",
                "How strongly linked nodes pull toward their rest distance.",
            );
            physics_slider(
                ui,
                &mut physics.link_distance,
                PhysicsParams::LINK_DISTANCE_RANGE,
                "Link distance",
                "Rest length of links.",
            );
            physics_slider(
                ui,
                &mut physics.collision_radius_multiplier,
                PhysicsParams::COLLISION_RANGE,
                "Collision",
                "Spacing kept around each node, relative to its radius.",
            );
            physics_slider(
                ui,
                &mut physics.velocity_decay,
                PhysicsParams::VELOCITY_DECAY_RANGE,
                "Velocity decay",
                "Fraction of velocity lost every tick.",
            );
            physics_slider(
                ui,
                &mut physics.alpha_decay,
                PhysicsParams::ALPHA_DECAY_RANGE,
                "Cooling",
                "How quickly the layout settles.",
            );
            physics_slider(
                ui,
                &mut physics.centering_strength,
                PhysicsParams::CENTERING_RANGE,
                "Centering",
                "Pull toward the middle of the canvas.",
            );
            if ui.button("Defaults").clicked() {
                *physics = PhysicsParams::default();
            }
        });

        ui.separator();
        ui.small(format!(
            "layout {}, alpha {:.3}",
            self.simulation.state().label(),
            self.simulation.alpha()
        ));
    }
}
