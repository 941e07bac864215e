use std::sync::mpsc;

use eframe::egui::{self, Align, Context, Layout, RichText, Ui, vec2};

use crate::graph::{GraphConfig, TopologyMode};
use crate::people::Population;

use super::super::gestures::{ClickDispatcher, GestureTracker, ViewTransform};
use super::super::graph::{INITIAL_VIEWPORT, generate};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(source: String, population: Population, config: GraphConfig) -> Self {
        let config = config.sanitized();
        let (output, mut simulation) = generate(&population.people, &config, INITIAL_VIEWPORT, None);
        simulation.start();
        let (click_tx, click_rx) = mpsc::channel();

        let mut model = Self {
            source,
            people: population.people,
            load_errors: population.errors,
            config,
            applied_config: config,
            output,
            simulation,
            graph_revision: 0,
            live_physics: true,
            transform: ViewTransform::default(),
            gestures: GestureTracker::default(),
            clicks: ClickDispatcher::default(),
            click_tx,
            click_rx,
            selected: None,
            search: String::new(),
            search_match_cache: None,
        };
        model.register_click_handlers();
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_loading: bool) {
        self.apply_pending_config();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("kinship-graph");
                    ui.separator();
                    ui.label(format!("source: {}", self.source));
                    ui.label(format!("people: {}", self.people.len()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        self.draw_status(ui);
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls(ui);
                    ui.separator();
                    self.draw_legend(ui);
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading people...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }

    /// Generation metadata, rendered right to left.
    fn draw_status(&self, ui: &mut Ui) {
        let metadata = &self.output.metadata;
        let error_count = self.load_errors.len() + metadata.processing_errors.len();

        let errors = ui.label(format!("errors: {error_count}"));
        if error_count > 0 {
            errors.on_hover_ui(|ui| {
                for error in self.load_errors.iter().chain(&metadata.processing_errors) {
                    ui.label(error.to_string());
                }
            });
        }
        if let Some(isolated) = metadata.isolated_count {
            ui.label(format!("isolated: {isolated}"));
        }
        ui.label(format!("avg degree: {:.2}", metadata.average_degree));
        ui.label(format!("edges: {}", metadata.total_edges));
        ui.label(format!("entities: {}", metadata.total_entities));
        ui.separator();
        ui.label(format!(
            "{} · {}",
            self.output.dimension.label(),
            self.output.mode.label()
        ));
    }

    fn draw_legend(&self, ui: &mut Ui) {
        let title = match self.output.mode {
            TopologyMode::Bipartite => format!("Legend: {}", self.output.dimension.plural_label()),
            TopologyMode::Pairwise => format!("Legend: people by {}", self.output.dimension.label().to_lowercase()),
        };
        egui::CollapsingHeader::new(title)
            .default_open(true)
            .show(ui, |ui| {
                if self.output.legend.is_empty() {
                    ui.label("No groups to show.");
                    return;
                }

                for entry in &self.output.legend {
                    ui.horizontal(|ui| {
                        let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), egui::Sense::hover());
                        ui.painter().rect_filled(swatch, 2.0, entry.color);
                        let label = if entry.is_overflow() {
                            RichText::new(entry.label.as_str()).italics()
                        } else {
                            RichText::new(entry.label.as_str())
                        };
                        ui.label(label);
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            ui.label(entry.count.to_string());
                        });
                    });
                }
            });
    }
}
