use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use tracing::{info, warn};

use crate::graph::{GraphConfig, GraphOutput, Node};
use crate::layout::Simulation;
use crate::people::{Person, Population, ProcessingError, load_population};

mod gestures;
mod graph;
mod render_utils;
mod ui;

use gestures::{ClickDispatcher, GestureTracker, ViewTransform};

pub struct KinshipGraphApp {
    input: PathBuf,
    initial_config: GraphConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Population, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Population, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Sent by the per-node click handlers.
struct NodeClicked {
    node: Box<Node>,
}

struct ViewModel {
    source: String,
    people: Vec<Person>,
    load_errors: Vec<ProcessingError>,
    /// Edited by the controls; applied on the next frame when it differs.
    config: GraphConfig,
    applied_config: GraphConfig,
    output: GraphOutput,
    simulation: Simulation,
    graph_revision: u64,
    live_physics: bool,
    transform: ViewTransform,
    gestures: GestureTracker,
    clicks: ClickDispatcher,
    click_tx: Sender<NodeClicked>,
    click_rx: Receiver<NodeClicked>,
    selected: Option<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl KinshipGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, input: PathBuf, initial_config: GraphConfig) -> Self {
        let state = Self::start_load(input.clone());
        Self {
            input,
            initial_config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(input: PathBuf) -> Receiver<Result<Population, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_population(&input).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                warn!(%error, "loading people failed");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(input: PathBuf) -> AppState {
        info!(path = %input.display(), "loading people");
        AppState::Loading {
            rx: Self::spawn_load(input),
        }
    }

    fn ready(&self, population: Population, config: GraphConfig) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            self.input.display().to_string(),
            population,
            config,
        )))
    }
}

impl eframe::App for KinshipGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(population) => self.ready(population, self.initial_config),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading people...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load people");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.input.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.input.clone()));
                }

                let current_config = model.config;
                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(population) => self.ready(population, current_config),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
