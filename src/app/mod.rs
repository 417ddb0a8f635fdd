use std::cell::Cell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context, Pos2};
use market_graph::config::AppConfig;
use market_graph::error::ConfigurationError;
use market_graph::frame::{EncodingConfig, Frame};
use market_graph::model::{GraphPayload, load_payload};
use market_graph::physics::{Bounds, Simulation, TickReport};
use market_graph::stats::DatasetThresholds;
use market_graph::viewport::Viewport;
use tracing::{info, warn};

mod graph;
mod render_utils;
mod ui;

pub struct MarketGraphApp {
    payload_path: PathBuf,
    config: AppConfig,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphPayload, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    simulation: Simulation,
    thresholds: DatasetThresholds,
    encoding: EncodingConfig,
    viewport: Viewport,
    frame: Frame,
    search: String,
    selected: Option<usize>,
    hovered: Option<usize>,
    dragging: Option<usize>,
    live_simulation: bool,
    last_tick: TickReport,
    corrected_total: Rc<Cell<usize>>,
    search_match_cache: Option<SearchMatchCache>,
    view_scratch: ViewScratch,
}

struct SearchMatchCache {
    query: String,
    /// Best match first.
    ranked: Arc<Vec<usize>>,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
}

impl MarketGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        payload_path: PathBuf,
        config: AppConfig,
    ) -> Self {
        let state = Self::start_load(payload_path.clone());
        Self {
            payload_path,
            config,
            state,
        }
    }

    fn spawn_load(payload_path: PathBuf) -> Receiver<Result<GraphPayload, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_payload(&payload_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(payload_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(payload_path),
        }
    }

    fn ready_state(payload: GraphPayload, config: AppConfig) -> AppState {
        match ViewModel::new(payload, config) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(error.to_string()),
        }
    }
}

impl eframe::App for MarketGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(payload)) => {
                        info!(
                            nodes = payload.nodes.len(),
                            connections = payload.connections.len(),
                            "graph payload loaded"
                        );
                        transition = Some(Self::ready_state(payload, self.config));
                    }
                    Ok(Err(error)) => {
                        warn!(%error, "failed to load graph payload");
                        transition = Some(AppState::Error(error));
                    }
                    Err(mpsc::TryRecvError::Empty) => ctx.request_repaint(),
                    Err(mpsc::TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading market graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load market graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.payload_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &self.payload_path, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start_load(self.payload_path.clone()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    /// Bounds are replaced by the canvas size on the first frame.
    const INITIAL_BOUNDS: (f32, f32) = (1200.0, 800.0);

    fn new(payload: GraphPayload, config: AppConfig) -> Result<Self, ConfigurationError> {
        let (width, height) = Self::INITIAL_BOUNDS;
        let mut simulation = Simulation::initialize(
            payload.nodes,
            payload.connections,
            Bounds::new(width, height)?,
            config.simulation,
        )?;

        let thresholds = DatasetThresholds::from_simulation(&simulation);
        let report = simulation.bind_report();
        if report.duplicate_nodes > 0 || report.dangling_edges > 0 {
            warn!(
                duplicate_nodes = report.duplicate_nodes,
                dangling_edges = report.dangling_edges,
                "dropped graph elements while binding"
            );
        }

        let corrected_total = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&corrected_total);
        simulation.subscribe(move |tick| {
            if tick.corrected > 0 {
                counter.set(counter.get() + tick.corrected);
            }
        });

        Ok(Self {
            simulation,
            thresholds,
            encoding: config.encoding,
            viewport: Viewport::new(config.viewport)?,
            frame: Frame::default(),
            search: String::new(),
            selected: None,
            hovered: None,
            dragging: None,
            live_simulation: true,
            last_tick: TickReport::default(),
            corrected_total,
            search_match_cache: None,
            view_scratch: ViewScratch::default(),
        })
    }
}
