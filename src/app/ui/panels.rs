use std::path::Path;

use eframe::egui::{self, Align, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        payload_path: &Path,
        reload_requested: &mut bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("market-graph");
                    ui.separator();
                    ui.label(format!("payload: {}", payload_path.display()));
                    ui.label(format!("markets: {}", self.simulation.nodes().len()));
                    ui.label(format!("connections: {}", self.simulation.connections().len()));
                    if ui.button("Reload payload").clicked() {
                        *reload_requested = true;
                    }
                    ui.separator();

                    if ui.button("Zoom in").clicked() {
                        self.viewport.zoom_in();
                    }
                    if ui.button("Zoom out").clicked() {
                        self.viewport.zoom_out();
                    }
                    if ui.button("Reset view").clicked() {
                        self.viewport.reset();
                    }
                    ui.label(format!("{:.0}%", self.viewport.scale() * 100.0));
                    ui.separator();

                    ui.checkbox(&mut self.live_simulation, "Live layout").on_hover_text(
                        "Step the force simulation once per frame until it settles.",
                    );
                    if ui.button("Reheat").clicked() {
                        self.simulation.reheat();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
                ui.separator();
                self.draw_details(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn status_text(&self) -> String {
        let state = if self.simulation.is_settled() {
            "settled"
        } else if self.live_simulation {
            "relaxing"
        } else {
            "paused"
        };

        let mut text = format!(
            "{state}  |  tick {}  |  energy {:.4}  |  alpha {:.3}",
            self.simulation.tick_count(),
            self.last_tick.kinetic_energy,
            self.simulation.alpha()
        );
        let corrected = self.corrected_total.get();
        if corrected > 0 {
            text.push_str(&format!("  |  {corrected} numeric resets"));
        }
        text
    }
}
