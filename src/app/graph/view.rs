use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, vec2};
use market_graph::frame::encode_frame;
use tracing::debug;

use super::super::ViewModel;
use super::super::render_utils::{blend_color, dim_color, draw_background, edge_visible};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    /// Keeps the simulation's centering target at the middle of the canvas.
    fn sync_bounds(&mut self, rect: Rect) {
        let size = rect.size();
        if size.x < 1.0 || size.y < 1.0 {
            return;
        }
        if let Err(error) = self.simulation.resize(size.x, size.y) {
            debug!(%error, "skipping canvas resize");
        }
    }

    fn advance_simulation(&mut self, ui: &Ui) {
        if !self.live_simulation || self.simulation.is_settled() {
            return;
        }

        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        self.last_tick = self.simulation.step(frame_delta_seconds);
    }

    fn update_screen_space(&mut self, rect: Rect) {
        let transform = self.frame.transform;
        let scratch = &mut self.view_scratch;

        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &self.frame.nodes {
            scratch
                .screen_positions
                .push(transform.world_to_screen(rect.left_top(), node.position));
            scratch
                .screen_radii
                .push((node.radius * transform.scale.powf(0.40)).clamp(2.0, 48.0));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.sync_bounds(rect);
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_node_drag(ui, rect, &response);
        self.advance_simulation(ui);

        self.frame = encode_frame(
            &self.simulation,
            &self.thresholds,
            &self.encoding,
            &self.viewport,
        );
        draw_background(&painter, rect, self.frame.transform);

        if self.frame.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "The payload contains no markets.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.update_screen_space(rect);
        self.visible_indices_into(rect);
        self.update_hovered(ui);
        self.handle_graph_click(&response);

        if self.hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let zoom_sqrt = self.frame.transform.scale.sqrt();
        let positions = &self.view_scratch.screen_positions;

        for edge in &self.frame.edges {
            let start = positions[edge.source];
            let end = positions[edge.target];
            if !edge_visible(rect, start, end, edge.width) {
                continue;
            }

            let touches_selection = self
                .selected
                .is_some_and(|selected| selected == edge.source || selected == edge.target);
            let (width, color) = if touches_selection {
                (
                    (edge.width * zoom_sqrt).clamp(1.2, 6.0),
                    blend_color(edge.color, SELECTED_COLOR, 0.8),
                )
            } else if self.selected.is_some() {
                ((edge.width * zoom_sqrt).clamp(0.3, 6.0), dim_color(edge.color, 0.45))
            } else {
                ((edge.width * zoom_sqrt).clamp(0.3, 6.0), edge.color)
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let mut draw_order = self.view_scratch.visible_indices.clone();
        let visuals = &self.frame.nodes;
        draw_order.sort_by(|a, b| visuals[*a].radius.total_cmp(&visuals[*b].radius));

        for index in draw_order {
            let visual = &self.frame.nodes[index];
            let position = positions[index];
            let radius = self.view_scratch.screen_radii[index];

            let is_selected = self.selected == Some(index);
            let is_hovered = self.hovered == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let color = if is_hovered {
                blend_color(visual.color, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(visual.color, MATCH_COLOR, 0.6)
            } else if search_active && !is_selected {
                dim_color(visual.color, 0.38)
            } else {
                visual.color
            };

            painter.circle_filled(position, radius, color);
            let stroke = if is_selected {
                Stroke::new(2.4, SELECTED_COLOR)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, stroke);

            let should_draw_label = is_selected
                || is_hovered
                || is_match
                || radius > 16.0
                || self.frame.transform.scale > 1.6;
            if should_draw_label {
                let node = &self.simulation.nodes()[index];
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_label(node.display_name()),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = self.hovered
            && let Some(node) = self.simulation.nodes().get(index)
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  volatility {:.2} ({})  |  {} connections",
                    short_label(node.display_name()),
                    node.volatility,
                    self.frame.nodes[index].tier.label(),
                    node.connection_count
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        let moving = self.live_simulation && !self.simulation.is_settled();
        if moving || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
    }
}

/// Market questions can be long; labels keep the first few words.
fn short_label(text: &str) -> String {
    const MAX_CHARS: usize = 42;

    if text.chars().count() <= MAX_CHARS {
        return text.to_owned();
    }
    let mut label = text.chars().take(MAX_CHARS - 1).collect::<String>();
    label.push('…');
    label
}
