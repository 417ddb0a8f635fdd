use eframe::egui::{self, PointerButton, Rect, Ui};
use tracing::debug;

use super::super::{ViewModel, ViewScratch};
use super::super::render_utils::circle_visible;

impl ViewModel {
    /// Scroll zoom keeps the layout point under the cursor in place.
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.viewport.zoom_at(pointer - rect.left_top(), zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.viewport.pan_by(response.drag_delta());
        }
    }

    /// Primary drag on a node pins it under the cursor while the rest of the
    /// layout keeps relaxing around it.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if response.drag_started_by(PointerButton::Primary) {
            self.dragging = self.hovered;
        }
        if response.drag_stopped() {
            self.dragging = None;
            return;
        }

        let Some(index) = self.dragging else {
            return;
        };
        if !response.dragged_by(PointerButton::Primary) {
            return;
        }
        let Some(pointer) = ui.input(|input| input.pointer.interact_pos()) else {
            return;
        };

        let world = self
            .viewport
            .transform()
            .screen_to_world(rect.left_top(), pointer);
        let Some(id) = self.simulation.nodes().get(index).map(|node| node.id.clone()) else {
            self.dragging = None;
            return;
        };
        if !self.simulation.set_position(&id, world) {
            debug!(%id, "ignored drag to a non-finite position");
        }
    }

    pub(in crate::app) fn handle_graph_click(&mut self, response: &egui::Response) {
        if response.clicked_by(PointerButton::Primary) {
            self.selected = self.hovered;
        }
    }

    pub(in crate::app) fn visible_indices_into(&mut self, rect: Rect) {
        let ViewScratch {
            screen_positions,
            screen_radii,
            visible_indices,
        } = &mut self.view_scratch;
        visible_indices.clear();
        visible_indices.extend((0..screen_positions.len()).filter(|&index| {
            circle_visible(rect, screen_positions[index], screen_radii[index])
        }));
    }

    /// Closest visible node whose disc contains the pointer.
    pub(in crate::app) fn update_hovered(&mut self, ui: &Ui) {
        if self.dragging.is_some() {
            self.hovered = self.dragging;
            return;
        }

        let scratch = &self.view_scratch;
        let pointer_pos = ui.input(|input| input.pointer.hover_pos());
        self.hovered = pointer_pos.and_then(|pointer| {
            scratch
                .visible_indices
                .iter()
                .filter_map(|&index| {
                    let distance = scratch.screen_positions[index].distance(pointer);
                    (distance <= scratch.screen_radii[index]).then_some((index, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index)
        });
    }
}
