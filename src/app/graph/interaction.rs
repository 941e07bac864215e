use eframe::egui::{self, Pos2, Rect, Ui};
use tracing::debug;

use super::super::gestures::GestureOutcome;
use super::super::render_utils::screen_radius;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
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
        self.transform.zoom_at(rect.min, pointer, zoom_factor);
    }

    /// Primary drags on empty canvas pan, as do secondary and middle drags
    /// anywhere.
    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let background_drag =
            response.dragged_by(egui::PointerButton::Primary) && self.gestures.active().is_none();
        if background_drag
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.transform.pan_by(response.drag_delta());
        }
    }

    /// Pins a node while it is held, drags it with the pointer and turns a
    /// short press into a click dispatched to the node's handler.
    pub(in crate::app) fn handle_node_gestures(
        &mut self,
        ui: &Ui,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        let (pressed, released, pointer) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.interact_pos(),
            )
        });

        if pressed
            && response.hovered()
            && let Some(index) = hovered
            && let Some(pointer) = pointer
            && let Some(body) = self.simulation.bodies().get(index)
        {
            let world = body.position;
            self.gestures.pointer_down(index, pointer, world);
            self.simulation.pin(index, world);
        }

        if let Some(pointer) = pointer
            && let Some((index, target)) = self.gestures.pointer_move(pointer, &self.transform)
        {
            self.simulation.pin(index, target);
            ui.ctx().request_repaint();
        }

        if !released {
            return;
        }

        match self.gestures.pointer_up() {
            Some(GestureOutcome::Click { index }) => {
                self.simulation.unpin(index);
                if let Some(node) = self.output.nodes.get(index)
                    && !self.clicks.dispatch(node)
                {
                    debug!(id = %node.id, "no click handler registered");
                }
            }
            Some(GestureOutcome::DragEnd { index }) => {
                self.simulation.unpin(index);
            }
            None if response.clicked() && hovered.is_none() => self.set_selected(None),
            None => {}
        }
    }

    /// Topmost node under the pointer, preferring the one whose center is
    /// closest.
    pub(in crate::app) fn hovered_index(&self, ui: &Ui, origin: Pos2) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        self.simulation
            .bodies()
            .iter()
            .enumerate()
            .filter_map(|(index, body)| {
                let center = self.transform.world_to_screen(origin, body.position);
                let distance = center.distance(pointer);
                (distance <= screen_radius(body.radius, self.transform.zoom)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
