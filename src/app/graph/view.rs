use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::NodeKind;

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, edge_visible, label_color, screen_radius,
    with_opacity,
};
use super::super::{SearchMatchCache, ViewModel};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    /// Entity nodes whose label fuzzily matches the search box.
    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .output
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.is_group())
            .filter_map(|(index, node)| fuzzy_match_score(&matcher, &node.label, query).map(|_| index))
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.simulation.set_viewport(rect.size());
        draw_background(&painter, rect, &self.transform, self.simulation.viewport());

        if self.output.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nobody matched the current dimension and filters.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        let hovered = self.hovered_index(ui, rect.min);
        self.handle_node_gestures(ui, &response, hovered);
        self.handle_graph_pan(&response);
        self.drain_clicks();

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.gestures.is_dragging() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::PointingHand
                };
            });
        }

        if self.live_physics {
            let dt = ui.ctx().input(|input| input.stable_dt).clamp(1.0 / 240.0, 1.0 / 20.0);
            if self.simulation.step(dt) {
                ui.ctx().request_repaint();
            }
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches.as_ref().is_some_and(|matches| !matches.is_empty());
        let selected_index = self.selected.as_deref().and_then(|id| self.output.node_index(id));
        let neighbors = selected_index
            .map(|index| self.output.neighbors(index).into_iter().collect::<HashSet<_>>())
            .unwrap_or_default();

        let zoom = self.transform.zoom;
        let screen_positions = self
            .simulation
            .bodies()
            .iter()
            .map(|body| self.transform.world_to_screen(rect.min, body.position))
            .collect::<Vec<Pos2>>();

        for edge in &self.output.edges {
            let (Some(&start), Some(&end)) =
                (screen_positions.get(edge.source), screen_positions.get(edge.target))
            else {
                continue;
            };
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let touches_selection =
                selected_index.is_some_and(|index| edge.source == index || edge.target == index);
            let color = if touches_selection {
                blend_color(edge.color, SELECTED_COLOR, 0.35)
            } else if selected_index.is_some() {
                with_opacity(dim_color(edge.color, 0.5), edge.opacity * 0.4)
            } else {
                with_opacity(edge.color, edge.opacity)
            };
            let width = edge.width * zoom.sqrt().clamp(0.5, 2.0) * if touches_selection { 1.4 } else { 1.0 };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        // groups first so people are drawn on top of them
        let draw_order = self
            .output
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_group())
            .chain(self.output.nodes.iter().enumerate().filter(|(_, node)| !node.is_group()))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        let mut selection_animating = false;
        for index in draw_order {
            let node = &self.output.nodes[index];
            let (Some(&position), Some(body)) = (screen_positions.get(index), self.simulation.bodies().get(index))
            else {
                continue;
            };
            let radius = screen_radius(body.radius, zoom);
            if !circle_visible(rect, position, radius + 8.0) {
                continue;
            }

            let is_selected = selected_index == Some(index);
            let is_neighbor = neighbors.contains(&index);
            let is_hovered = hovered == Some(index);
            let is_match = search_matches.as_ref().is_some_and(|matches| matches.contains(&index));

            let base_color = if is_hovered {
                blend_color(node.color, Color32::WHITE, 0.25)
            } else if is_match {
                blend_color(node.color, SEARCH_COLOR, 0.55)
            } else if selected_index.is_some() && !is_selected && !is_neighbor {
                dim_color(node.color, 0.45)
            } else if search_active {
                dim_color(node.color, 0.4)
            } else {
                node.color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-selection", node.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }
            let fill = blend_color(base_color, SELECTED_COLOR, selection_mix * 0.5);

            painter.circle_filled(position, radius, fill);
            for (ring, color) in node.secondary_colors.iter().enumerate() {
                painter.circle_stroke(
                    position,
                    radius + 2.0 + ring as f32 * 2.5,
                    Stroke::new(2.0, *color),
                );
            }

            let outline = if node.featured {
                Color32::from_rgba_unmultiplied(15, 15, 15, 190)
            } else {
                Color32::from_rgba_unmultiplied(15, 15, 15, 120)
            };
            painter.circle_stroke(position, radius, Stroke::new(1.0 + selection_mix * 1.5, outline));
            if selection_mix > 0.0 {
                let halo = radius + 4.0 + node.secondary_colors.len() as f32 * 2.5;
                painter.circle_stroke(
                    position,
                    halo + (1.0 - selection_mix) * 6.0,
                    Stroke::new(1.5, with_opacity(SELECTED_COLOR, selection_mix * 0.8)),
                );
            }

            if node.is_group() {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    &node.label,
                    FontId::proportional((11.0 * zoom.sqrt()).clamp(9.0, 16.0)),
                    label_color(fill),
                );
                continue;
            }

            let should_draw_label =
                is_selected || is_hovered || is_neighbor || (is_match && zoom > 0.5) || zoom > 1.4;
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &node.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(index) = hovered
            && let Some(&position) = screen_positions.get(index)
        {
            self.draw_hover_card(&painter, rect, position, index);
        }
    }

    fn draw_hover_card(&self, painter: &egui::Painter, rect: egui::Rect, anchor: Pos2, index: usize) {
        let Some(node) = self.output.nodes.get(index) else {
            return;
        };

        let mut lines = vec![node.label.clone()];
        if let Some(person) = node.entity() {
            if let Some(headline) = person.headline.as_deref().filter(|text| !text.trim().is_empty()) {
                lines.push(headline.to_owned());
            }
            if let Some(group) = &node.group_label {
                let suffix = if node.featured { "" } else { " (other)" };
                lines.push(format!("{}: {group}{suffix}", self.output.dimension.label()));
            }
        } else if let NodeKind::Group { members, .. } = &node.kind {
            lines.push(format!("{members} people"));
        }
        lines.push(format!("{} connections", self.output.neighbors(index).len()));

        let galley = painter.layout_no_wrap(lines.join("\n"), FontId::proportional(12.5), Color32::from_gray(240));
        let mut top_left = anchor + vec2(14.0, 14.0);
        if top_left.x + galley.size().x + 12.0 > rect.right() {
            top_left.x = anchor.x - galley.size().x - 20.0;
        }
        if top_left.y + galley.size().y + 12.0 > rect.bottom() {
            top_left.y = anchor.y - galley.size().y - 20.0;
        }

        let card = egui::Rect::from_min_size(top_left, galley.size()).expand(6.0);
        painter.rect_filled(card, 4.0, Color32::from_rgba_unmultiplied(28, 33, 41, 235));
        painter.galley(top_left, galley, Color32::from_gray(240));
    }
}
