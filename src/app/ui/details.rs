use eframe::egui::{self, Color32, RichText, Ui};

use crate::graph::{NodeKind, TopologyMode};
use crate::people::Person;

use super::super::ViewModel;

struct RelatedEntry {
    id: String,
    label: String,
    color: Color32,
    detail: Option<String>,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node to see who it is and how it is connected.");
            return;
        };

        let Some(index) = self.output.node_index(&selected_id) else {
            ui.label("The selected node is not part of the current graph.");
            return;
        };
        let node = &self.output.nodes[index];

        ui.label(RichText::new(node.label.as_str()).strong().color(node.color));
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        match &node.kind {
            NodeKind::Entity { entity } => {
                if let Some(group) = &node.group_label {
                    let membership = if node.featured { "" } else { " (not a colored group)" };
                    ui.label(format!("{}: {group}{membership}", self.output.dimension.label()));
                }
                if !node.secondary_colors.is_empty() {
                    ui.label(format!("Member of {} colored groups", node.secondary_colors.len()));
                }
                ui.separator();
                draw_person(ui, entity);
            }
            NodeKind::Group { key, members } => {
                ui.label(format!("{members} people in this {}", self.output.dimension.label().to_lowercase()));
                ui.small(format!("key: {key}"));
            }
        }

        ui.separator();
        let related = self.related_entries(index);
        ui.label(RichText::new(format!("Connections ({})", related.len())).strong());
        if related.is_empty() {
            ui.label("No connections in the current graph.");
            return;
        }

        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("related_nodes_scroll")
            .max_height(320.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in &related {
                    ui.horizontal(|ui| {
                        ui.colored_label(entry.color, "●");
                        let link = ui.link(entry.label.as_str());
                        let link = match &entry.detail {
                            Some(detail) => link.on_hover_text(detail.as_str()),
                            None => link,
                        };
                        if link.clicked() {
                            next_selection = Some(entry.id.clone());
                        }
                    });
                }
            });

        if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }

    /// Neighbors of `index`, strongest pairwise similarity first.
    fn related_entries(&self, index: usize) -> Vec<RelatedEntry> {
        let selected = &self.output.nodes[index];
        let selected_person = selected.entity().map(|person| person.id.trim());

        let mut related = self
            .output
            .neighbors(index)
            .into_iter()
            .filter_map(|neighbor| self.output.nodes.get(neighbor))
            .map(|node| {
                let connection = match (self.output.mode, selected_person, node.entity()) {
                    (TopologyMode::Pairwise, Some(a), Some(b)) => {
                        let b = b.id.trim();
                        self.output.connections.iter().find(|connection| {
                            (connection.a == a && connection.b == b) || (connection.a == b && connection.b == a)
                        })
                    }
                    _ => None,
                };
                let strength = connection.map_or(0.0, |connection| connection.strength);
                let detail = connection.map(|connection| {
                    format!(
                        "similarity {:.2}, shared: {}",
                        connection.strength,
                        connection.shared.join(", ")
                    )
                });
                (
                    strength,
                    RelatedEntry {
                        id: node.id.clone(),
                        label: node.label.clone(),
                        color: node.color,
                        detail,
                    },
                )
            })
            .collect::<Vec<_>>();

        related.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.label.cmp(&b.1.label)));
        related.into_iter().map(|(_, entry)| entry).collect()
    }
}

fn draw_person(ui: &mut Ui, person: &Person) {
    if let Some(headline) = person.headline.as_deref().filter(|text| !text.trim().is_empty()) {
        ui.label(headline);
    }

    if let Some(location) = &person.location {
        let place = [location.city_name.as_deref(), location.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>();
        if !place.is_empty() {
            ui.label(format!("Location: {}", place.join(", ")));
        }
    }

    if !person.education.is_empty() {
        ui.add_space(4.0);
        ui.label(RichText::new("Education").strong());
        for record in person.education_by_recency() {
            let mut line = record.school_name.clone();
            if let Some(degree) = record.degree.as_deref().filter(|degree| !degree.is_empty()) {
                line.push_str(&format!(", {degree}"));
            }
            match record.end {
                Some(end) => line.push_str(&format!(" ({end})")),
                None => line.push_str(" (ongoing)"),
            }
            ui.label(line);
        }
    }

    if !person.companies.is_empty() {
        ui.add_space(4.0);
        ui.label(RichText::new("Companies").strong());
        for employer in &person.companies {
            let name = if employer.name.trim().is_empty() {
                employer.key.as_str()
            } else {
                employer.name.as_str()
            };
            ui.label(name);
        }
    }

    if !person.skills.is_empty() {
        ui.add_space(4.0);
        ui.label(RichText::new("Skills").strong());
        ui.label(person.skills.join(", "));
    }
}
