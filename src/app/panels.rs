use eframe::egui::{self, RichText, Ui};

use page_graph::graph::rank_tags;
use page_graph::render::{node_color, palette_color};

use super::PageGraphApp;

const TAG_SUGGESTIONS: usize = 12;

impl PageGraphApp {
    pub(super) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filter");
        ui.add_space(4.0);

        let search = ui.add(
            egui::TextEdit::singleline(&mut self.search).hint_text("Search pages or tags..."),
        );
        if search.changed() {
            self.view.set_search_text(self.search.clone());
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Tags").strong());
        if self.view.available_tags().is_empty() {
            ui.label("No tags in this workspace.");
        } else {
            ui.add(egui::TextEdit::singleline(&mut self.tag_filter).hint_text("Find a tag..."));
            let suggestions = rank_tags(self.view.available_tags(), &self.tag_filter, TAG_SUGGESTIONS);
            let mut toggled = None;
            ui.horizontal_wrapped(|ui| {
                for tag in &suggestions {
                    let selected = self.view.query().selected_tags.contains(tag);
                    let text = RichText::new(tag).color(palette_color(tag));
                    if ui.selectable_label(selected, text).clicked() {
                        toggled = Some(tag.clone());
                    }
                }
            });
            if let Some(tag) = toggled {
                self.view.toggle_tag(&tag);
            }
        }

        let selected_tags = self
            .view
            .query()
            .selected_tags
            .iter()
            .cloned()
            .collect::<Vec<_>>();
        if !selected_tags.is_empty() {
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                ui.label("Active:");
                for tag in &selected_tags {
                    if ui.small_button(format!("{tag}  x")).clicked() {
                        self.view.toggle_tag(tag);
                    }
                }
            });
        }
        if !self.view.query().is_empty() && ui.button("Clear filters").clicked() {
            self.search.clear();
            self.view.clear_filters();
        }

        ui.separator();
        ui.heading("Layout");
        let mut live = self.view.config().live();
        let mut changed = false;
        changed |= ui
            .add(
                egui::Slider::new(&mut live.charge_strength, -2_000.0..=-50.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly pages push away from each other.")
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut live.link_distance, 20.0..=300.0)
                    .text("Link distance")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut live.link_strength, 0.0..=1.0)
                    .text("Link strength")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut live.node_size_floor, 4.0..=40.0)
                    .text("Node size")
                    .clamping(egui::SliderClamping::Always),
            )
            .changed();
        changed |= ui.checkbox(&mut live.show_labels, "Show labels").changed();
        if changed {
            self.view.set_live(live);
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.view.zoom_in(self.viewport);
            }
            if ui.button("Zoom out").clicked() {
                self.view.zoom_out(self.viewport);
            }
            if ui.button("Reset view").clicked() {
                self.view.reset_view();
            }
        });
    }

    pub(super) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selected page");
        ui.add_space(6.0);

        let Some(details) = self.view.selected_details() else {
            ui.label("Click a node to select it.");
            return;
        };
        let color_by = self.view.config().color_by;
        let node = details.node;

        ui.label(RichText::new(&node.label).strong().color(node_color(node, color_by)));
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Category: {}", node.category));
        ui.label(format!("Connections: {}", details.connections));
        if node.tags.is_empty() {
            ui.label("No tags");
        } else {
            ui.horizontal_wrapped(|ui| {
                for tag in &node.tags {
                    ui.label(RichText::new(tag).color(palette_color(tag)));
                }
            });
        }
    }
}
