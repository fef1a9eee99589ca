// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Field properties panel.
//!
//! This module provides the side panel for editing the active field's text,
//! typeface, color, size and position, plus the list of all fields.

use crate::models::{
    composition::Composition,
    field::{FieldId, FieldUpdate, Font, Position, Rgb},
};

/// Size range offered by the slider. The store itself does not enforce it.
pub const SIZE_RANGE: std::ops::RangeInclusive<u32> = 10..=120;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    Update(FieldId, FieldUpdate),
    Select(FieldId),
    Delete(FieldId),
}

/// Display the properties panel. Edits are returned rather than applied so
/// the caller owns every mutation.
pub fn show(ui: &mut egui::Ui, composition: &Composition) -> Vec<PropertiesAction> {
    let mut actions = Vec::new();

    ui.heading("Text");
    ui.separator();

    match composition.active_field() {
        Some(field) => {
            let id = field.id;

            let mut text = field.text.clone();
            if ui
                .add(egui::TextEdit::multiline(&mut text).desired_rows(2))
                .changed()
            {
                actions.push(PropertiesAction::Update(id, FieldUpdate::Text(text)));
            }

            let mut font = field.font;
            egui::ComboBox::from_label("Font")
                .selected_text(font.label())
                .show_ui(ui, |ui| {
                    for choice in Font::ALL {
                        ui.selectable_value(&mut font, choice, choice.label());
                    }
                });
            if font != field.font {
                actions.push(PropertiesAction::Update(id, FieldUpdate::Font(font)));
            }

            ui.horizontal(|ui| {
                ui.label("Color");
                let mut rgb = [field.color.r, field.color.g, field.color.b];
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    actions.push(PropertiesAction::Update(
                        id,
                        FieldUpdate::Color(Rgb::new(rgb[0], rgb[1], rgb[2])),
                    ));
                }
                ui.label(egui::RichText::new(field.color.to_hex()).monospace().weak());
            });

            let mut size = field.size;
            if ui
                .add(egui::Slider::new(&mut size, SIZE_RANGE).text("Size"))
                .changed()
            {
                actions.push(PropertiesAction::Update(id, FieldUpdate::Size(size)));
            }

            ui.horizontal(|ui| {
                let mut x = field.position.x;
                let mut y = field.position.y;
                ui.label("X");
                let dx = ui.add(egui::DragValue::new(&mut x).speed(1.0));
                ui.label("Y");
                let dy = ui.add(egui::DragValue::new(&mut y).speed(1.0));
                if dx.changed() || dy.changed() {
                    actions.push(PropertiesAction::Update(
                        id,
                        FieldUpdate::Position(Position::new(x, y)),
                    ));
                }
            });

            ui.add_space(6.0);
            if ui.button("Delete").clicked() {
                actions.push(PropertiesAction::Delete(id));
            }
        }
        None => {
            ui.label(egui::RichText::new("Select a caption to edit it").weak());
        }
    }

    ui.add_space(12.0);
    ui.heading("Captions");
    ui.separator();

    egui::ScrollArea::vertical()
        .id_source("field_list")
        .show(ui, |ui| {
            if composition.is_empty() {
                ui.label(egui::RichText::new("No captions yet").weak());
            }
            for field in composition.fields() {
                let selected = composition.active() == Some(field.id);
                let label = if field.text.trim().is_empty() {
                    "(empty)".to_string()
                } else {
                    field.text.lines().next().unwrap_or_default().to_string()
                };
                if ui.selectable_label(selected, label).clicked() {
                    actions.push(PropertiesAction::Select(field.id));
                }
            }
        });

    actions
}
