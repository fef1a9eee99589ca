// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Composition canvas.
//!
//! This module draws the background image and every text field on top of
//! it, and turns pointer interaction into [`CanvasAction`]s. Field positions
//! come from the drag handles while a drag is in progress.

use crate::drag::DragSync;
use crate::export::raster::STROKE_WIDTH;
use crate::models::{composition::Composition, field::FieldId, field::TextField};
use crate::util::geometry::ImageTransform;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// A drag began on a field; carries the movement of that first frame and
    /// the field's extent.
    PressField(FieldId, (f32, f32), (f32, f32)),
    /// Field dragged by a delta in image pixels; carries its current extent.
    DragField(FieldId, (f32, f32), (f32, f32)),
    ReleaseField(FieldId),
    /// Field clicked without dragging.
    SelectField(FieldId),
    /// Background clicked.
    ClearSelection,
}

/// egui font family registered for a field's typeface.
pub fn font_family(field: &TextField) -> egui::FontFamily {
    egui::FontFamily::Name(field.font.resource_name().into())
}

fn to_color32(field: &TextField) -> egui::Color32 {
    egui::Color32::from_rgb(field.color.r, field.color.g, field.color.b)
}

/// Display the composition and handle pointer interactions.
pub fn show(
    ui: &mut egui::Ui,
    composition: &Composition,
    drag: &DragSync,
    image_texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size() - egui::vec2(0.0, 24.0);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some(size)) = (image_texture, image_size) else {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        };

        let available = ui.available_size();
        let area = ui.min_rect().min;
        let transform = ImageTransform::fit(size, (area.x, area.y), (available.x, available.y));
        let image_rect = egui::Rect::from_min_size(
            egui::pos2(transform.origin_x, transform.origin_y),
            egui::vec2(size.0 as f32 * transform.scale, size.1 as f32 * transform.scale),
        );

        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        // Fields are interacted with after the background so they win hit tests.
        let background = ui.allocate_rect(image_rect, egui::Sense::click());
        if background.clicked() {
            action = CanvasAction::ClearSelection;
        }

        let painter = ui.painter_at(image_rect);
        let stroke = (STROKE_WIDTH * transform.scale).max(1.0);

        for field in composition.fields() {
            let position = drag.live_position(field.id).unwrap_or(field.position);
            let (sx, sy) = transform.to_screen(position);
            let screen_pos = egui::pos2(sx, sy);
            let font_id = egui::FontId::new(
                (field.size as f32 * transform.scale).max(1.0),
                font_family(field),
            );

            let outline =
                painter.layout_no_wrap(field.text.clone(), font_id.clone(), egui::Color32::BLACK);
            for (dx, dy) in [
                (-1.0, -1.0),
                (0.0, -1.0),
                (1.0, -1.0),
                (-1.0, 0.0),
                (1.0, 0.0),
                (-1.0, 1.0),
                (0.0, 1.0),
                (1.0, 1.0),
            ] {
                painter.galley(
                    screen_pos + egui::vec2(dx * stroke, dy * stroke),
                    outline.clone(),
                    egui::Color32::BLACK,
                );
            }
            let fill = painter.layout_no_wrap(field.text.clone(), font_id, to_color32(field));
            let text_rect = egui::Rect::from_min_size(screen_pos, fill.size());
            painter.galley(screen_pos, fill, to_color32(field));

            if composition.active() == Some(field.id) {
                let r = text_rect.expand(4.0);
                let corners = [
                    r.left_top(),
                    r.right_top(),
                    r.right_bottom(),
                    r.left_bottom(),
                    r.left_top(),
                ];
                painter.extend(egui::Shape::dashed_line(
                    &corners,
                    egui::Stroke::new(1.5, egui::Color32::WHITE),
                    6.0,
                    4.0,
                ));
            }

            let response = ui.interact(
                text_rect,
                ui.id().with(("field", field.id.0)),
                egui::Sense::click_and_drag(),
            );
            let extent = (
                text_rect.width() / transform.scale.max(f32::EPSILON),
                text_rect.height() / transform.scale.max(f32::EPSILON),
            );

            let delta = response.drag_delta();
            let delta = transform.delta_to_image(delta.x, delta.y);

            if response.drag_started() {
                action = CanvasAction::PressField(field.id, delta, extent);
            } else if response.drag_stopped() {
                action = CanvasAction::ReleaseField(field.id);
            } else if response.dragged() {
                action = CanvasAction::DragField(field.id, delta, extent);
            } else if response.clicked() {
                action = CanvasAction::SelectField(field.id);
            }

            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
            }
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Fields: {}", composition.len()));
        ui.separator();
        match composition.active_field() {
            Some(field) => ui.label(format!("Selected: {:?}", field.text)),
            None => ui.label("No selection"),
        };
        if let Some((w, h)) = image_size {
            ui.separator();
            ui.label(format!("{}x{}", w, h));
        }
    });

    action
}
