// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the common composition actions.

/// Button pressed on the toolbar this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    UploadImage,
    AddText,
    DeleteSelected,
    Export,
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, has_selection: bool, export_pending: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("🖼 Upload Image").clicked() {
            action = ToolbarAction::UploadImage;
        }

        ui.separator();

        if ui.button("✚ Add Text").clicked() {
            action = ToolbarAction::AddText;
        }

        if ui
            .add_enabled(has_selection, egui::Button::new("🗑 Delete"))
            .clicked()
        {
            action = ToolbarAction::DeleteSelected;
        }

        ui.separator();

        if ui
            .add_enabled(!export_pending, egui::Button::new("💾 Export"))
            .clicked()
        {
            action = ToolbarAction::Export;
        }

        ui.separator();

        let hint = if export_pending {
            "Exporting..."
        } else if has_selection {
            "Drag the caption to move it, edit its style on the right"
        } else {
            "Click a caption to select it, pick a template on the left"
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });

    action
}
