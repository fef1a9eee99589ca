// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Template gallery panel.

use crate::io::templates::Template;

/// Display the template list. Returns the template clicked this frame.
pub fn show<'a>(ui: &mut egui::Ui, templates: &'a [Template], loading: bool) -> Option<&'a Template> {
    let mut picked = None;

    ui.heading("Templates");
    ui.separator();

    if loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Fetching templates...");
        });
        return None;
    }

    egui::ScrollArea::vertical()
        .id_source("template_list")
        .show(ui, |ui| {
            for template in templates {
                if ui
                    .selectable_label(false, template.name.as_str())
                    .on_hover_text(template.url.as_str())
                    .clicked()
                {
                    picked = Some(template);
                }
            }
        });

    picked
}
