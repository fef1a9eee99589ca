// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module owns the composition and coordinates the loaders, the drag
//! handles and the export pipeline with the UI panels. Every mutation of the
//! composition happens here in response to an action returned by a panel.

use crate::config::Config;
use crate::drag::{Bounds, DragEvent, DragSync};
use crate::error::MemeError;
use crate::export::pipeline::{self, ExportPipeline, ExportTarget};
use crate::export::raster::FontBook;
use crate::io::media::{self, LoadedImage};
use crate::io::resources::{ResourceLoader, ResourceSpec};
use crate::io::templates::{self, Template};
use crate::models::{
    composition::{BackgroundSource, Composition},
    field::{FieldDefaults, FieldId, Font},
};
use crate::ui::{canvas, gallery, properties, toolbar};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Finished background load, tagged with the generation it was started for.
type BackgroundResult = (u64, LoadedImage);

/// Main application state.
pub struct MemeApp {
    config: Config,

    /// The meme being composed
    composition: Composition,

    /// Drag handles mirroring the composition's fields
    drag: DragSync,

    export: ExportPipeline,

    /// Typeface loader; the UI waits on it
    resources: ResourceLoader,

    /// Typefaces parsed for export
    fonts: FontBook,

    /// Whether egui has been given the typefaces
    fonts_installed: bool,

    templates: Vec<Template>,
    template_loader: Option<Receiver<crate::error::Result<Vec<Template>>>>,

    /// Decoded background and its texture
    background: Option<LoadedImage>,
    image_texture: Option<egui::TextureHandle>,

    /// Receiver for background image loading
    background_loader: Option<Receiver<BackgroundResult>>,

    /// Generation of the background most recently requested
    requested_generation: Option<u64>,
}

/// Apply the configured caption style overrides to one field.
fn apply_caption_style(config: &Config, composition: &mut Composition, id: FieldId) {
    for (key, value) in &config.caption_style {
        composition.update_attribute(id, key, value);
    }
}

impl MemeApp {
    /// Create the application, starting the typeface, template and
    /// background loads.
    pub fn new(config: Config) -> Self {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let mut composition = Composition::with_seed_fields(BackgroundSource::Remote(
            config.default_background.clone(),
        ));
        let seeds: Vec<FieldId> = composition.fields().iter().map(|f| f.id).collect();
        for id in seeds {
            apply_caption_style(&config, &mut composition, id);
        }

        let mut resources = ResourceLoader::new(timeout);
        let mut fonts = FontBook::new();
        for font in Font::ALL {
            let Some(path) = config.local_font(font) else {
                continue;
            };
            match std::fs::read(&path) {
                Ok(bytes) => {
                    log::info!("Using local typeface {}", path.display());
                    if let Err(e) = fonts.load(font, &bytes) {
                        log::error!("{}", e);
                    }
                    resources.mark_present(font.resource_name(), bytes);
                }
                Err(e) => log::warn!("Cannot read {}: {}", path.display(), e),
            }
        }
        let specs: Vec<ResourceSpec> = Font::ALL
            .into_iter()
            .filter_map(|font| {
                config
                    .font_source(font)
                    .map(|source| ResourceSpec::new(font.resource_name(), source))
            })
            .collect();
        resources.ensure_loaded(&specs);

        let template_loader = Some(templates::spawn_fetch(
            config.template_endpoint.clone(),
            timeout,
        ));

        let mut app = Self {
            config,
            composition,
            drag: DragSync::new(),
            export: ExportPipeline::new(),
            resources,
            fonts,
            fonts_installed: false,
            templates: Vec::new(),
            template_loader,
            background: None,
            image_texture: None,
            background_loader: None,
            requested_generation: None,
        };
        app.load_background();
        app
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.http_timeout_secs)
    }

    /// True once every typeface is fetched, parsed and handed to egui.
    fn is_ready(&self) -> bool {
        self.resources.is_ready() && self.fonts_installed
    }

    /// Load the composition's current background (asynchronously).
    fn load_background(&mut self) {
        let (sender, receiver) = channel();
        let generation = self.composition.background_generation();
        let source = self.composition.background().clone();
        let placeholder = self.config.placeholder_image.clone();
        let timeout = self.timeout();

        self.background_loader = Some(receiver);
        self.requested_generation = Some(generation);
        self.background = None;
        self.image_texture = None;

        // Spawn background thread for loading
        std::thread::spawn(move || {
            let img = media::load_background_or_placeholder(&source, &placeholder, timeout);
            let _ = sender.send((generation, img));
        });
    }

    /// Parse newly fetched typefaces and, once all are in, install them.
    fn poll_resources(&mut self, ctx: &egui::Context) {
        for (name, bytes) in self.resources.poll() {
            let Some(font) = Font::ALL.into_iter().find(|f| f.resource_name() == name) else {
                continue;
            };
            if let Err(e) = self.fonts.load(font, &bytes) {
                log::error!("{}", e);
            }
        }

        if !self.fonts_installed
            && self.resources.is_ready()
            && self.fonts.len() == Font::ALL.len()
        {
            self.install_fonts(ctx);
        }
    }

    fn install_fonts(&mut self, ctx: &egui::Context) {
        let mut definitions = egui::FontDefinitions::default();
        let fallbacks = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .cloned()
            .unwrap_or_default();

        for font in Font::ALL {
            let Some(bytes) = self.resources.bytes(font.resource_name()) else {
                continue;
            };
            let key = font.resource_name().to_string();
            definitions
                .font_data
                .insert(key.clone(), egui::FontData::from_owned(bytes.to_vec()));

            let mut family = vec![key];
            family.extend(fallbacks.iter().cloned());
            definitions
                .families
                .insert(egui::FontFamily::Name(font.resource_name().into()), family);
        }

        ctx.set_fonts(definitions);
        self.fonts_installed = true;
        log::info!("Installed {} typefaces", Font::ALL.len());
    }

    fn poll_templates(&mut self) {
        let Some(ref receiver) = self.template_loader else {
            return;
        };
        if let Ok(result) = receiver.try_recv() {
            self.template_loader = None;
            match result {
                Ok(templates) => {
                    log::info!("Fetched {} templates", templates.len());
                    self.templates = templates;
                }
                Err(e) => log::error!("Template gallery unavailable: {}", e),
            }
        }
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        if let Some(ref receiver) = self.background_loader {
            if let Ok((generation, loaded)) = receiver.try_recv() {
                self.background_loader = None;

                // A newer background was selected while this one loaded.
                if Some(generation) != self.requested_generation {
                    return;
                }

                // The texture may be smaller than the image; export uses `loaded`.
                let max_side = ctx.input(|i| i.max_texture_side);
                let resized = loaded.downscaled_to(u32::try_from(max_side).unwrap_or(u32::MAX));
                if let Some(ref shown) = resized {
                    log::info!(
                        "Background {}x{} shown at {}x{}",
                        loaded.width,
                        loaded.height,
                        shown.width,
                        shown.height
                    );
                }
                let shown = resized.as_ref().unwrap_or(&loaded);
                let size = [shown.width as usize, shown.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &shown.pixels);
                self.image_texture = Some(ctx.load_texture(
                    "background",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
                self.background = Some(loaded);
            }
        }

        if self.requested_generation != Some(self.composition.background_generation()) {
            self.load_background();
        }
    }

    fn set_background(&mut self, source: BackgroundSource) {
        self.composition.set_background(source);
        self.load_background();
    }

    /// Pick a local file and use it as the background. No type check is
    /// made; files that do not decode end up showing the placeholder.
    fn upload_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png", "gif", "bmp", "webp"])
            .add_filter("All files", &["*"])
            .pick_file()
        else {
            return;
        };

        match media::upload_file(&path) {
            Ok(source) => self.set_background(source),
            Err(e) => log::error!("Failed to read {}: {:#}", path.display(), e),
        }
    }

    fn add_text(&mut self) {
        let id = self.composition.add_field(FieldDefaults::default());
        apply_caption_style(&self.config, &mut self.composition, id);
    }

    fn delete_selected(&mut self) {
        if let Some(id) = self.composition.active() {
            self.composition.remove_field(id);
        }
    }

    fn request_export(&mut self, target: ExportTarget) {
        log::info!("Export requested to {:?}", target);
        self.export.request(&mut self.composition, target);
    }

    fn export_as(&mut self) {
        let name = pipeline::export_file_name(pipeline::now_ms());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(name)
            .save_file()
        {
            self.request_export(ExportTarget::Path(path));
        }
    }

    fn run_capture(&self, target: ExportTarget) {
        let Some(ref background) = self.background else {
            log::error!("{}", MemeError::Capture("no background loaded".into()));
            return;
        };
        if let Err(e) = pipeline::capture(&self.composition, background, &self.fonts, &target) {
            log::error!("{}", e);
        }
    }

    fn handle_drag_event(&mut self, event: Option<DragEvent>) {
        if let Some(event) = event {
            DragSync::apply(event, &mut self.composition);
        }
    }

    fn show_loading(ctx: &egui::Context, message: &str) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.spinner();
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new(message)
                            .size(16.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
        });
        ctx.request_repaint();
    }
}

impl eframe::App for MemeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Fonts registered this frame only take effect on the next one.
        let was_ready = self.is_ready();
        self.poll_resources(ctx);
        if !was_ready {
            // Stays here forever if a typeface failed to load.
            let failures = self.resources.failures();
            let message = if failures.is_empty() {
                "Loading fonts...".to_string()
            } else {
                let names: Vec<String> = failures
                    .iter()
                    .map(|(name, reason)| format!("{name}: {reason}"))
                    .collect();
                format!("Could not load fonts\n{}", names.join("\n"))
            };
            Self::show_loading(ctx, &message);
            return;
        }

        self.poll_templates();
        self.poll_background(ctx);

        if self.template_loader.is_some()
            || self.background_loader.is_some()
            || self.export.is_pending()
        {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Upload Image...").clicked() {
                        self.upload_image();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Export").clicked() {
                        self.request_export(ExportTarget::Directory(
                            self.config.export_dir.clone(),
                        ));
                        ui.close_menu();
                    }
                    if ui.button("Export As...").clicked() {
                        self.export_as();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.button("Add Text").clicked() {
                        self.add_text();
                        ui.close_menu();
                    }
                    let has_selection = self.composition.active().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        self.delete_selected();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Deselect (Esc)"))
                        .clicked()
                    {
                        self.composition.set_active(None);
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(
                    ui,
                    self.composition.active().is_some(),
                    self.export.is_pending(),
                )
            })
            .inner;

        match toolbar_action {
            toolbar::ToolbarAction::UploadImage => self.upload_image(),
            toolbar::ToolbarAction::AddText => self.add_text(),
            toolbar::ToolbarAction::DeleteSelected => self.delete_selected(),
            toolbar::ToolbarAction::Export => {
                self.request_export(ExportTarget::Directory(self.config.export_dir.clone()))
            }
            toolbar::ToolbarAction::None => {}
        }

        // Template gallery (left side)
        let picked = egui::SidePanel::left("gallery")
            .default_width(220.0)
            .show(ctx, |ui| {
                gallery::show(ui, &self.templates, self.template_loader.is_some()).cloned()
            })
            .inner;

        if let Some(template) = picked {
            log::info!("Selected template {} ({})", template.name, template.id);
            self.set_background(BackgroundSource::Remote(template.url));
        }

        // Properties panel (right side)
        let property_actions = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| properties::show(ui, &self.composition))
            .inner;

        for action in property_actions {
            match action {
                properties::PropertiesAction::Update(id, update) => {
                    self.composition.update_field(id, update);
                }
                properties::PropertiesAction::Select(id) => {
                    self.composition.set_active(Some(id));
                }
                properties::PropertiesAction::Delete(id) => {
                    self.composition.remove_field(id);
                }
            }
        }

        // Handle keyboard events
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.composition.set_active(None);
        }

        // Only delete when no text field is focused
        if !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
        {
            self.delete_selected();
        }

        // Keep drag handles in line with the fields before drawing them
        if let Some(ref background) = self.background {
            let bounds = Bounds::new(background.width as f32, background.height as f32);
            if self.drag.sync(&self.composition, bounds) {
                log::debug!(
                    "Drag handles rebuilt: {} attached, {} released so far",
                    self.drag.attached(),
                    self.drag.released_total()
                );
            }
        }

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    &self.composition,
                    &self.drag,
                    &self.image_texture,
                    self.background.as_ref().map(|b| (b.width, b.height)),
                )
            })
            .inner;

        match canvas_action {
            canvas::CanvasAction::PressField(id, delta, extent) => {
                let origin = self.composition.field(id).map(|f| f.position);
                if let Some(origin) = origin {
                    let event = self.drag.begin(id, origin, delta, extent);
                    self.handle_drag_event(event);
                }
            }
            canvas::CanvasAction::DragField(id, delta, extent) => {
                self.drag.drag(id, delta, extent);
            }
            canvas::CanvasAction::ReleaseField(id) => {
                let event = self.drag.release(id);
                self.handle_drag_event(event);
            }
            canvas::CanvasAction::SelectField(id) => {
                self.handle_drag_event(Some(DragEvent::Activated(id)));
            }
            canvas::CanvasAction::ClearSelection => {
                self.composition.set_active(None);
            }
            canvas::CanvasAction::None => {}
        }

        // This frame is done; a pending export may now capture.
        if let Some(target) = self.export.on_frame_committed(&mut self.composition) {
            self.run_capture(target);
        }
    }
}
