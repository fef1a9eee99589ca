// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Memeforge - a desktop meme composer
//!
//! Pick a template or upload an image, drop draggable, styleable captions
//! on top of it, and export the result as a PNG.

mod app;
mod config;
mod drag;
mod error;
mod export;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::MemeApp;
use config::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = Config::load();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 600.0])
            .with_title("Memeforge"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Memeforge",
        options,
        Box::new(|_cc| Ok(Box::new(MemeApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
