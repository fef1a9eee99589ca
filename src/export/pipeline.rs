// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export sequencing.
//!
//! An export request clears the selection first. Capture is released only
//! after the application reports a committed frame that was rendered with no
//! active field, so the selection outline can never end up in the output.

use super::raster::{self, FontBook};
use crate::error::{MemeError, Result};
use crate::io::media::LoadedImage;
use crate::models::composition::Composition;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Where an export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// A directory; the file is named `meme-<timestamp>.png`.
    Directory(PathBuf),
    /// An explicit file path.
    Path(PathBuf),
}

impl ExportTarget {
    /// Resolve to a concrete file path using `timestamp_ms`.
    pub fn resolve(&self, timestamp_ms: u128) -> PathBuf {
        match self {
            ExportTarget::Directory(dir) => dir.join(export_file_name(timestamp_ms)),
            ExportTarget::Path(path) => path.clone(),
        }
    }
}

pub fn export_file_name(timestamp_ms: u128) -> String {
    format!("meme-{timestamp_ms}.png")
}

/// Milliseconds since the Unix epoch, used to name exports.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportState {
    Idle,
    /// Selection cleared; waiting for the frame that reflects it.
    Requested(ExportTarget),
    /// One frame has committed since the request.
    AwaitingCommit(ExportTarget),
}

#[derive(Debug)]
pub struct ExportPipeline {
    state: ExportState,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self {
            state: ExportState::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state != ExportState::Idle
    }

    /// Start an export. Clears the active field immediately. A request made
    /// while another is pending replaces its target.
    pub fn request(&mut self, composition: &mut Composition, target: ExportTarget) {
        if self.is_pending() {
            log::warn!("Export already pending, replacing target with {:?}", target);
        }
        composition.set_active(None);
        self.state = ExportState::Requested(target);
    }

    /// Report that a frame has been rendered. Returns the target once it is
    /// safe to capture.
    ///
    /// If something re-selected a field in the meantime the selection is
    /// cleared again and capture waits for another frame.
    pub fn on_frame_committed(&mut self, composition: &mut Composition) -> Option<ExportTarget> {
        match std::mem::replace(&mut self.state, ExportState::Idle) {
            ExportState::Idle => None,
            ExportState::Requested(target) => {
                self.state = ExportState::AwaitingCommit(target);
                None
            }
            ExportState::AwaitingCommit(target) => {
                if composition.active().is_some() {
                    composition.set_active(None);
                    self.state = ExportState::Requested(target);
                    None
                } else {
                    Some(target)
                }
            }
        }
    }
}

/// Rasterize the composition and write it as PNG. Returns the written path.
pub fn capture(
    composition: &Composition,
    background: &LoadedImage,
    fonts: &FontBook,
    target: &ExportTarget,
) -> Result<PathBuf> {
    let path = target.resolve(now_ms());
    let img = raster::render(composition, background, fonts)?;
    save_png(&img, &path)?;
    log::info!("Exported {}x{} meme to {}", img.width(), img.height(), path.display());
    Ok(path)
}

fn save_png(img: &image::RgbaImage, path: &Path) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| MemeError::Capture(format!("writing {}: {}", path.display(), e)))
}
