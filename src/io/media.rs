// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media loading for backgrounds.
//!
//! This module fetches raw bytes from URLs or local paths, converts uploads
//! to data URIs, and decodes images into RGBA pixels suitable for both
//! egui textures and the export rasterizer.

use crate::error::{MemeError, Result};
use crate::models::composition::BackgroundSource;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use std::time::Duration;

/// Size of the flat fallback used when even the placeholder fails.
pub const FALLBACK_SIZE: (u32, u32) = (500, 400);

/// A decoded image in unmultiplied RGBA8.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    /// Opaque mid-gray image used as the last-resort background.
    pub fn flat_gray(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[128, 128, 128, 255]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Copy scaled down so neither side exceeds `max_side`, keeping the
    /// aspect ratio. `None` when the image already fits.
    pub fn downscaled_to(&self, max_side: u32) -> Option<LoadedImage> {
        let longest = self.width.max(self.height);
        if max_side == 0 || longest <= max_side {
            return None;
        }
        let scale = max_side as f64 / longest as f64;
        let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_side);
        let (width, height) = (fit(self.width), fit(self.height));

        let resized = image::imageops::resize(
            &self.to_rgba_image()?,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        Some(LoadedImage {
            width,
            height,
            pixels: resized.into_raw(),
        })
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read bytes from an `http(s)` URL or a local path.
pub fn read_source(source: &str, timeout: Duration) -> Result<Vec<u8>> {
    if is_remote(source) {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        let response = client.get(source).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    } else {
        Ok(std::fs::read(source)?)
    }
}

/// Decode an encoded image (PNG, JPEG, ...) into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<LoadedImage> {
    let img = image::load_from_memory(bytes).map_err(|e| MemeError::ImageDecode(e.to_string()))?;
    let rgba = img.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Encode arbitrary file content as a `data:` URI. The MIME type is guessed
/// from the content; nothing is rejected.
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| MemeError::DataUri("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MemeError::DataUri("missing payload separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(MemeError::DataUri(format!("unsupported encoding in {header:?}")));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| MemeError::DataUri(e.to_string()))
}

/// Read a local file for use as a background.
pub fn upload_file(path: &Path) -> anyhow::Result<BackgroundSource> {
    let bytes = std::fs::read(path)?;
    log::info!("Read {} ({} bytes) for upload", path.display(), bytes.len());
    Ok(BackgroundSource::DataUri(encode_data_uri(&bytes)))
}

/// Fetch and decode a background.
pub fn load_background(source: &BackgroundSource, timeout: Duration) -> Result<LoadedImage> {
    let bytes = match source {
        BackgroundSource::Remote(url) => read_source(url, timeout)?,
        BackgroundSource::DataUri(uri) => decode_data_uri(uri)?,
    };
    decode_image(&bytes)
}

/// Load a background, substituting the placeholder on failure, and a flat
/// gray image if the placeholder fails too.
pub fn load_background_or_placeholder(
    source: &BackgroundSource,
    placeholder: &str,
    timeout: Duration,
) -> LoadedImage {
    match load_background(source, timeout) {
        Ok(img) => {
            log::info!("Loaded background {} ({}x{})", source.describe(), img.width, img.height);
            img
        }
        Err(e) => {
            log::warn!("Background {} unusable ({}), using placeholder", source.describe(), e);
            read_source(placeholder, timeout)
                .and_then(|bytes| decode_image(&bytes))
                .unwrap_or_else(|e| {
                    log::warn!("Placeholder {} unusable ({}), using flat fill", placeholder, e);
                    LoadedImage::flat_gray(FALLBACK_SIZE.0, FALLBACK_SIZE.1)
                })
        }
    }
}
