// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the mapping between image pixel coordinates (where
//! field positions live) and screen coordinates on the canvas.

use crate::models::field::Position;

/// Placement of the image on screen: its top-left corner and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub origin_x: f32,
    pub origin_y: f32,
    pub scale: f32,
}

impl ImageTransform {
    /// Fit an image of `image_size` centered inside an area of `available`
    /// size whose top-left is at `area_origin`, preserving aspect ratio.
    pub fn fit(image_size: (u32, u32), area_origin: (f32, f32), available: (f32, f32)) -> Self {
        let (img_w, img_h) = (image_size.0.max(1) as f32, image_size.1.max(1) as f32);
        let scale = (available.0 / img_w).min(available.1 / img_h).max(0.0);

        let display_w = img_w * scale;
        let display_h = img_h * scale;
        Self {
            origin_x: area_origin.0 + (available.0 - display_w) / 2.0,
            origin_y: area_origin.1 + (available.1 - display_h) / 2.0,
            scale,
        }
    }

    /// Image pixels to screen coordinates.
    pub fn to_screen(&self, pos: Position) -> (f32, f32) {
        (
            self.origin_x + pos.x * self.scale,
            self.origin_y + pos.y * self.scale,
        )
    }

    /// Screen-space delta to image-space delta.
    pub fn delta_to_image(&self, dx: f32, dy: f32) -> (f32, f32) {
        if self.scale == 0.0 {
            return (0.0, 0.0);
        }
        (dx / self.scale, dy / self.scale)
    }
}
