// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image export: sequencing and offscreen rendering.

pub mod pipeline;
pub mod raster;
