// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: backgrounds, typefaces and the template gallery.

pub mod media;
pub mod resources;
pub mod templates;
