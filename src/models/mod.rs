// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Core data model: text fields and the composition that holds them.

pub mod composition;
pub mod field;
