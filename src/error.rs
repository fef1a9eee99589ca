// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for loading, fetching and exporting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemeError {
    #[error("failed to load resource {name}: {reason}")]
    ResourceLoad { name: String, reason: String },

    #[error("template fetch failed: {0}")]
    TemplateFetch(String),

    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("invalid data URI: {0}")]
    DataUri(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MemeError>;
