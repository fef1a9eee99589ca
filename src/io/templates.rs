// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Meme template gallery.
//!
//! Fetches the list of `{id, name, url}` templates once at startup.

use crate::error::{MemeError, Result};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// imgflip-style envelope: `{"success": true, "data": {"memes": [...]}}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<EnvelopeData>,
    error_message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    memes: Vec<Template>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GalleryResponse {
    List(Vec<Template>),
    Envelope(Envelope),
}

/// Parse a gallery response body. Accepts the imgflip envelope or a bare
/// array of templates.
pub fn parse_templates(body: &str) -> Result<Vec<Template>> {
    let response: GalleryResponse =
        serde_json::from_str(body).map_err(|e| MemeError::TemplateFetch(e.to_string()))?;

    match response {
        GalleryResponse::List(templates) => Ok(templates),
        GalleryResponse::Envelope(envelope) if !envelope.success => Err(MemeError::TemplateFetch(
            envelope
                .error_message
                .unwrap_or_else(|| "gallery reported failure".to_string()),
        )),
        GalleryResponse::Envelope(envelope) => envelope
            .data
            .map(|data| data.memes)
            .ok_or_else(|| MemeError::TemplateFetch("response has no data".to_string())),
    }
}

/// Fetch templates from `endpoint` (URL or local JSON file).
pub fn fetch_templates(endpoint: &str, timeout: Duration) -> Result<Vec<Template>> {
    let bytes = crate::io::media::read_source(endpoint, timeout)?;
    let body = String::from_utf8_lossy(&bytes);
    parse_templates(&body)
}

/// Fetch on a background thread. The receiver yields exactly one result.
pub fn spawn_fetch(endpoint: String, timeout: Duration) -> Receiver<Result<Vec<Template>>> {
    let (sender, receiver) = channel();
    std::thread::spawn(move || {
        let _ = sender.send(fetch_templates(&endpoint, timeout));
    });
    receiver
}
