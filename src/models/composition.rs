// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Composition state management.
//!
//! This module owns the background reference, the ordered list of text
//! fields and the active selection. All mutations go through the methods
//! here so the invariants hold: ids are unique and never reused, and the
//! active field always refers to a live field.

use super::field::{FieldDefaults, FieldId, FieldUpdate, Position, TextField};

/// Where the background image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSource {
    /// Remote image URL.
    Remote(String),
    /// Locally encoded `data:` URI.
    DataUri(String),
}

impl BackgroundSource {
    /// Short description for logs; data URIs are not printed in full.
    pub fn describe(&self) -> String {
        match self {
            BackgroundSource::Remote(url) => url.clone(),
            BackgroundSource::DataUri(uri) => {
                let header = uri.split(',').next().unwrap_or("data:");
                format!("{header},... ({} bytes)", uri.len())
            }
        }
    }
}

/// The meme being composed.
#[derive(Debug, Clone)]
pub struct Composition {
    background: BackgroundSource,
    background_generation: u64,
    fields: Vec<TextField>,
    active: Option<FieldId>,
    next_id: u64,
}

impl Composition {
    /// Create an empty composition over the given background.
    pub fn new(background: BackgroundSource) -> Self {
        Self {
            background,
            background_generation: 0,
            fields: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Create the startup composition: the background plus the two seed
    /// captions. Neither seed starts out active.
    pub fn with_seed_fields(background: BackgroundSource) -> Self {
        let mut composition = Self::new(background);
        composition.add_field(FieldDefaults::with_text("Top Text", Position::new(50.0, 20.0)));
        composition.add_field(FieldDefaults::with_text(
            "Bottom Text",
            Position::new(50.0, 300.0),
        ));
        composition.set_active(None);
        composition
    }

    pub fn background(&self) -> &BackgroundSource {
        &self.background
    }

    /// Incremented every time the background is replaced.
    pub fn background_generation(&self) -> u64 {
        self.background_generation
    }

    pub fn fields(&self) -> &[TextField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, id: FieldId) -> Option<&TextField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn active(&self) -> Option<FieldId> {
        self.active
    }

    pub fn active_field(&self) -> Option<&TextField> {
        self.active.and_then(|id| self.field(id))
    }

    /// Append a new field and make it active.
    pub fn add_field(&mut self, defaults: FieldDefaults) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;

        self.fields.push(TextField {
            id,
            text: defaults.text,
            font: defaults.font,
            color: defaults.color,
            size: defaults.size,
            position: defaults.position,
        });
        self.active = Some(id);

        log::info!("Added field {:?}, total: {}", id, self.fields.len());
        id
    }

    /// Replace one attribute of a field. Unknown ids are ignored and the
    /// selection is left alone. Returns true if anything changed.
    pub fn update_field(&mut self, id: FieldId, update: FieldUpdate) -> bool {
        match self.fields.iter_mut().find(|f| f.id == id) {
            Some(field) => update.apply(field),
            None => false,
        }
    }

    /// String-keyed variant of [`Composition::update_field`]. Unknown keys and
    /// ill-typed values leave the store untouched.
    pub fn update_attribute(&mut self, id: FieldId, key: &str, value: &serde_json::Value) -> bool {
        match FieldUpdate::from_key_value(key, value) {
            Some(update) => self.update_field(id, update),
            None => {
                log::debug!("Ignoring update of unknown attribute {:?} on {:?}", key, id);
                false
            }
        }
    }

    /// Delete a field. Clears the selection if it pointed at the field.
    pub fn remove_field(&mut self, id: FieldId) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        let removed = self.fields.len() != before;

        if removed {
            if self.active == Some(id) {
                self.active = None;
            }
            log::info!("Removed field {:?}, total: {}", id, self.fields.len());
        }
        removed
    }

    /// Select a field, or clear the selection with `None`. Ids that are not
    /// live are treated as `None`.
    pub fn set_active(&mut self, id: Option<FieldId>) {
        self.active = id.filter(|id| self.field(*id).is_some());
    }

    /// Replace the background wholesale. Always clears the selection.
    pub fn set_background(&mut self, background: BackgroundSource) {
        log::info!("Background set to {}", background.describe());
        self.background = background;
        self.background_generation += 1;
        self.active = None;
    }
}
