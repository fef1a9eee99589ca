// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text field data structures.
//!
//! This module defines the caption records placed over the background
//! image: their typeface, color, size and position.

use serde::{Deserialize, Serialize};

/// Stable identity of a text field. Allocated once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u64);

/// Offset from the composition's top-left corner, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Available caption typefaces.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Font {
    #[default]
    Anton,
    Bangers,
    ComicNeue,
    Lobster,
    PermanentMarker,
}

impl Font {
    pub const ALL: [Font; 5] = [
        Font::Anton,
        Font::Bangers,
        Font::ComicNeue,
        Font::Lobster,
        Font::PermanentMarker,
    ];

    /// Name shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Font::Anton => "Anton",
            Font::Bangers => "Bangers",
            Font::ComicNeue => "Comic Neue",
            Font::Lobster => "Lobster",
            Font::PermanentMarker => "Permanent Marker",
        }
    }

    /// Key under which the typeface is registered with the resource loader
    /// and with egui's font families.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Anton => "font:anton",
            Font::Bangers => "font:bangers",
            Font::ComicNeue => "font:comic_neue",
            Font::Lobster => "font:lobster",
            Font::PermanentMarker => "font:permanent_marker",
        }
    }

    pub fn parse(name: &str) -> Option<Font> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Font::ALL.into_iter().find(|font| {
            font.label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
                == normalized
        })
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A caption placed on the composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    pub id: FieldId,
    pub text: String,
    pub font: Font,
    pub color: Rgb,
    pub size: u32,
    pub position: Position,
}

/// Attributes used when creating a field. Anything left at its default
/// takes the stock caption look.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefaults {
    pub text: String,
    pub font: Font,
    pub color: Rgb,
    pub size: u32,
    pub position: Position,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            text: "New Text".to_string(),
            font: Font::Anton,
            color: Rgb::WHITE,
            size: 40,
            position: Position::new(50.0, 150.0),
        }
    }
}

impl FieldDefaults {
    pub fn with_text(text: impl Into<String>, position: Position) -> Self {
        Self {
            text: text.into(),
            position,
            ..Default::default()
        }
    }
}

/// A single-attribute replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Text(String),
    Font(Font),
    Color(Rgb),
    Size(u32),
    Position(Position),
}

impl FieldUpdate {
    /// Build an update from a string key and a loosely typed value.
    ///
    /// Returns `None` for unknown keys or values of the wrong shape.
    pub fn from_key_value(key: &str, value: &serde_json::Value) -> Option<FieldUpdate> {
        match key {
            "text" => value.as_str().map(|s| FieldUpdate::Text(s.to_string())),
            "font" => value.as_str().and_then(Font::parse).map(FieldUpdate::Font),
            "color" => value.as_str().and_then(Rgb::from_hex).map(FieldUpdate::Color),
            "size" => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(FieldUpdate::Size),
            "position" => {
                let x = value.get("x")?.as_f64()? as f32;
                let y = value.get("y")?.as_f64()? as f32;
                Some(FieldUpdate::Position(Position::new(x, y)))
            }
            _ => None,
        }
    }

    /// Apply to a field. Returns true if the field changed.
    pub fn apply(self, field: &mut TextField) -> bool {
        match self {
            FieldUpdate::Text(text) => replace(&mut field.text, text),
            FieldUpdate::Font(font) => replace(&mut field.font, font),
            FieldUpdate::Color(color) => replace(&mut field.color, color),
            FieldUpdate::Size(size) => replace(&mut field.size, size),
            FieldUpdate::Position(position) => replace(&mut field.position, position),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("00ff00"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::from_hex("#fff"), None);
        assert_eq!(Rgb::from_hex("#gg0000"), None);
        assert_eq!(Rgb::new(18, 52, 86).to_hex(), "#123456");
    }

    #[test]
    fn test_font_parse_is_lenient_about_spacing() {
        assert_eq!(Font::parse("Comic Neue"), Some(Font::ComicNeue));
        assert_eq!(Font::parse("permanent_marker"), Some(Font::PermanentMarker));
        assert_eq!(Font::parse("Impact"), None);
    }

    #[test]
    fn test_update_from_key_value() {
        assert_eq!(
            FieldUpdate::from_key_value("size", &json!(64)),
            Some(FieldUpdate::Size(64))
        );
        assert_eq!(
            FieldUpdate::from_key_value("position", &json!({"x": 10.0, "y": 20.5})),
            Some(FieldUpdate::Position(Position::new(10.0, 20.5)))
        );
        assert_eq!(FieldUpdate::from_key_value("rotation", &json!(45)), None);
        assert_eq!(FieldUpdate::from_key_value("size", &json!("big")), None);
    }

    #[test]
    fn test_apply_reports_change() {
        let mut field = TextField {
            id: FieldId(1),
            text: "a".into(),
            font: Font::Anton,
            color: Rgb::WHITE,
            size: 40,
            position: Position::default(),
        };
        assert!(FieldUpdate::Text("b".into()).apply(&mut field));
        assert!(!FieldUpdate::Text("b".into()).apply(&mut field));
        assert_eq!(field.text, "b");
    }
}
