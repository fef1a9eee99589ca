// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from `memeforge.yaml` in the working directory, or from
//! the file named by `MEMEFORGE_CONFIG`. Every key is optional.

use crate::models::field::Font;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "MEMEFORGE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "memeforge.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gallery endpoint returning `{id, name, url}` templates.
    pub template_endpoint: String,
    /// Background shown at startup.
    pub default_background: String,
    /// Substituted when a background cannot be decoded.
    pub placeholder_image: String,
    /// Directory receiving `meme-<timestamp>.png` exports.
    pub export_dir: PathBuf,
    /// Typeface sources (URL or local path) keyed by font.
    pub fonts: BTreeMap<Font, String>,
    /// Directory checked for already downloaded typefaces, matched by the
    /// file name at the end of each source. Found files are not fetched.
    pub font_dir: Option<PathBuf>,
    /// Attribute overrides (`font`, `color`, `size`, ...) applied to every
    /// new caption, including the two startup captions.
    pub caption_style: BTreeMap<String, serde_json::Value>,
    pub window_size: [f32; 2],
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_endpoint: "https://api.imgflip.com/get_memes".to_string(),
            default_background: "https://i.imgflip.com/1bij.jpg".to_string(),
            placeholder_image: "https://placehold.co/500x400/png?text=Image+not+available"
                .to_string(),
            export_dir: PathBuf::from("."),
            fonts: default_font_sources(),
            font_dir: None,
            caption_style: BTreeMap::new(),
            window_size: [1280.0, 800.0],
            http_timeout_secs: 30,
        }
    }
}

fn default_font_sources() -> BTreeMap<Font, String> {
    const GOOGLE_FONTS: &str = "https://github.com/google/fonts/raw/main";
    Font::ALL
        .into_iter()
        .map(|font| {
            let path = match font {
                Font::Anton => "ofl/anton/Anton-Regular.ttf",
                Font::Bangers => "ofl/bangers/Bangers-Regular.ttf",
                Font::ComicNeue => "ofl/comicneue/ComicNeue-Bold.ttf",
                Font::Lobster => "ofl/lobster/Lobster-Regular.ttf",
                Font::PermanentMarker => "apache/permanentmarker/PermanentMarker-Regular.ttf",
            };
            (font, format!("{GOOGLE_FONTS}/{path}"))
        })
        .collect()
}

impl Config {
    /// Load from the default location. A missing file yields the defaults; a
    /// malformed one is logged and the defaults are used.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml).context("parsing config")?;
        // A partial `fonts` map only overrides the fonts it names.
        for (font, source) in default_font_sources() {
            config.fonts.entry(font).or_insert(source);
        }
        Ok(config)
    }

    /// Source for a font; always present after loading.
    pub fn font_source(&self, font: Font) -> Option<&str> {
        self.fonts.get(&font).map(String::as_str)
    }

    /// Local copy of a font inside `font_dir`, if one exists.
    pub fn local_font(&self, font: Font) -> Option<PathBuf> {
        let dir = self.font_dir.as_ref()?;
        let file_name = self.font_source(font)?.rsplit('/').next()?;
        let path = dir.join(file_name);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_font() {
        let config = Config::default();
        for font in Font::ALL {
            assert!(config.font_source(font).is_some(), "{:?} has no source", font);
        }
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = "export_dir: /tmp/memes\nfonts:\n  lobster: ./fonts/Lobster.ttf\n";
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.export_dir, PathBuf::from("/tmp/memes"));
        assert_eq!(config.font_source(Font::Lobster), Some("./fonts/Lobster.ttf"));
        assert_eq!(config.font_source(Font::Anton), Config::default().font_source(Font::Anton));
        assert_eq!(config.template_endpoint, Config::default().template_endpoint);
    }

    #[test]
    fn test_caption_style_values() {
        let yaml = "caption_style:\n  font: bangers\n  size: 56\n  color: \"#ffff00\"\n";
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.caption_style["font"], serde_json::json!("bangers"));
        assert_eq!(config.caption_style["size"], serde_json::json!(56));
        assert_eq!(config.caption_style["color"], serde_json::json!("#ffff00"));
    }

    #[test]
    fn test_local_font_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bangers-Regular.ttf"), b"ttf").unwrap();

        let config = Config {
            font_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(
            config.local_font(Font::Bangers),
            Some(dir.path().join("Bangers-Regular.ttf"))
        );
        assert_eq!(config.local_font(Font::Anton), None);
        assert_eq!(Config::default().local_font(Font::Bangers), None);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(Config::from_yaml("window_size: [oops").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memeforge.yaml");
        std::fs::write(&path, "http_timeout_secs: 5\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.http_timeout_secs, 5);
    }
}
