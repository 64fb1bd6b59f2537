//! Configuration file management
//!
//! Loads the TOML configuration for the demo renderer.
//! Default config path: ~/.config/gltext/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CACHE_SIZE, DEFAULT_PEN_COLOR};
use crate::utils::color::parse_hex_rgb;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "GLTEXT_CONFIG";

/// Demo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Render target settings
    pub display: DisplayConfig,
    /// Text lines to draw, in order
    pub lines: Vec<LineConfig>,
    /// Output settings
    pub output: OutputConfig,
}

/// Font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Family name or file path (searches system fonts if empty)
    pub path: String,
    /// Pixel size used when a line does not set its own
    pub size: u32,
    /// Glyph cache texture width
    pub cache_width: u32,
    /// Glyph cache texture height
    pub cache_height: u32,
    /// Characters cached before drawing
    pub preload: String,
}

/// Render target settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// Background color (RRGGBB)
    pub background: String,
}

/// One line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub text: String,
    /// Pen X (pixels from the left)
    pub x: i32,
    /// Pen Y (baseline, pixels from the bottom)
    pub y: i32,
    /// Text color (RRGGBB)
    pub color: String,
    /// Pixel size for this line (font size if unset)
    pub size: Option<u32>,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// PNG file to write
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: FontConfig::default(),
            display: DisplayConfig::default(),
            lines: vec![
                LineConfig {
                    text: "Hello, gltext!".to_string(),
                    x: 16,
                    y: 32,
                    color: "ffffff".to_string(),
                    size: Some(32),
                },
                LineConfig {
                    text: "Hello, RedText!".to_string(),
                    x: 16,
                    y: 16,
                    color: "ff0000".to_string(),
                    size: Some(12),
                },
            ],
            output: OutputConfig::default(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            size: 16,
            cache_width: DEFAULT_CACHE_SIZE,
            cache_height: DEFAULT_CACHE_SIZE,
            preload: "1234567890!@#$%^&*()abcdefghijklmnopqrstuvwxyz\
                      ABCDEFGHIJKLMNOPQRSTUVWXYZ,./;'[]\\<>?:\"{}|-=_+"
                .to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            background: "000000".to_string(),
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 0,
            y: 0,
            color: "ffffff".to_string(),
            size: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "gltext-demo.png".to_string(),
        }
    }
}

impl LineConfig {
    /// Pen color; invalid hex falls back to white
    pub fn rgb(&self) -> [f32; 3] {
        parse_hex_rgb(&self.color).unwrap_or_else(|| {
            warn!("Invalid line color \"{}\", using white", self.color);
            DEFAULT_PEN_COLOR
        })
    }
}

impl DisplayConfig {
    /// Background color; invalid hex falls back to black
    pub fn background_rgb(&self) -> [f32; 3] {
        parse_hex_rgb(&self.background).unwrap_or_else(|| {
            warn!("Invalid background \"{}\", using black", self.background);
            [0.0, 0.0, 0.0]
        })
    }
}

impl Config {
    /// Find the config file to load, in priority order:
    /// 1. Explicit path (--config)
    /// 2. GLTEXT_CONFIG environment variable
    /// 3. ~/.config/gltext/config.toml
    pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("gltext").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        None
    }

    /// Load configuration, falling back to built-in defaults
    ///
    /// An explicitly requested file that cannot be loaded is an error; any
    /// other unreadable file is skipped with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!("Loaded config: {}", path.display());
            return Ok(config);
        }

        if let Some(path) = Self::config_path(None) {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return Ok(config);
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }

        info!("Using built-in default config");
        Ok(Self::default())
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Pixel size for a line
    pub fn line_size(&self, line: &LineConfig) -> u32 {
        line.size.unwrap_or(self.font.size)
    }
}
