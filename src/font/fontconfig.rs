//! fontconfig integration
//!
//! Resolves a font specifier (file path or family name) to a font file for
//! the demo. Faces are opened by path, so only the path is returned.

use anyhow::{anyhow, Result};
use fontconfig::Fontconfig;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Common monospace font locations, tried before asking fontconfig
const WELL_KNOWN_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansMono-Regular.ttf",
];

/// Monospace family names, in order of preference
const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Source Code Pro",
    "Inconsolata",
    "monospace",
];

/// Font search result
#[derive(Debug, Clone)]
pub struct FontMatch {
    /// Font file path
    pub path: PathBuf,
    /// Font name
    pub family: String,
}

/// Search fonts using fontconfig
pub struct FontFinder {
    fc: Fontconfig,
}

impl FontFinder {
    pub fn new() -> Result<Self> {
        let fc = Fontconfig::new().ok_or_else(|| anyhow!("fontconfig initialization failed"))?;
        info!("fontconfig initialized");
        Ok(Self { fc })
    }

    /// Search by family name
    ///
    /// fontconfig always answers with its closest match, so the result is
    /// rejected unless the names overlap.
    pub fn find_font(&self, family: &str) -> Option<FontMatch> {
        let font = self.fc.find(family, None)?;
        if family_matches(family, &font.name) {
            return Some(FontMatch {
                path: font.path,
                family: font.name,
            });
        }
        warn!(
            "fontconfig: rejected false match for \"{}\": got \"{}\"",
            family, font.name
        );
        None
    }

    /// First installed monospace family
    pub fn find_monospace(&self) -> Option<FontMatch> {
        let found = MONOSPACE_FAMILIES
            .iter()
            .find_map(|name| self.find_font(name));
        if found.is_none() {
            warn!("Monospace font not found");
        }
        found
    }
}

fn family_matches(requested: &str, got: &str) -> bool {
    let req = requested.to_ascii_lowercase();
    let got = got.to_ascii_lowercase();
    got.contains(&req) || req.contains(&got)
}

/// Resolve a font specifier to a file
///
/// An existing path wins; otherwise the specifier is looked up as a family
/// name. An empty specifier picks a system monospace font.
pub fn resolve_font_path(specifier: &str) -> Result<PathBuf> {
    if specifier.is_empty() {
        return find_system_monospace();
    }

    let path = Path::new(specifier);
    if path.exists() {
        info!("Font from path: {}", specifier);
        return Ok(path.to_path_buf());
    }

    let finder = FontFinder::new()?;
    if let Some(found) = finder.find_font(specifier) {
        info!(
            "Font resolved by name: \"{}\" -> {} ({})",
            specifier,
            found.family,
            found.path.display()
        );
        return Ok(found.path);
    }

    Err(anyhow!(
        "Font not found: \"{}\" (not a valid path or font name)",
        specifier
    ))
}

/// Well-known paths first, then fontconfig
pub fn find_system_monospace() -> Result<PathBuf> {
    if let Some(path) = WELL_KNOWN_FONTS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
    {
        info!("System font: {}", path.display());
        return Ok(path.to_path_buf());
    }

    let finder = FontFinder::new()?;
    if let Some(found) = finder.find_monospace() {
        info!(
            "System font (fontconfig): {} ({})",
            found.family,
            found.path.display()
        );
        return Ok(found.path);
    }

    Err(anyhow!("Monospace font not found"))
}
