//! gltext-demo - render configured text lines to a PNG
//!
//! Creates a headless OpenGL ES context, draws each `[[lines]]` entry of the
//! config with one font, and writes the result as an image.

use anyhow::{anyhow, Result};
use glow::HasContext;
use log::{info, warn};
use std::path::{Path, PathBuf};

use gltext::config::Config;
use gltext::font::fontconfig::resolve_font_path;
use gltext::gpu::{Fbo, HeadlessContext};
use gltext::{FtLibrary, GlFont, GlRuntime, TextError};

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn print_help() {
    println!(
        r#"gltext-demo {} - render shaped text to a PNG with OpenGL ES

USAGE:
    gltext-demo [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config PATH       Config file (default: $GLTEXT_CONFIG, then
                            ~/.config/gltext/config.toml)
    -o, --output PATH       Output PNG (overrides [output] path)

CONFIG FILE:
    ~/.config/gltext/config.toml
"#,
        env!("CARGO_PKG_VERSION")
    );
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("{} requires a path", arg))?;
                cli.config = Some(PathBuf::from(value));
            }
            "-o" | "--output" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("{} requires a path", arg))?;
                cli.output = Some(PathBuf::from(value));
            }
            other => {
                if let Some(value) = other.strip_prefix("--config=") {
                    cli.config = Some(PathBuf::from(value));
                } else if let Some(value) = other.strip_prefix("--output=") {
                    cli.output = Some(PathBuf::from(value));
                } else {
                    return Err(anyhow!("Unknown argument: {} (see --help)", other));
                }
            }
        }
    }
    Ok(cli)
}

fn render(config: &Config, output: &Path) -> Result<()> {
    let (width, height) = (config.display.width, config.display.height);

    // Declared first so it outlives every GL object below
    let egl = HeadlessContext::new(width, height)?;
    let runtime = GlRuntime::new(egl.load_gl(), FtLibrary::init()?);
    let shared = runtime.instance()?;
    let gl = shared.device();

    let fbo = Fbo::new(gl, width, height)?;
    fbo.bind(gl);
    let [r, g, b] = config.display.background_rgb();
    fbo.clear(gl, r, g, b, 1.0);

    // Glyph output is premultiplied
    unsafe {
        gl.enable(glow::BLEND);
        gl.blend_func(glow::ONE, glow::ONE_MINUS_SRC_ALPHA);
    }

    let font_path = resolve_font_path(&config.font.path)?;
    let mut font = GlFont::new(
        &runtime,
        &font_path,
        config.font.size,
        config.font.cache_width,
        config.font.cache_height,
    )?;
    font.set_display_size(width, height)?;

    if !config.font.preload.is_empty() {
        match font.cache_characters(&config.font.preload) {
            Ok(cached) => info!("Preloaded {} glyphs", cached),
            // Lines can still draw from whatever fit
            Err(TextError::CacheOverflow { capacity }) => {
                warn!("Preload filled the glyph cache ({} slots)", capacity)
            }
            Err(e) => return Err(e.into()),
        }
    }

    for line in &config.lines {
        let size = config.line_size(line);
        if size != font.point_size()? {
            font.set_point_size(size)?;
        }
        font.set_pen_position(line.x, line.y)?;
        let [r, g, b] = line.rgb();
        font.set_pen_color(r, g, b)?;
        font.draw(&line.text)?;
    }

    unsafe {
        gl.finish();
    }
    fbo.save_png(gl, output)?;
    fbo.unbind(gl);
    fbo.destroy(gl);

    info!(
        "Rendered {} lines ({} glyphs cached)",
        config.lines.len(),
        font.cached_glyph_count()?
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("gltext-demo {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cli = parse_args(&args[1..])?;
    let config = Config::load(cli.config.as_deref())?;
    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.path));

    info!("gltext-demo starting...");
    render(&config, &output)?;
    println!("{}", output.display());
    Ok(())
}
