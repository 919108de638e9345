#![deny(unsafe_code)]
//! CLI binary for the folio particle field.
//!
//! Subcommands:
//! - `render <preset>`: run a preset headless for N frames, write PNG
//! - `list`: print available presets and palettes
//! - `profile <preset>`: time step + rasterize per frame through a
//!   `FrameMonitor` and report the quality tier it settles on

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use folio_core::{FrameMonitor, Palette, Rgba};
use folio_scene::{RasterSurface, SceneKind};
use glam::DVec2;
use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Simulated frame spacing for headless renders, in milliseconds.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Parses a pointer position given as `X,Y`.
fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("invalid coordinate {v:?}"))
    };
    Ok(DVec2::new(parse(x)?, parse(y)?))
}

#[derive(Parser)]
#[command(name = "folio", about = "Particle field background renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a preset for N frames and write a PNG snapshot.
    Render {
        /// Preset name (contact, ambient, minimal).
        preset: String,

        /// Canvas width in pixels.
        #[arg(short = 'W', long, default_value_t = 800)]
        width: usize,

        /// Canvas height in pixels.
        #[arg(short = 'H', long, default_value_t = 600)]
        height: usize,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 300)]
        frames: usize,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Palette name (accent, mono, sunset).
        #[arg(short, long)]
        palette: Option<String>,

        /// Background color as CSS (e.g. "#0f172a").
        #[arg(long, default_value = "#0f172a")]
        background: String,

        /// Pointer held at X,Y for the whole run.
        #[arg(long, value_parser = parse_point)]
        pointer: Option<DVec2>,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,

        /// Configuration overrides as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Measure frame cost and the quality tier the monitor settles on.
    Profile {
        /// Preset name (contact, ambient, minimal).
        preset: String,

        #[arg(short = 'W', long, default_value_t = 1280)]
        width: usize,

        #[arg(short = 'H', long, default_value_t = 720)]
        height: usize,

        /// Number of frames to time.
        #[arg(short, long, default_value_t = 600)]
        frames: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Configuration overrides as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// List available presets and palettes.
    List,
}

fn parse_params(raw: &str) -> Result<serde_json::Value, CliError> {
    serde_json::from_str(raw).map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let presets = SceneKind::list_presets();
            let palettes = Palette::list_names();
            if cli.json {
                let info = serde_json::json!({
                    "presets": presets,
                    "palettes": palettes,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Presets:");
                for name in presets {
                    println!("  {name}");
                }
                println!("Palettes:");
                println!("  {}", palettes.join(", "));
            }
        }
        Command::Render {
            preset,
            width,
            height,
            frames,
            seed,
            palette,
            background,
            pointer,
            output,
            params,
        } => {
            let params = parse_params(&params)?;
            let background = Rgba::parse_css(&background)
                .map_err(|e| CliError::Input(format!("invalid --background: {e}")))?;

            let mut scene = SceneKind::from_name(&preset, width, height, seed, &params)?;
            if let Some(name) = &palette {
                scene.field_mut().set_palette(Palette::from_name(name)?);
            }
            scene.field_mut().set_pointer(pointer);

            (0..frames).for_each(|i| scene.step(i as f64 * FRAME_MS));

            let mut surface = RasterSurface::new(width, height)?.with_background(background);
            scene.render(&mut surface);
            folio_scene::snapshot::write_png(&surface, &output)?;
            info!(preset = %preset, frames, output = %output.display(), "snapshot written");

            if cli.json {
                let info = serde_json::json!({
                    "preset": preset,
                    "width": width,
                    "height": height,
                    "frames": frames,
                    "seed": seed,
                    "particles": scene.field().particles().len(),
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {preset} ({width}x{height}, {frames} frames, seed {seed}) -> {}",
                    output.display()
                );
            }
        }
        Command::Profile {
            preset,
            width,
            height,
            frames,
            seed,
            params,
        } => {
            let params = parse_params(&params)?;
            let mut scene = SceneKind::from_name(&preset, width, height, seed, &params)?;
            let mut surface = RasterSurface::new(width, height)?;
            let mut monitor = FrameMonitor::default();
            let mut changes = Vec::new();

            monitor.start();
            let clock = Instant::now();
            for frame in 0..frames {
                let now = clock.elapsed().as_secs_f64() * 1000.0;
                scene.step(now);
                scene.render(&mut surface);
                if let Some(tier) = monitor.record(now) {
                    scene.field_mut().apply_quality(tier);
                    debug!(frame, tier = tier.name(), "quality tier changed");
                    changes.push(serde_json::json!({"frame": frame, "tier": tier.name()}));
                }
            }
            monitor.stop();

            let elapsed_ms = clock.elapsed().as_secs_f64() * 1000.0;
            let fps = if elapsed_ms > 0.0 {
                frames as f64 * 1000.0 / elapsed_ms
            } else {
                0.0
            };
            let tier = monitor.tier();
            let particles = scene.field().particles().len();

            if cli.json {
                let info = serde_json::json!({
                    "preset": preset,
                    "width": width,
                    "height": height,
                    "frames": frames,
                    "elapsed_ms": elapsed_ms,
                    "fps": fps,
                    "tier": tier,
                    "particles": particles,
                    "changes": changes,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{preset} at {width}x{height}: {frames} frames in {elapsed_ms:.1} ms ({fps:.1} fps)");
                println!("tier: {} ({particles} particles, {} changes)", tier.name(), changes.len());
            }
        }
    }

    Ok(())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if env_bool("FOLIO_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
