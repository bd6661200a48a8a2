#![deny(unsafe_code)]
//! CLI binary for the ink-engine watercolor system.
//!
//! Subcommands:
//! - `paint <text>` — walk the nozzle over the text's letter grid, deposit
//!   ink, write a PNG
//! - `list` — print available styles and palettes

mod error;
mod layout;

use clap::{Parser, Subcommand};
use error::CliError;
use ink_engine_core::{Palette, Rgb8, Srgb, Surface, Xorshift64};
use ink_engine_engines::Dispatcher;
use std::path::PathBuf;
use std::process;

/// How many colors a word's pick must differ from.
const RECENT_COLORS: usize = 3;

#[derive(Parser)]
#[command(name = "ink-engine", about = "Watercolor ink engine CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Paint input text as watercolor and write a PNG snapshot.
    Paint {
        /// The text to paint; words become ink clusters.
        text: String,

        /// Surface width in pixels.
        #[arg(short = 'W', long, default_value_t = 1200)]
        width: usize,

        /// Surface height in pixels.
        #[arg(short = 'H', long, default_value_t = 800)]
        height: usize,

        /// Rendering style (wash, droplet, splatter).
        #[arg(short, long, default_value = "wash")]
        style: String,

        /// Palette name (see `list`).
        #[arg(short, long, default_value = "nordic")]
        palette: String,

        /// PRNG seed; 0 draws a seed from entropy.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Simulation steps per letter-to-letter segment.
        #[arg(long, default_value_t = 6)]
        steps: usize,

        /// Output file path.
        #[arg(short, long, default_value = "artwork.png")]
        output: PathBuf,
    },
    /// List available styles and palettes.
    List,
}

/// Walks the nozzle along every word's waypoints, dispatching one ink
/// event per interpolation step and a boundary event between words.
fn paint_text(
    dispatcher: &mut Dispatcher,
    rng: &mut Xorshift64,
    palette: &Palette,
    style: &str,
    text: &str,
    steps: usize,
) -> Result<usize, CliError> {
    let paths = layout::word_paths(text, dispatcher.width(), dispatcher.height());
    if paths.is_empty() {
        return Err(CliError::Input(
            "input text contains no paintable letters".into(),
        ));
    }

    let mut recent: Vec<Rgb8> = Vec::new();
    let mut events = 0_usize;

    for path in &paths {
        let color = palette.pick_avoiding(rng, &recent);
        recent.push(color);
        if recent.len() > RECENT_COLORS {
            recent.remove(0);
        }

        let mut nozzle: Option<(f64, f64)> = None;
        for &(letter, wx, wy) in &path.waypoints {
            let symbol = letter.to_string();
            match nozzle {
                None => {
                    let event = dispatcher.event(style, Some(&symbol), wx, wy, color);
                    dispatcher.submit(&event)?;
                    events += 1;
                }
                Some((px, py)) => {
                    for s in 1..=steps.max(1) {
                        let t = s as f64 / steps.max(1) as f64;
                        let x = px + (wx - px) * t;
                        let y = py + (wy - py) * t;
                        let event = dispatcher.event(style, Some(&symbol), x, y, color);
                        dispatcher.submit(&event)?;
                        events += 1;
                    }
                }
            }
            nozzle = Some((wx, wy));
        }

        // Word break: engines reset their puddle state.
        let boundary = dispatcher.event(style, None, 0.0, 0.0, color);
        dispatcher.submit(&boundary)?;
    }
    Ok(events)
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let styles = ink_engine_engines::EngineKind::list_engines();
            let palettes = Palette::list_names();
            if cli.json {
                let info = serde_json::json!({
                    "styles": styles,
                    "palettes": palettes,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Styles:");
                for name in styles {
                    println!("  {name}");
                }
                println!("Palettes:");
                println!("  {}", palettes.join(", "));
            }
        }
        Command::Paint {
            text,
            width,
            height,
            style,
            palette,
            seed,
            steps,
            output,
        } => {
            let palette =
                Palette::from_name(&palette).map_err(|e| CliError::Input(e.to_string()))?;
            let mut rng = if seed == 0 {
                Xorshift64::from_entropy()
            } else {
                Xorshift64::new(seed)
            };

            let mut dispatcher = Dispatcher::with_default_styles(width, height, seed)?;
            if !dispatcher.styles().contains(&style.as_str()) {
                return Err(CliError::Engine(
                    ink_engine_core::EngineError::MissingEngine(style),
                ));
            }

            let paper = Srgb {
                r: 0.965,
                g: 0.955,
                b: 0.93,
            };
            let mut surface = Surface::with_paper(width, height, paper, &mut rng)?;

            let events = paint_text(&mut dispatcher, &mut rng, &palette, &style, &text, steps)?;

            dispatcher.compose(&mut surface)?;
            ink_engine_engines::snapshot::write_png(&surface, &output)?;

            if cli.json {
                let info = serde_json::json!({
                    "style": style,
                    "width": width,
                    "height": height,
                    "events": events,
                    "seed": seed,
                    "output": output.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "painted '{text}' with {style} ({width}x{height}, {events} ink events) -> {}",
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

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
