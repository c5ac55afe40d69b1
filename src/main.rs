//! Sand Connect: colour-matching falling-sand puzzle in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use sandconnect::{DEFAULT_PALETTE, SimConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("theme not loaded, using defaults: {err}");
        theme::Theme::for_palette(args.palette)
    });
    let mut app = App::new(&args, args.sim_config(), theme)?;
    app.run()
}

/// Logs go to a file only; stderr would draw over the game screen.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-sand colour-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "sandconnect",
    version,
    about = "Falling-sand puzzle: connect four or more grains of one colour to clear them.",
    long_about = "Sand Connect is a terminal puzzle game.\n\n\
        Stacks of coloured grains drop from the top of the well. Once a stack lands, its \
        grains turn into loose sand that slides down slopes. Any four or more grains of the \
        same colour touching edge to edge vanish for 10 points each. The game ends when a new \
        stack has no room to appear.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Down or j  Soft drop\n  \
        P                  Pause   Q / Esc    Quit"
)]
pub struct Args {
    /// Grid width in cells.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Grid height in cells.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Milliseconds between steps of the falling stack.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub fall_ms: u64,

    /// Milliseconds between sand settling passes.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub physics_ms: u64,

    /// Smallest stack size.
    #[arg(long, default_value = "3", value_name = "N")]
    pub min_cluster: usize,

    /// Largest stack size.
    #[arg(long, default_value = "5", value_name = "N")]
    pub max_cluster: usize,

    /// Number of colours in play (first N of the palette, at most 7).
    #[arg(long, default_value = "7", value_name = "N")]
    pub colors: usize,

    /// Random seed for a reproducible game.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal, high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the clear animation (cells vanish instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the start screen.
    #[arg(long)]
    pub no_menu: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE", value_parser = parse_frame_rate)]
    pub frame_rate: f64,

    /// Ring the terminal bell on clears and pause.
    #[arg(long)]
    pub bell: bool,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn sim_config(&self) -> SimConfig {
        let colors = self.colors.min(DEFAULT_PALETTE.len());
        SimConfig {
            width: self.width as usize,
            height: self.height as usize,
            palette: DEFAULT_PALETTE[..colors].to_vec(),
            fall_interval: Duration::from_millis(self.fall_ms),
            physics_interval: Duration::from_millis(self.physics_ms),
            cluster_sizes: self.min_cluster..=self.max_cluster,
            spawn_column: None,
        }
    }
}

/// Frames per second: a finite number above zero.
fn parse_frame_rate(s: &str) -> Result<f64, String> {
    let rate = s.parse::<f64>().map_err(|e| e.to_string())?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("frame rate must be a positive number, got {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_game() {
        let args = Args::parse_from(["sandconnect"]);
        assert_eq!(args.sim_config(), SimConfig::default());
    }

    #[test]
    fn colour_count_is_capped() {
        let args = Args::parse_from(["sandconnect", "--colors", "4"]);
        assert_eq!(args.sim_config().palette.len(), 4);
        let args = Args::parse_from(["sandconnect", "--colors", "99"]);
        assert_eq!(args.sim_config().palette.len(), 7);
    }

    #[test]
    fn frame_rate_must_be_finite_and_positive() {
        for bad in ["NaN", "inf", "0", "-5"] {
            assert!(
                Args::try_parse_from(["sandconnect", "--frame-rate", bad]).is_err(),
                "{bad} accepted"
            );
        }
        let args = Args::try_parse_from(["sandconnect", "--frame-rate", "30"]).unwrap();
        assert!((args.frame_rate - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn palette_aliases() {
        let args = Args::parse_from(["sandconnect", "--palette", "contrast"]);
        assert_eq!(args.palette, Palette::HighContrast);
    }
}
