//! Simulation configuration: board size, palette, timings, cluster sizes.

use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Palette indices are stored as `u8` on each particle.
pub const MAX_PALETTE_LEN: usize = 256;

/// One palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Tomato, light sky blue, medium sea green, violet, gold, slate blue, hot pink.
pub const DEFAULT_PALETTE: [Rgb; 7] = [
    Rgb::new(255, 99, 71),
    Rgb::new(135, 206, 250),
    Rgb::new(60, 179, 113),
    Rgb::new(238, 130, 238),
    Rgb::new(255, 215, 0),
    Rgb::new(106, 90, 205),
    Rgb::new(255, 105, 180),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1 (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("colour palette is empty")]
    EmptyPalette,
    #[error("colour palette has {0} entries; at most {MAX_PALETTE_LEN} are supported")]
    PaletteTooLarge(usize),
    #[error("invalid cluster size range {min}..={max}")]
    ClusterSize { min: usize, max: usize },
    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("spawn column {column} is outside a grid {width} wide")]
    SpawnColumn { column: usize, width: usize },
}

/// Fixed inputs of a simulation; validated once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub palette: Vec<Rgb>,
    /// Time between controlled cluster descents.
    pub fall_interval: Duration,
    /// Time between free-particle relaxation passes.
    pub physics_interval: Duration,
    pub cluster_sizes: RangeInclusive<usize>,
    /// Column clusters spawn in. `None` means `width / 2`.
    pub spawn_column: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            palette: DEFAULT_PALETTE.to_vec(),
            fall_interval: Duration::from_millis(1000),
            physics_interval: Duration::from_millis(200),
            cluster_sizes: 3..=5,
            spawn_column: None,
        }
    }
}

impl SimConfig {
    /// Same defaults on a custom board size.
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.palette.len() > MAX_PALETTE_LEN {
            return Err(ConfigError::PaletteTooLarge(self.palette.len()));
        }
        let (min, max) = (*self.cluster_sizes.start(), *self.cluster_sizes.end());
        if min == 0 || min > max {
            return Err(ConfigError::ClusterSize { min, max });
        }
        if self.fall_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("fall"));
        }
        if self.physics_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("physics"));
        }
        if let Some(column) = self.spawn_column {
            if column >= self.width {
                return Err(ConfigError::SpawnColumn {
                    column,
                    width: self.width,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn start_column(&self) -> usize {
        self.spawn_column.unwrap_or(self.width / 2)
    }

    /// Palette entry for a particle colour index.
    pub fn color(&self, index: u8) -> Option<Rgb> {
        self.palette.get(index as usize).copied()
    }
}
