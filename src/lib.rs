//! Sand Connect: falling-sand colour-matching puzzle core.
//!
//! Clusters of coloured particles spawn at the top of the grid and fall as a
//! rigid unit. Once a cluster lands its particles become loose sand; any
//! four or more same-coloured particles touching edge to edge are removed
//! for points. [`Simulation`] drives the whole cycle from elapsed time and
//! player [`Intent`]s; rendering, sound and input live outside this crate's
//! library target.

pub mod cluster;
pub mod config;
pub mod game;
pub mod grid;
pub mod random;
pub mod regions;
pub mod sand;

pub use cluster::{Cluster, SpawnError};
pub use config::{ConfigError, DEFAULT_PALETTE, Rgb, SimConfig};
pub use game::{Intent, Phase, SimEvent, Simulation, Snapshot};
pub use grid::{Grid, Particle, ParticleId};
pub use random::RandomSource;
