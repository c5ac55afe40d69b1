//! Simulation loop: cluster fall, settlement, region clearing, sand physics.

use crate::cluster::Cluster;
use crate::config::{ConfigError, SimConfig};
use crate::grid::Grid;
use crate::random::RandomSource;
use crate::{regions, sand};
use log::{debug, info, trace};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::time::Duration;

/// Undrained events kept before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

/// Discrete player intents. Each is applied once per delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    TogglePause,
}

/// Notifications queued at the point they happen; drained by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// The active cluster moved sideways.
    ClusterMoved,
    /// The active cluster could not descend and was released.
    ClusterSettled,
    /// A clearing pass removed this many particles.
    RegionCleared(usize),
    /// Pause flag after the toggle.
    PauseToggled(bool),
    GameOver,
}

/// Where the loop is in its spawn → fall → settle → clear cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Spawning,
    Falling,
    Settling,
    Clearing,
    GameOver,
}

/// Owned, read-only copy of what the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    /// Palette index per cell, row-major.
    pub cells: Vec<Option<u8>>,
    pub score: u32,
    pub paused: bool,
    pub running: bool,
}

impl Snapshot {
    pub fn color_at(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            None
        }
    }
}

/// All mutable game state. One `tick` runs to completion before the next.
#[derive(Debug)]
pub struct Simulation<R = StdRng> {
    config: SimConfig,
    grid: Grid,
    cluster: Option<Cluster>,
    rng: R,
    score: u32,
    phase: Phase,
    paused: bool,
    /// Time accumulated towards the next cluster descent.
    fall_timer: Duration,
    /// Time accumulated towards the next sand pass.
    physics_timer: Duration,
    last_cleared: Vec<(usize, usize)>,
    events: VecDeque<SimEvent>,
    clusters_spawned: u32,
    particles_cleared: u32,
}

impl Simulation<StdRng> {
    /// Reproducible simulation.
    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Validates `config` and spawns the first cluster.
    pub fn new(config: SimConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height);
        let mut sim = Self {
            config,
            grid,
            cluster: None,
            rng,
            score: 0,
            phase: Phase::Spawning,
            paused: false,
            fall_timer: Duration::ZERO,
            physics_timer: Duration::ZERO,
            last_cleared: Vec::new(),
            events: VecDeque::new(),
            clusters_spawned: 0,
            particles_cleared: 0,
        };
        sim.spawn_next();
        Ok(sim)
    }

    /// New game: empty grid, zero score, fresh timers and a fresh cluster.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.cluster = None;
        self.score = 0;
        self.phase = Phase::Spawning;
        self.paused = false;
        self.fall_timer = Duration::ZERO;
        self.physics_timer = Duration::ZERO;
        self.last_cleared.clear();
        self.events.clear();
        self.clusters_spawned = 0;
        self.particles_cleared = 0;
        info!("new game on {}x{} grid", self.config.width, self.config.height);
        self.spawn_next();
    }

    /// Advances both timers by `dt` and runs whichever phases came due:
    /// cluster fall first, then the sand pass. No-op while paused or over.
    pub fn tick(&mut self, dt: Duration) {
        if self.paused || !self.is_running() {
            return;
        }
        self.last_cleared.clear();
        self.fall_timer += dt;
        self.physics_timer += dt;

        if self.fall_timer > self.config.fall_interval {
            self.fall_timer = Duration::ZERO;
            self.step_cluster();
            if !self.is_running() {
                return;
            }
        }
        if self.physics_timer > self.config.physics_interval {
            self.physics_timer = Duration::ZERO;
            self.relax();
        }
    }

    /// Applies a player intent immediately. Returns true if state changed;
    /// rejected moves are silent.
    pub fn apply(&mut self, intent: Intent) -> bool {
        if !self.is_running() {
            return false;
        }
        match intent {
            Intent::TogglePause => {
                self.paused = !self.paused;
                debug!("paused: {}", self.paused);
                self.push_event(SimEvent::PauseToggled(self.paused));
                true
            }
            _ if self.paused => false,
            Intent::MoveLeft => self.try_shift(-1),
            Intent::MoveRight => self.try_shift(1),
            Intent::SoftDrop => {
                // Next tick with any elapsed time crosses the threshold.
                self.fall_timer = self.config.fall_interval;
                true
            }
        }
    }

    fn try_shift(&mut self, dx: i32) -> bool {
        let Some(cluster) = &self.cluster else {
            return false;
        };
        if !cluster.can_shift(&self.grid, dx) {
            trace!("shift by {dx} rejected");
            return false;
        }
        cluster.shift(&mut self.grid, dx);
        self.push_event(SimEvent::ClusterMoved);
        true
    }

    /// One fall step: descend the active cluster, or settle it, clear
    /// regions and spawn the next one.
    pub fn step_cluster(&mut self) {
        if !self.is_running() {
            return;
        }
        match &self.cluster {
            Some(cluster) if cluster.can_descend(&self.grid) => cluster.descend(&mut self.grid),
            Some(_) => self.settle(),
            None => self.spawn_next(),
        }
    }

    /// One sand pass over every particle outside the active cluster.
    pub fn relax(&mut self) -> usize {
        sand::relax(&mut self.grid, self.cluster.as_ref(), &mut self.rng)
    }

    fn settle(&mut self) {
        self.phase = Phase::Settling;
        if let Some(cluster) = self.cluster.take() {
            debug!(
                "cluster of {} settled at {:?}",
                cluster.len(),
                cluster.positions(&self.grid)
            );
            self.push_event(SimEvent::ClusterSettled);
        }

        self.phase = Phase::Clearing;
        let clearing = regions::remove_regions(&mut self.grid, &mut self.score);
        if !clearing.is_empty() {
            let count = clearing.cells.len();
            debug!(
                "cleared {} region(s), {} particles, score {}",
                clearing.regions, count, self.score
            );
            self.particles_cleared = self.particles_cleared.saturating_add(count as u32);
            self.push_event(SimEvent::RegionCleared(count));
            self.last_cleared = clearing.cells;
        }

        self.phase = Phase::Spawning;
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.phase = Phase::Spawning;
        match Cluster::spawn(&mut self.grid, &self.config, &mut self.rng) {
            Ok(cluster) => {
                self.cluster = Some(cluster);
                self.clusters_spawned = self.clusters_spawned.saturating_add(1);
                self.phase = Phase::Falling;
            }
            Err(err) => {
                info!("game over: {err} (score {})", self.score);
                self.cluster = None;
                self.phase = Phase::GameOver;
                self.push_event(SimEvent::GameOver);
            }
        }
    }

    /// Events since the last drain, oldest first. Callers should drain after
    /// every `tick` and `apply`; past [`MAX_PENDING_EVENTS`] the oldest
    /// undrained events are discarded.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    fn push_event(&mut self, event: SimEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.colors(),
            score: self.score,
            paused: self.paused,
            running: self.is_running(),
        }
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn active_cluster(&self) -> Option<&Cluster> {
        self.cluster.as_ref()
    }

    /// Cells removed by the clearing phase of the latest tick; empty otherwise.
    #[inline]
    pub fn last_cleared(&self) -> &[(usize, usize)] {
        &self.last_cleared
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase != Phase::GameOver
    }

    #[inline]
    pub fn clusters_spawned(&self) -> u32 {
        self.clusters_spawned
    }

    #[inline]
    pub fn particles_cleared(&self) -> u32 {
        self.particles_cleared
    }
}
