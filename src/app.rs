//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use sandconnect::{SimConfig, SimEvent, Simulation};
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Playing,
    GameOver,
}

pub struct App {
    sim: Simulation,
    theme: Theme,
    screen: Screen,
    frame_rate: f64,
    no_animation: bool,
    bell: bool,
    last_frame: Instant,
    /// Cells removed by the latest clear, kept while the fade plays.
    clear_cells: Vec<(usize, usize)>,
    /// TachyonFX fade over `clear_cells` (created on first draw after a clear).
    clear_effect: Option<Effect>,
    /// Last time we processed the clear effect (for delta).
    clear_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, config: SimConfig, theme: Theme) -> Result<Self> {
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sim = Simulation::new(config, rng).context("invalid game settings")?;
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Start
        };
        Ok(Self {
            sim,
            theme,
            screen,
            frame_rate: args.frame_rate.clamp(1.0, 240.0),
            no_animation: args.no_animation,
            bell: args.bell,
            last_frame: Instant::now(),
            clear_cells: Vec::new(),
            clear_effect: None,
            clear_effect_process_time: None,
        })
    }

    fn start_game(&mut self) {
        self.sim.reset();
        self.screen = Screen::Playing;
        self.last_frame = Instant::now();
        self.clear_animation();
    }

    fn clear_animation(&mut self) {
        self.clear_cells.clear();
        self.clear_effect = None;
        self.clear_effect_process_time = None;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("cannot enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.sim,
                    &self.theme,
                    &self.clear_cells,
                    &mut self.clear_effect,
                    &mut self.clear_effect_process_time,
                    now,
                );
            })?;

            if self.clear_effect.as_ref().is_some_and(Effect::done) {
                self.clear_animation();
            }

            let frame_duration = Duration::from_secs_f64(1.0 / self.frame_rate);
            let timeout = frame_duration.saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.handle_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }

            let now = Instant::now();
            let dt = now.duration_since(self.last_frame);
            self.last_frame = now;
            if self.screen == Screen::Playing {
                self.sim.tick(dt);
                self.dispatch_events();
            }
        }
    }

    /// Returns false when the player quits.
    fn handle_action(&mut self, action: Action) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => return false,
            (_, Action::None) => {}
            (Screen::Start | Screen::GameOver, _) => self.start_game(),
            (Screen::Playing, action) => {
                if let Some(intent) = action.intent() {
                    self.sim.apply(intent);
                    self.dispatch_events();
                }
            }
        }
        true
    }

    /// Routes simulation events to the bell, the clear animation and the
    /// screen flow. Cleared cells are only valid right after the tick.
    fn dispatch_events(&mut self) {
        for event in self.sim.drain_events() {
            match event {
                SimEvent::RegionCleared(count) => {
                    debug!("clear of {count} particles");
                    self.ring_bell();
                    if !self.no_animation {
                        self.clear_cells = self.sim.last_cleared().to_vec();
                        self.clear_effect = None;
                        self.clear_effect_process_time = None;
                    }
                }
                SimEvent::PauseToggled(_) => self.ring_bell(),
                SimEvent::GameOver => self.screen = Screen::GameOver,
                SimEvent::ClusterMoved | SimEvent::ClusterSettled => {}
            }
        }
    }

    fn ring_bell(&self) {
        if self.bell {
            use crossterm::{execute, style::Print};
            let _ = execute!(std::io::stdout(), Print('\x07'));
        }
    }
}
