//! Layout and drawing: start screen, playfield, sidebar, pause, game over.

use crate::app::Screen;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use sandconnect::{Simulation, Snapshot};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// Each grid cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the clear fade in ms.
const CLEAR_FADE_MS: u32 = 500;

const TITLE: &str = "Sand Connect";

/// Per-letter title colours.
const TITLE_COLORS: [Color; 7] = [
    Color::Rgb(255, 0, 0),
    Color::Rgb(255, 127, 0),
    Color::Rgb(255, 255, 0),
    Color::Rgb(0, 255, 0),
    Color::Rgb(0, 0, 255),
    Color::Rgb(75, 0, 130),
    Color::Rgb(148, 0, 211),
];

/// Terminal columns or rows spanned by `cells` grid cells of `size` each.
/// Saturates: grids wider than the terminal are clipped, never wrapped.
fn span(cells: usize, size: u16) -> u16 {
    u16::try_from(cells).unwrap_or(u16::MAX).saturating_mul(size)
}

/// Playfield size in terminal cells, border included.
fn playfield_size(width: usize, height: usize) -> (u16, u16) {
    (
        span(width, CELL_WIDTH).saturating_add(2),
        span(height, CELL_HEIGHT).saturating_add(2),
    )
}

/// Playfield outer rect and sidebar rect, centred in `area`.
fn game_layout(area: Rect, snap: &Snapshot) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(snap.width, snap.height);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw.saturating_add(SIDEBAR_WIDTH)),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Board rect (inside the border), clipped to what the terminal shows.
fn board_rect(playfield: Rect, snap: &Snapshot) -> Rect {
    let inner = Rect {
        x: playfield.x.saturating_add(1),
        y: playfield.y.saturating_add(1),
        width: span(snap.width, CELL_WIDTH),
        height: span(snap.height, CELL_HEIGHT),
    };
    inner.intersection(playfield)
}

/// Draw the current screen. While a clear is animating, the cleared cells
/// are painted white and faded out with TachyonFX; the simulation has
/// already emptied them.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    sim: &Simulation,
    theme: &Theme,
    clear_cells: &[(usize, usize)],
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let snap = sim.snapshot();
    match screen {
        Screen::Start => draw_start(frame, theme, area),
        Screen::Playing => {
            let (playfield, sidebar) = game_layout(area, &snap);
            draw_playfield(frame, &snap, theme, playfield, clear_cells);
            draw_sidebar(frame, sim, &snap, theme, sidebar);
            if !clear_cells.is_empty() {
                apply_clear_effect(
                    frame,
                    theme,
                    board_rect(playfield, &snap),
                    clear_cells,
                    clear_effect,
                    clear_process_time,
                    now,
                );
            }
            if snap.paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            let (playfield, sidebar) = game_layout(area, &snap);
            draw_playfield(frame, &snap, theme, playfield, &[]);
            draw_sidebar(frame, sim, &snap, theme, sidebar);
            draw_game_over(frame, &snap, theme, area);
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn rainbow_title() -> Line<'static> {
    Line::from(
        TITLE
            .chars()
            .enumerate()
            .map(|(i, c)| {
                Span::styled(
                    c.to_string(),
                    Style::default()
                        .fg(TITLE_COLORS[i % TITLE_COLORS.len()])
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect::<Vec<_>>(),
    )
}

fn draw_start(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 40, 9);
    let lines = vec![
        Line::from(""),
        rainbow_title(),
        Line::from(""),
        Line::from(Span::styled(
            "Connect 4+ grains of one colour",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Press any key to start ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    frame.render_widget(p, popup);
}

fn draw_playfield(
    frame: &mut Frame,
    snap: &Snapshot,
    theme: &Theme,
    area: Rect,
    clear_cells: &[(usize, usize)],
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    frame.render_widget(block, area);

    let board = board_rect(area, snap);
    let clearing: HashSet<(usize, usize)> = clear_cells.iter().copied().collect();
    let buf = frame.buffer_mut();

    let rows = snap.height.min(usize::from(board.height / CELL_HEIGHT) + 1);
    let cols = snap.width.min(usize::from(board.width / CELL_WIDTH) + 1);
    for y in 0..rows {
        for x in 0..cols {
            let (symbol, style) = if clearing.contains(&(x, y)) {
                ("█", Style::default().fg(Color::White).bg(theme.bg))
            } else {
                match snap.color_at(x, y) {
                    Some(i) => ("█", Style::default().fg(theme.sand_color(i)).bg(theme.bg)),
                    None => (" ", Style::default().bg(theme.bg)),
                }
            };
            let rx = board.x.saturating_add(span(x, CELL_WIDTH));
            let ry = board.y.saturating_add(span(y, CELL_HEIGHT));
            for dx in 0..CELL_WIDTH {
                let pos = Position::new(rx.saturating_add(dx), ry);
                if board.contains(pos) {
                    buf[pos].set_symbol(symbol).set_style(style);
                }
            }
        }
    }
}

/// Terminal positions covered by the cleared cells.
fn clearing_buffer_positions(board: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = board.x.saturating_add(span(gx, CELL_WIDTH));
        let y0 = board.y.saturating_add(span(gy, CELL_HEIGHT));
        for bx in x0..x0.saturating_add(CELL_WIDTH) {
            for by in y0..y0.saturating_add(CELL_HEIGHT) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or advance the clear fade (white cells fade to background).
fn apply_clear_effect(
    frame: &mut Frame,
    theme: &Theme,
    board: Rect,
    clear_cells: &[(usize, usize)],
    clear_effect: &mut Option<Effect>,
    clear_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = clear_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *clear_process_time = Some(now);

    if clear_effect.is_none() {
        let clearing_set = clearing_buffer_positions(board, clear_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *clear_effect = Some(effect);
    }

    if let Some(effect) = clear_effect {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, sim: &Simulation, snap: &Snapshot, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(1), // gap
            Constraint::Length(5), // Score frame
            Constraint::Length(1), // gap
            Constraint::Length(4), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(3), // Colours
            Constraint::Fill(1),   // Controls
        ])
        .split(area);

    let title = Paragraph::new(rainbow_title())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(border_style));
    frame.render_widget(title, chunks[0]);

    let score = Paragraph::new(vec![
        Line::from(Span::styled("SCORE", title_style)),
        Line::from(""),
        Line::from(Span::styled(
            snap.score.to_string(),
            fg_style.add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.score_frame).bg(theme.bg)),
    );
    frame.render_widget(score, chunks[2]);

    let stats = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Stacks:  ", title_style),
            Span::styled(sim.clusters_spawned().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Cleared: ", title_style),
            Span::styled(sim.particles_cleared().to_string(), fg_style),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(border_style));
    frame.render_widget(stats, chunks[4]);

    let colours_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let colours_inner = colours_block.inner(chunks[6]);
    frame.render_widget(colours_block, chunks[6]);
    draw_colour_strip(frame, sim, theme, colours_inner);

    let controls = Paragraph::new(vec![
        Line::from(Span::styled("←/→ h/l  move", fg_style)),
        Line::from(Span::styled("↓ j      drop", fg_style)),
        Line::from(Span::styled("p        pause", fg_style)),
        Line::from(Span::styled("q        quit", fg_style)),
    ]);
    frame.render_widget(controls, chunks[7].inner(ratatui::layout::Margin::new(1, 0)));
}

/// One block per colour in play.
fn draw_colour_strip(frame: &mut Frame, sim: &Simulation, theme: &Theme, area: Rect) {
    let count = sim.config().palette.len() as u16;
    let block_w = (area.width / count.max(1)).clamp(1, 3);
    for i in 0..count {
        let r = Rect {
            x: area.x + i * block_w,
            y: area.y,
            width: block_w,
            height: area.height.min(1),
        }
        .intersection(area);
        let c = theme.sand_color(i as u8);
        frame.render_widget(Paragraph::new("█".repeat(block_w as usize)).style(Style::default().fg(c)), r);
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}

fn draw_game_over(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let popup = centered(area, 40, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Final Score: {} ", snap.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Any key — Restart    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Sand Connect ", Style::default().fg(theme.title))),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}
