//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use sandconnect::{DEFAULT_PALETTE, Rgb};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Sand colours and UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Grain colours, indexed by palette index.
    pub sand: Vec<Color>,
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, counters).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Frame around the score.
    pub score_frame: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_palette(crate::Palette::Normal)
    }
}

const fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

const HIGH_CONTRAST: [Color; 7] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0xFF),
];

/// Paul Tol's vibrant scheme plus grey.
const COLORBLIND: [Color; 7] = [
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
    Color::Rgb(0x33, 0xBB, 0xEE),
    Color::Rgb(0xBB, 0xBB, 0xBB),
];

impl Theme {
    /// Built-in theme: the game palette on a dark background.
    pub fn for_palette(palette: crate::Palette) -> Self {
        let mut theme = Self {
            sand: DEFAULT_PALETTE.iter().copied().map(rgb).collect(),
            bg: Color::Rgb(0x1C, 0x10, 0x2E),
            div_line: Color::Rgb(0x4B, 0x3A, 0x6B),
            main_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
            title: Color::Rgb(0xFF, 0xDF, 0x00),
            score_frame: Color::Rgb(0xFF, 0xDF, 0x00),
        };
        theme.apply_palette(palette);
        theme
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the built-in theme if path is None or the file is missing.
    /// `palette` overrides the grain colours for high-contrast or colorblind play.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.sand = HIGH_CONTRAST.to_vec(),
            crate::Palette::Colorblind => self.sand = COLORBLIND.to_vec(),
        }
    }

    /// Grain colours come from `sand0`..`sand6`; UI colours use btop key names.
    /// Missing keys keep the built-in value, malformed ones are an error.
    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();

        for (i, slot) in theme.sand.iter_mut().enumerate() {
            if let Some(c) = get(&format!("sand{i}"))? {
                *slot = c;
            }
        }
        if let Some(c) = get("main_bg")?.or(get("meter_bg")?) {
            theme.bg = c;
        }
        if let Some(c) = get("div_line")? {
            theme.div_line = c;
        }
        if let Some(c) = get("main_fg")? {
            theme.main_fg = c;
        }
        if let Some(c) = get("title")? {
            theme.title = c;
        }
        if let Some(c) = get("hi_fg")? {
            theme.score_frame = c;
        }
        Ok(theme)
    }

    /// Colour for a grain's palette index.
    #[inline]
    pub fn sand_color(&self, index: u8) -> Color {
        self.sand[index as usize % self.sand.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        let c = parse_hex("#FF6347").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0x63, 0x47)));
    }

    #[test]
    fn expands_three_digit_hex() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn reads_btop_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn theme_file_overrides_sand_slot() {
        let map = parse_theme_file("theme[sand2]='#010203'\n# comment\ntheme[title]=\"#FFF\"");
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.sand[2], Color::Rgb(1, 2, 3));
        assert_eq!(theme.title, Color::Rgb(255, 255, 255));
        assert_eq!(theme.sand[0], Color::Rgb(255, 99, 71));
    }

    #[test]
    fn every_palette_has_a_colour_per_index() {
        for palette in [
            crate::Palette::Normal,
            crate::Palette::HighContrast,
            crate::Palette::Colorblind,
        ] {
            assert_eq!(Theme::for_palette(palette).sand.len(), DEFAULT_PALETTE.len());
        }
    }
}
