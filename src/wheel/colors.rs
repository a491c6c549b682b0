use crate::random::RandomSource;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// An RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Color {
    pub(crate) const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub(crate) const BLACK: Color = Color::new(0, 0, 0);

    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The relative luminance of this color, in [0, 1].
    pub(crate) fn luminance(&self) -> f64 {
        fn channel(value: u8) -> f64 {
            let value = value as f64 / 255.0;
            if value <= 0.03928 { value / 12.92 } else { ((value + 0.055) / 1.055).powf(2.4) }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// The color a label drawn on top of this color should use.
    pub(crate) fn label_color(&self) -> Color {
        if self.luminance() < 0.4 { Color::WHITE } else { Color::BLACK }
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(input.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(input.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for crossterm::style::Color {
    fn from(color: Color) -> Self {
        Self::Rgb { r: color.r, g: color.g, b: color.b }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid color '{0}', expected '#rrggbb'")]
pub(crate) struct ParseColorError(String);

/// The set of colors slices are painted with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Palette(Vec<Color>);

impl Palette {
    pub(crate) fn new(colors: Vec<Color>) -> Self {
        Self(colors)
    }

    pub(crate) fn colors(&self) -> &[Color] {
        &self.0
    }

    fn first(&self) -> Color {
        self.0.first().copied().unwrap_or(Color::WHITE)
    }

    /// Assign a color to each of `slice_count` slices so that no two neighbouring slices share a
    /// color, including the last and first ones.
    ///
    /// This can only be honored when the palette has at least 3 colors; smaller palettes still get
    /// an assignment, just not a conflict free one.
    pub(crate) fn assign<R: RandomSource>(&self, slice_count: usize, rng: &mut R) -> Vec<Color> {
        let mut colors: Vec<Color> = Vec::with_capacity(slice_count);
        for index in 0..slice_count {
            let previous = index.checked_sub(1).map(|i| colors[i]);
            let pool: Vec<Color> = self.0.iter().copied().filter(|c| Some(*c) != previous).collect();
            colors.push(rng.pick(&pool).unwrap_or_else(|| self.first()));
        }
        if slice_count > 1 && colors[0] == colors[slice_count - 1] {
            let before_last = colors[slice_count - 2];
            let first = colors[0];
            let pool: Vec<Color> = self.0.iter().copied().filter(|c| *c != before_last && *c != first).collect();
            let replacement = match rng.pick(&pool) {
                Some(color) => Some(color),
                None => {
                    let remaining: Vec<Color> = self.0.iter().copied().filter(|c| *c != first).collect();
                    rng.pick(&remaining)
                }
            };
            if let Some(color) = replacement {
                colors[slice_count - 1] = color;
            }
        }
        colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(vec![Color::WHITE, Color::new(0x1d, 0x4e, 0xd8), Color::new(0xff, 0xff, 0x00)])
    }
}

/// Convert HSL to RGB color
/// H: hue (0-360), S: saturation (0-100), L: lightness (0-100)
pub(crate) fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let s = s / 100.0;
    let l = l / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::new(((r + m) * 255.0) as u8, ((g + m) * 255.0) as u8, ((b + m) * 255.0) as u8)
}

/// Generate a rainbow color for a given position, shifted by `hue_offset` degrees.
pub(crate) fn rainbow_color(index: usize, total: usize, hue_offset: f32) -> Color {
    let hue = (index as f32 / total.max(1) as f32) * 360.0;
    hsl_to_rgb((hue + hue_offset).rem_euclid(360.0), 100.0, 50.0)
}
