//! Colour ramps.
//!
//! Named maps are sampled from their reference colour stops and interpolated
//! linearly in RGB. Custom maps are read from JSON:
//!
//! ```json
//! { "name": "sea", "stops": [
//!     { "position": 0.0, "color": "#08306b" },
//!     { "position": 1.0, "color": "#f7fbff" } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f64 * t_inv) + (b as f64 * t)).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Color stop as found in colormap JSON files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    /// Position in `[0, 1]`.
    pub position: f64,
    pub color: String,
}

/// Colormap definition loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColormapDefinition {
    pub name: String,
    pub stops: Vec<ColorStop>,
}

const TERRAIN: &[(f64, &str)] = &[
    (0.00, "#333399"),
    (0.15, "#0099ff"),
    (0.25, "#00cc66"),
    (0.50, "#ffff99"),
    (0.75, "#805c54"),
    (1.00, "#ffffff"),
];

const COOLWARM: &[(f64, &str)] = &[
    (0.000, "#3b4cc0"),
    (0.125, "#5977e3"),
    (0.250, "#7b9ff9"),
    (0.375, "#9ebeff"),
    (0.500, "#dddcdc"),
    (0.625, "#f6bfa6"),
    (0.750, "#f4987a"),
    (0.875, "#de604d"),
    (1.000, "#b40426"),
];

const VIRIDIS: &[(f64, &str)] = &[
    (0.000, "#440154"),
    (0.111, "#482878"),
    (0.222, "#3e4989"),
    (0.333, "#31688e"),
    (0.444, "#26828e"),
    (0.556, "#1f9e89"),
    (0.667, "#35b779"),
    (0.778, "#6ece58"),
    (0.889, "#b5de2b"),
    (1.000, "#fde725"),
];

/// Continuous colour ramp over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<(f64, Color)>,
    /// Colour of masked cells.
    pub bad: Color,
}

impl Colormap {
    /// Build from stops; positions are sorted and must lie in `[0, 1]`.
    pub fn from_stops(name: impl Into<String>, stops: &[ColorStop]) -> RenderResult<Self> {
        let name = name.into();
        if stops.len() < 2 {
            return Err(RenderError::InvalidColormap(format!(
                "{} needs at least two stops",
                name
            )));
        }
        let mut parsed = Vec::with_capacity(stops.len());
        for stop in stops {
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(RenderError::InvalidColormap(format!(
                    "{}: position {} outside [0, 1]",
                    name, stop.position
                )));
            }
            let (r, g, b) = hex_to_rgb(&stop.color).ok_or_else(|| {
                RenderError::InvalidColormap(format!("{}: bad colour '{}'", name, stop.color))
            })?;
            parsed.push((stop.position, Color::rgb(r, g, b)));
        }
        parsed.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            name,
            stops: parsed,
            bad: Color::transparent(),
        })
    }

    fn from_table(name: &str, table: &[(f64, &str)]) -> RenderResult<Self> {
        let stops: Vec<ColorStop> = table
            .iter()
            .map(|&(position, color)| ColorStop {
                position,
                color: color.to_string(),
            })
            .collect();
        Self::from_stops(name, &stops)
    }

    /// Named map; a `_r` suffix reverses it.
    pub fn by_name(name: &str) -> RenderResult<Self> {
        if let Some(base) = name.strip_suffix("_r") {
            let mut cmap = Self::by_name(base)?.reversed();
            cmap.name = name.to_string();
            return Ok(cmap);
        }
        match name {
            "terrain" => Self::from_table(name, TERRAIN),
            "coolwarm" => Self::from_table(name, COOLWARM),
            "viridis" => Self::from_table(name, VIRIDIS),
            _ => Err(RenderError::InvalidColormap(format!("unknown colormap '{}'", name))),
        }
    }

    /// Load colormap from JSON string
    pub fn from_json(json_str: &str) -> RenderResult<Self> {
        let def: ColormapDefinition = serde_json::from_str(json_str)?;
        Self::from_stops(def.name, &def.stops)
    }

    /// Load colormap from file
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// A JSON file when `name` ends in `.json`, a named map otherwise.
    pub fn resolve(name: &str) -> RenderResult<Self> {
        if name.ends_with(".json") {
            Self::from_file(name)
        } else {
            Self::by_name(name)
        }
    }

    /// Same ramp, masked cells painted with `bad`.
    pub fn with_bad(mut self, bad: Color) -> Self {
        self.bad = bad;
        self
    }

    pub fn reversed(&self) -> Self {
        let mut stops: Vec<(f64, Color)> =
            self.stops.iter().map(|&(p, c)| (1.0 - p, c)).collect();
        stops.reverse();
        Self {
            name: format!("{}_r", self.name),
            stops,
            bad: self.bad,
        }
    }

    /// Colour at `t` in `[0, 1]`, clamped.
    pub fn at(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let upper = self
            .stops
            .iter()
            .position(|&(p, _)| p >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].1;
        }
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let span = p1 - p0;
        if span <= 0.0 {
            return c1;
        }
        interpolate_color(c0, c1, (t - p0) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#ff8000"), Some((255, 128, 0)));
        assert_eq!(hex_to_rgb("00ff00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#gg0000"), None);
    }

    #[test]
    fn test_endpoints() {
        let cmap = Colormap::by_name("terrain").unwrap();
        assert_eq!(cmap.at(0.0), Color::rgb(0x33, 0x33, 0x99));
        assert_eq!(cmap.at(1.0), Color::WHITE);
        assert_eq!(cmap.at(2.0), Color::WHITE);
    }

    #[test]
    fn test_reversed_suffix() {
        let cmap = Colormap::by_name("terrain_r").unwrap();
        assert_eq!(cmap.name, "terrain_r");
        assert_eq!(cmap.at(0.0), Color::WHITE);
        assert_eq!(cmap.at(1.0), Color::rgb(0x33, 0x33, 0x99));
    }

    #[test]
    fn test_interpolation_midpoint() {
        let cmap = Colormap::from_json(
            r##"{"name": "bw", "stops": [
                {"position": 0.0, "color": "#000000"},
                {"position": 1.0, "color": "#ffffff"}]}"##,
        )
        .unwrap();
        assert_eq!(cmap.at(0.5), Color::rgb(128, 128, 128));
        assert_eq!(cmap.bad, Color::transparent());
    }

    #[test]
    fn test_bad_colour_survives_reversal() {
        let grey = Color::rgb(200, 200, 200);
        let cmap = Colormap::by_name("viridis").unwrap().with_bad(grey);
        assert_eq!(cmap.reversed().bad, grey);
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(Colormap::by_name("jet").is_err());
        let one_stop = [ColorStop {
            position: 0.0,
            color: "#000000".to_string(),
        }];
        assert!(Colormap::from_stops("x", &one_stop).is_err());
        assert!(Colormap::from_json(
            r##"{"name": "x", "stops": [
                {"position": 0.0, "color": "#000000"},
                {"position": 1.5, "color": "#ffffff"}]}"##
        )
        .is_err());
    }
}
