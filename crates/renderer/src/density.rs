//! The four-panel density figure.
//!
//! Panels from top to bottom: anticyclonic count, cyclonic count, combined
//! count and cyclonic / anticyclonic ratio, all sharing the same limits. The
//! three count panels share a linear colorbar, the ratio has a logarithmic
//! one.

use std::path::PathBuf;

use eddy_grid::DensityComposite;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::colormap::{hex_to_rgb, Color, Colormap};
use crate::error::{RenderError, RenderResult};
use crate::figure::{Figure, FigureRect};
use crate::gradient::{Extent, Norm};

/// Configuration of the density figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Figure width in pixels.
    pub width: usize,

    /// Figure height in pixels.
    pub height: usize,

    pub title: String,

    /// TrueType font for titles and tick labels; text is only stored as PNG
    /// metadata when unset.
    pub font: Option<PathBuf>,
    pub font_size: f32,

    /// Colormap name (`terrain_r`, ...) or path to a JSON definition.
    pub count_colormap: String,
    pub count_range: (f64, f64),
    pub count_label: String,

    pub ratio_colormap: String,
    pub ratio_range: (f64, f64),
    pub ratio_label: String,

    /// `#rrggbb` colour of masked cells, transparent when unset.
    pub masked_color: Option<String>,

    /// Gridline spacing in degrees.
    pub grid_step: f64,

    /// Shared limits, the bins' extent when unset.
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,

    /// Panel rectangles, top to bottom.
    pub panels: [FigureRect; 4],
    pub count_colorbar: FigureRect,
    pub ratio_colorbar: FigureRect,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1850,
            title: "Eddy density".to_string(),
            font: None,
            font_size: 16.0,
            count_colormap: "terrain_r".to_string(),
            count_range: (0.0, 2.0),
            count_label: "Eddies by 1°^2 by day".to_string(),
            ratio_colormap: "coolwarm_r".to_string(),
            ratio_range: (0.1, 10.0),
            ratio_label: "Ratio cyclonic / Anticyclonic".to_string(),
            masked_color: None,
            grid_step: 5.0,
            xlim: None,
            ylim: None,
            panels: [
                [0.03, 0.75, 0.90, 0.25],
                [0.03, 0.50, 0.90, 0.25],
                [0.03, 0.25, 0.90, 0.25],
                [0.03, 0.00, 0.90, 0.25],
            ],
            count_colorbar: [0.94, 0.27, 0.01, 0.70],
            ratio_colorbar: [0.94, 0.02, 0.01, 0.20],
        }
    }
}

impl FigureConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override the size from `EDDY_FIGURE_WIDTH` and `EDDY_FIGURE_HEIGHT`,
    /// the font from `EDDY_FONT`.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("EDDY_FIGURE_WIDTH") {
            if let Ok(width) = val.trim().parse() {
                self.width = width;
            }
        }

        if let Ok(val) = std::env::var("EDDY_FIGURE_HEIGHT") {
            if let Ok(height) = val.trim().parse() {
                self.height = height;
            }
        }

        if let Ok(val) = std::env::var("EDDY_FONT") {
            if !val.trim().is_empty() {
                self.font = Some(PathBuf::from(val.trim()));
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::Config("figure size must be > 0".to_string()));
        }
        if self.width > 20_000 || self.height > 20_000 {
            return Err(RenderError::Config(format!(
                "figure size {}x{} is too large",
                self.width, self.height
            )));
        }
        if !(self.font_size > 0.0) {
            return Err(RenderError::Config("font_size must be > 0".to_string()));
        }
        self.masked_color()?;
        if !(self.grid_step > 0.0) {
            return Err(RenderError::Config("grid_step must be > 0".to_string()));
        }
        self.count_norm().validate()?;
        self.ratio_norm().validate()?;
        Ok(())
    }

    /// Parsed [`FigureConfig::masked_color`].
    pub fn masked_color(&self) -> RenderResult<Option<Color>> {
        self.masked_color
            .as_deref()
            .map(|hex| {
                hex_to_rgb(hex)
                    .map(|(r, g, b)| Color::rgb(r, g, b))
                    .ok_or_else(|| RenderError::Config(format!("invalid masked_color '{}'", hex)))
            })
            .transpose()
    }

    pub fn count_norm(&self) -> Norm {
        Norm::Linear {
            vmin: self.count_range.0,
            vmax: self.count_range.1,
        }
    }

    pub fn ratio_norm(&self) -> Norm {
        Norm::Log {
            vmin: self.ratio_range.0,
            vmax: self.ratio_range.1,
        }
    }
}

/// Draw the four density panels and their two colorbars.
pub fn render_density_figure(
    composite: &DensityComposite,
    config: &FigureConfig,
) -> RenderResult<Figure> {
    config.validate()?;
    let mut count_cmap = Colormap::resolve(&config.count_colormap)?;
    let mut ratio_cmap = Colormap::resolve(&config.ratio_colormap)?;
    if let Some(bad) = config.masked_color()? {
        count_cmap = count_cmap.with_bad(bad);
        ratio_cmap = ratio_cmap.with_bad(bad);
    }
    let count_norm = config.count_norm();
    let ratio_norm = config.ratio_norm();

    let grid = &composite.grid;
    let extent = Extent {
        x: grid.x_bounds(),
        y: grid.y_bounds(),
    };
    let xlim = config.xlim.unwrap_or((grid.bins.lon.start, grid.bins.lon.stop));
    let ylim = config.ylim.unwrap_or((grid.bins.lat.start, grid.bins.lat.stop));

    let mut figure = Figure::new(config.width, config.height)?;
    if let Some(font) = &config.font {
        figure.load_font(font, config.font_size)?;
    }
    figure.set_title(config.title.clone());

    let panels = [
        ("Anticyclonic frequency", &composite.anticyclonic, &count_cmap, &count_norm),
        ("Cyclonic frequency", &composite.cyclonic, &count_cmap, &count_norm),
        ("All eddies frequency", &composite.combined, &count_cmap, &count_norm),
        ("Ratio cyclonic / Anticyclonic", &composite.ratio, &ratio_cmap, &ratio_norm),
    ];
    for (rect, (title, data, cmap, norm)) in config.panels.iter().zip(panels) {
        let mut axes = figure.add_axes(*rect)?;
        axes.set_xlim(xlim.0, xlim.1)
            .set_ylim(ylim.0, ylim.1)
            .set_aspect_equal()
            .grid(config.grid_step)
            .set_title(title);
        figure.pcolormesh(&axes, data, extent, cmap, norm)?;
        figure.decorate(&axes);
    }

    figure.colorbar(
        config.count_colorbar,
        &count_cmap,
        count_norm,
        Some(config.count_label.as_str()),
    )?;
    figure.colorbar(
        config.ratio_colorbar,
        &ratio_cmap,
        ratio_norm,
        Some(config.ratio_label.as_str()),
    )?;

    info!(
        width = config.width,
        height = config.height,
        defined_ratio_cells = composite.ratio.count_valid(),
        "Rendered density figure"
    );
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FigureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ratio_norm(), Norm::Log { vmin: 0.1, vmax: 10.0 });
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let config = FigureConfig {
            ratio_range: (0.0, 10.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FigureConfig {
            width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_masked_color() {
        let config = FigureConfig {
            masked_color: Some("#c0c0c0".to_string()),
            ..Default::default()
        };
        assert_eq!(config.masked_color().unwrap(), Some(Color::rgb(192, 192, 192)));

        let config = FigureConfig {
            masked_color: Some("grey".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(FigureConfig::default().masked_color().unwrap(), None);
    }

    #[test]
    fn test_from_env_reads_size_and_font() {
        std::env::set_var("EDDY_FIGURE_WIDTH", "640");
        std::env::set_var("EDDY_FONT", "/usr/share/fonts/DejaVuSans.ttf");
        let config = FigureConfig::from_env();
        std::env::remove_var("EDDY_FIGURE_WIDTH");
        std::env::remove_var("EDDY_FONT");
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 1850);
        assert_eq!(config.font, Some(PathBuf::from("/usr/share/fonts/DejaVuSans.ttf")));
    }

    #[test]
    fn test_partial_json_config() {
        let config: FigureConfig = serde_json::from_str(r#"{"width": 600}"#).unwrap();
        assert_eq!(config.width, 600);
        assert_eq!(config.height, 1850);
        assert_eq!(config.count_colormap, "terrain_r");
    }
}
