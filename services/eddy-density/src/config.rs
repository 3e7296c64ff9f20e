//! Configuration for the density pipeline.
//!
//! Sources are layered: defaults, then an optional YAML file, then
//! environment variables, then command line flags (applied by the caller).
//!
//! ```yaml
//! grid:
//!   step: 0.25
//!   lon_range: [-10.0, 37.0]
//!   lat_range: [30.0, 46.0]
//! figure:
//!   width: 1200
//!   count_colormap: viridis
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use eddy_grid::GridConfig;
use renderer::FigureConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub grid: GridConfig,
    pub figure: FigureConfig,
}

impl DensityConfig {
    /// Defaults, overlaid with `path` when given, then with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.grid.apply_env();
                config.figure.apply_env();
                config
            }
            None => Self {
                grid: GridConfig::from_env(),
                figure: FigureConfig::from_env(),
            },
        };
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path.as_ref()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate().context("Invalid grid configuration")?;
        self.figure
            .validate()
            .context("Invalid figure configuration")?;
        Ok(())
    }
}
