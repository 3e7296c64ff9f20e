//! Loader -> Binner -> Compositor -> Renderer.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use eddy_grid::{density, grid_count, Bins, CountOptions, DensityComposite, RegularGrid};
use eddy_obs::{
    load_file, sample_data, save_file, Direction, EddyObservations, ExtractOptions,
    ObservationSummary, Polarity,
};
use renderer::render_density_figure;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DensityConfig;

/// What a density run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DensityReport {
    pub output: PathBuf,
    pub shape: (usize, usize),
    pub anticyclonic_observations: usize,
    pub cyclonic_observations: usize,
    pub combined_cells: usize,
    pub ratio_cells: usize,
}

/// Load a dataset given as a path or as a sample-data identifier.
pub fn load(name: &str) -> Result<EddyObservations> {
    let path = sample_data::resolve(name).with_context(|| format!("Cannot locate {}", name))?;
    load_file(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Count (or density when normalizing) of eddy centres on the configured bins.
pub fn bin(obs: &EddyObservations, bins: &Bins, config: &DensityConfig) -> Result<RegularGrid> {
    let name = &config.grid.variable;
    let grid = if config.grid.normalize {
        density(obs, bins, name)?
    } else {
        let options = CountOptions {
            name: name.clone(),
            ..Default::default()
        };
        grid_count(obs, bins, &options)?
    };
    Ok(grid)
}

/// Full pipeline: two datasets in, one PNG figure out.
pub fn run_density(
    anticyclonic: &str,
    cyclonic: &str,
    config: &DensityConfig,
    output: &Path,
) -> Result<DensityReport> {
    config.validate()?;
    let bins = config.grid.bins()?;

    let a = load(anticyclonic)?;
    let c = load(cyclonic)?;
    check_polarity(&a, Polarity::Anticyclonic, anticyclonic);
    check_polarity(&c, Polarity::Cyclonic, cyclonic);
    if a.is_empty() || c.is_empty() {
        bail!("Cannot compute densities from an empty dataset");
    }

    let grid_a = bin(&a, &bins, config).context("Failed to grid anticyclonic eddies")?;
    let grid_c = bin(&c, &bins, config).context("Failed to grid cyclonic eddies")?;
    let composite = DensityComposite::build(&grid_a, &grid_c, &config.grid.variable)?;

    let figure = render_density_figure(&composite, &config.figure)?;
    figure
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let report = DensityReport {
        output: output.to_path_buf(),
        shape: composite.grid.shape(),
        anticyclonic_observations: a.len(),
        cyclonic_observations: c.len(),
        combined_cells: composite.combined.count_valid(),
        ratio_cells: composite.ratio.count_valid(),
    };
    info!(
        output = %output.display(),
        nx = report.shape.0,
        ny = report.shape.1,
        combined_cells = report.combined_cells,
        ratio_cells = report.ratio_cells,
        "Density figure written"
    );
    Ok(report)
}

fn check_polarity(obs: &EddyObservations, expected: Polarity, name: &str) {
    if obs.polarity() != expected {
        warn!(
            dataset = name,
            found = %obs.polarity(),
            expected = %expected,
            "Dataset polarity differs from its role"
        );
    }
}

pub fn run_summary(name: &str) -> Result<ObservationSummary> {
    let obs = load(name)?;
    obs.summary()
        .with_context(|| format!("{} holds no observation", name))
}

/// Track selection applied by `subset`, in this order: period, length,
/// direction, id compression.
#[derive(Debug, Clone, Default)]
pub struct SubsetOptions {
    pub period: Option<(i64, i64)>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub direction: Option<Direction>,
    pub min_delta: f64,
    pub full_path: bool,
    pub remove_incomplete: bool,
    pub compress_id: bool,
}

pub fn run_subset(name: &str, output: &Path, options: &SubsetOptions) -> Result<usize> {
    let mut obs = load(name)?;
    let before = obs.len();

    if let Some(period) = options.period {
        let extract = ExtractOptions {
            full_path: options.full_path,
            remove_incomplete: options.remove_incomplete,
            ..Default::default()
        };
        obs = obs.extract_with_period(period, extract)?;
    }
    if options.min_length.is_some() || options.max_length.is_some() {
        let bounds = (options.min_length.unwrap_or(-1), options.max_length.unwrap_or(-1));
        obs = obs.extract_with_length(bounds)?;
    }
    if let Some(direction) = options.direction {
        obs = obs.extract_in_direction(direction, options.min_delta)?;
    }
    if options.compress_id {
        obs.compress_track_ids();
    }

    save_file(&obs, output).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        input = name,
        output = %output.display(),
        before,
        after = obs.len(),
        tracks = obs.nb_tracks(),
        "Subset written"
    );
    Ok(obs.len())
}
