use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use ndarray::Array1;
use std::path::{Path, PathBuf};

use funcapprox_params::config::GridConfig;
use funcapprox_params::load_parameters;

/// Build the grid request from an optional JSON file plus command line overrides.
///
/// Flags take precedence over the file. Without either, the parameters are
/// rejected later when the empty grid does not match their input dimension.
pub fn grid_config_from_arguments(matches: &ArgMatches) -> Result<GridConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => GridConfig::from_json_file(path)
            .with_context(|| format!("Failed to read grid config: {:?}", path))?,
        None => GridConfig::default(),
    };

    if let Some(min) = matches.get_many::<f64>("min") {
        config.min = min.copied().collect();
    }
    if let Some(max) = matches.get_many::<f64>("max") {
        config.max = max.copied().collect();
    }
    if let Some(samples) = matches.get_many::<usize>("samples") {
        config.n_samples_per_dim = samples.copied().collect();
    }
    if let Some(directory) = matches.get_one::<PathBuf>("output_dir") {
        config.directory = directory.clone();
    }
    if matches.get_flag("overwrite") {
        config.overwrite = true;
    }

    Ok(config)
}

/// Write the grid data of the parameters in `archive`.
///
/// Returns `Ok(false)` when some files already existed and were left in place.
pub fn run_grid(archive: &Path, config: &GridConfig) -> Result<bool> {
    let n_points = config.n_points().context("Invalid grid configuration")?;
    let params = load_parameters(archive)
        .with_context(|| format!("Failed to load parameters from {:?}", archive))?;
    log::debug!(
        "Sampling {} on {} grid points into {:?}",
        params.class_name(),
        n_points,
        config.directory
    );

    let all_written = params
        .save_grid_data(
            &Array1::from(config.min.clone()),
            &Array1::from(config.max.clone()),
            &Array1::from(config.n_samples_per_dim.clone()),
            &config.directory,
            config.overwrite,
        )
        .with_context(|| {
            format!(
                "Failed to write grid data for {} to {:?}",
                params.class_name(),
                config.directory
            )
        })?;

    if params.to_unified().is_none() {
        log::warn!(
            "{} has no basis functions; no grid data was written",
            params.class_name()
        );
    }
    Ok(all_written)
}

/// Same as [`run_grid`], but a skipped file is an error.
pub fn run_grid_strict(archive: &Path, config: &GridConfig) -> Result<()> {
    if !run_grid(archive, config)? {
        bail!(
            "Some grid files in {:?} already existed and were kept; pass --overwrite to replace them",
            config.directory
        );
    }
    Ok(())
}
