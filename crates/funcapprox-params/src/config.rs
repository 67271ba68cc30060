use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ParamsError, Result};
use crate::grid::grid_point_count;

/// Grid sampling request for `ModelParameters::save_grid_data`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub n_samples_per_dim: Vec<usize>,

    #[serde(default = "default_grid_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub overwrite: bool,
}

fn default_grid_directory() -> PathBuf {
    PathBuf::from("grid_data")
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min: Vec::new(),
            max: Vec::new(),
            n_samples_per_dim: Vec::new(),
            directory: default_grid_directory(),
            overwrite: false,
        }
    }
}

impl GridConfig {
    pub fn new(
        min: Vec<f64>,
        max: Vec<f64>,
        n_samples_per_dim: Vec<usize>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            min,
            max,
            n_samples_per_dim,
            directory: directory.into(),
            overwrite: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Load a grid configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ParamsError::io(path, e))?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Total number of grid points, `prod(n_samples_per_dim)`.
    pub fn n_points(&self) -> Result<usize> {
        grid_point_count(&self.n_samples_per_dim)
    }
}

/// Concrete model parameter variants known to the archive registry.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametersKind {
    Unified,
    Rbfn,
    Lwr,
    Gpr,
    Polynomial,
}

impl ParametersKind {
    /// Registry tag, the key of the archive's outer object.
    pub fn class_name(&self) -> &'static str {
        match self {
            ParametersKind::Unified => "ModelParametersUnified",
            ParametersKind::Rbfn => "ModelParametersRbfn",
            ParametersKind::Lwr => "ModelParametersLwr",
            ParametersKind::Gpr => "ModelParametersGpr",
            ParametersKind::Polynomial => "ModelParametersPolynomial",
        }
    }
}

impl FromStr for ParametersKind {
    type Err = ParamsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unified" | "modelparametersunified" => Ok(ParametersKind::Unified),
            "rbfn" | "modelparametersrbfn" => Ok(ParametersKind::Rbfn),
            "lwr" | "modelparameterslwr" => Ok(ParametersKind::Lwr),
            "gpr" | "modelparametersgpr" => Ok(ParametersKind::Gpr),
            "polynomial" | "modelparameterspolynomial" => Ok(ParametersKind::Polynomial),
            _ => Err(ParamsError::UnknownKind(s.to_string())),
        }
    }
}
