use std::fmt;
use std::path::Path;

use ndarray::Array1;

use crate::archive::ParametersArchive;
use crate::error::Result;
use crate::grid::validate_grid_arguments;
use crate::models::parameterizable::Parameterizable;
use crate::models::unified::ModelParametersUnified;

/// The fitted parameters of one function approximator.
///
/// Generic code (serialization, visualization, optimization glue) works on
/// `dyn ModelParameters` only. The string representation comes from the
/// `Display` supertrait, so `to_string()` is available on every parameter set
/// and must be deterministic.
pub trait ModelParameters: Parameterizable + fmt::Display + fmt::Debug + Send + Sync {
    /// Deep copy, independently owned by the caller.
    fn clone_box(&self) -> Box<dyn ModelParameters>;

    /// Dimensionality of the inputs these parameters were fitted for.
    fn expected_input_dim(&self) -> usize;

    /// Projection into the unified representation, `None` when this variant has none.
    fn to_unified(&self) -> Option<ModelParametersUnified>;

    /// Registry tag used in archives.
    fn class_name(&self) -> &'static str;

    /// Tagged archive value holding a copy of the full state.
    fn to_archive(&self) -> ParametersArchive;

    /// Sample the responses of the basis functions on a regular grid and
    /// write them to `directory`.
    ///
    /// Not every parameter set has a meaningful grid response, so the default
    /// only checks the arguments and reports success without writing anything.
    /// With `overwrite == false` existing files are kept and the call returns
    /// `Ok(false)`.
    fn save_grid_data(
        &self,
        min: &Array1<f64>,
        max: &Array1<f64>,
        n_samples_per_dim: &Array1<usize>,
        directory: &Path,
        overwrite: bool,
    ) -> Result<bool> {
        let _ = (directory, overwrite);
        validate_grid_arguments(self.expected_input_dim(), min, max, n_samples_per_dim)?;
        Ok(true)
    }
}

impl Clone for Box<dyn ModelParameters> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
