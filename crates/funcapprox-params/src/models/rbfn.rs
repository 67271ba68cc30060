use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::archive::ParametersArchive;
use crate::error::{ParamsError, Result};
use crate::models::checks::{ensure_finite, ensure_positive};
use crate::models::model_parameters::ModelParameters;
use crate::models::parameterizable::{block_mask, split_blocks, ParameterSelection, Parameterizable};
use crate::models::unified::ModelParametersUnified;
use crate::render::{fmt_array1, fmt_array2};

pub const CLASS_NAME: &str = "ModelParametersRbfn";

/// Radial basis function network parameters: Gaussian kernels with one weight each.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelParametersRbfn {
    centers: Array2<f64>,
    widths: Array2<f64>,
    weights: Array1<f64>,
    #[serde(default)]
    selection: ParameterSelection,
}

impl ModelParametersRbfn {
    pub fn new(centers: Array2<f64>, widths: Array2<f64>, weights: Array1<f64>) -> Result<Self> {
        let params = Self {
            centers,
            widths,
            weights,
            selection: ParameterSelection::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.widths.shape() != self.centers.shape() {
            return Err(ParamsError::shape(
                "widths",
                self.centers.shape(),
                self.widths.shape(),
            ));
        }
        if self.weights.len() != self.centers.nrows() {
            return Err(ParamsError::shape(
                "weights",
                &[self.centers.nrows()],
                self.weights.shape(),
            ));
        }
        ensure_finite("centers", self.centers.iter())?;
        ensure_positive("widths", self.widths.iter())?;
        ensure_finite("weights", self.weights.iter())?;
        Ok(())
    }

    pub fn centers(&self) -> &Array2<f64> {
        &self.centers
    }

    pub fn widths(&self) -> &Array2<f64> {
        &self.widths
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Weighted sum of the kernel activations.
    pub fn output(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        let activations =
            ModelParametersUnified::kernel_activations_for(&self.centers, &self.widths, inputs, false)?;
        Ok(activations.dot(&self.weights))
    }

    fn unified(&self) -> Result<ModelParametersUnified> {
        ModelParametersUnified::new(
            self.centers.clone(),
            self.widths.clone(),
            Array2::zeros(self.centers.raw_dim()),
            self.weights.clone(),
            false,
            false,
        )
    }
}

impl Parameterizable for ModelParametersRbfn {
    fn selectable_parameters(&self) -> BTreeSet<String> {
        ["centers", "widths", "weights"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn parameter_vector_all(&self) -> Array1<f64> {
        self.centers
            .iter()
            .chain(self.widths.iter())
            .chain(self.weights.iter())
            .copied()
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()> {
        let shape = self.centers.raw_dim();
        let blocks = split_blocks(
            values,
            &[self.centers.len(), self.widths.len(), self.weights.len()],
        )?;
        ensure_finite("parameter vector", values.iter())?;
        ensure_positive("widths", blocks[1].iter())?;
        self.centers = Array2::from_shape_vec(shape, blocks[0].to_vec())
            .map_err(|_| ParamsError::shape("centers", &[shape[0], shape[1]], &[blocks[0].len()]))?;
        self.widths = Array2::from_shape_vec(shape, blocks[1].to_vec())
            .map_err(|_| ParamsError::shape("widths", &[shape[0], shape[1]], &[blocks[1].len()]))?;
        self.weights = Array1::from_vec(blocks[2].to_vec());
        Ok(())
    }

    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize> {
        block_mask(
            &[
                ("centers", self.centers.len()),
                ("widths", self.widths.len()),
                ("weights", self.weights.len()),
            ],
            &self.selectable_parameters(),
            selected,
        )
    }

    fn selection(&self) -> &ParameterSelection {
        &self.selection
    }

    fn selection_mut(&mut self) -> &mut ParameterSelection {
        &mut self.selection
    }
}

impl ModelParameters for ModelParametersRbfn {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.centers.ncols()
    }

    /// Lines with zero slope whose offsets are the weights.
    fn to_unified(&self) -> Option<ModelParametersUnified> {
        self.unified().ok()
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn to_archive(&self) -> ParametersArchive {
        ParametersArchive::Rbfn(self.clone())
    }

    fn save_grid_data(
        &self,
        min: &Array1<f64>,
        max: &Array1<f64>,
        n_samples_per_dim: &Array1<usize>,
        directory: &Path,
        overwrite: bool,
    ) -> Result<bool> {
        self.unified()?
            .save_grid_data(min, max, n_samples_per_dim, directory, overwrite)
    }
}

impl fmt::Display for ModelParametersRbfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ centers: ", CLASS_NAME)?;
        fmt_array2(f, &self.centers)?;
        write!(f, ", widths: ")?;
        fmt_array2(f, &self.widths)?;
        write!(f, ", weights: ")?;
        fmt_array1(f, &self.weights)?;
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn unified_form_has_same_output() {
        let rbfn = ModelParametersRbfn::new(
            array![[0.0, 0.0], [1.0, 0.5]],
            array![[0.4, 0.4], [0.3, 0.6]],
            array![2.0, -1.0],
        )
        .unwrap();
        let inputs = array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0], [-1.0, 2.0]];

        let expected = rbfn.output(&inputs).unwrap();
        let unified = rbfn.to_unified().unwrap().output(&inputs).unwrap();
        for (a, b) in expected.iter().zip(unified.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn weights_must_match_basis_count() {
        let result = ModelParametersRbfn::new(array![[0.0]], array![[1.0]], array![1.0, 2.0]);
        assert!(result.is_err());
    }

    #[test]
    fn infinite_weight_is_rejected() {
        let result = ModelParametersRbfn::new(array![[0.0]], array![[1.0]], array![f64::INFINITY]);
        assert!(matches!(result, Err(ParamsError::InvalidValue { .. })));
    }

    #[test]
    fn zero_width_is_rejected() {
        let result = ModelParametersRbfn::new(
            array![[0.0], [1.0]],
            array![[0.0], [0.5]],
            array![1.0, 1.0],
        );
        assert!(matches!(result, Err(ParamsError::InvalidValue { .. })));
    }

    #[test]
    fn non_finite_parameter_vector_leaves_state_untouched() {
        let mut params = ModelParametersRbfn::new(array![[0.0]], array![[1.0]], array![2.0]).unwrap();
        assert!(params
            .set_parameter_vector_all(&array![0.0, 1.0, f64::NAN])
            .is_err());
        assert_eq!(params.weights()[0], 2.0);
    }
}
