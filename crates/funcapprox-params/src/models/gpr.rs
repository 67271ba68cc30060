use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::archive::ParametersArchive;
use crate::error::{ParamsError, Result};
use crate::models::checks::{ensure_finite, ensure_positive};
use crate::models::model_parameters::ModelParameters;
use crate::models::parameterizable::{block_mask, split_blocks, ParameterSelection, Parameterizable};
use crate::models::unified::ModelParametersUnified;
use crate::render::{fmt_array1, fmt_array2};

pub const CLASS_NAME: &str = "ModelParametersGpr";

/// Gaussian process regression parameters for a squared-exponential covariance.
///
/// `weights` is the precomputed `K^-1 y` of the training targets, so the
/// mean prediction is `k(x, train_inputs) . weights`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelParametersGpr {
    train_inputs: Array2<f64>,
    weights: Array1<f64>,
    max_covariance: f64,
    length_scales: Array1<f64>,
    #[serde(default)]
    selection: ParameterSelection,
}

impl ModelParametersGpr {
    pub fn new(
        train_inputs: Array2<f64>,
        weights: Array1<f64>,
        max_covariance: f64,
        length_scales: Array1<f64>,
    ) -> Result<Self> {
        let params = Self {
            train_inputs,
            weights,
            max_covariance,
            length_scales,
            selection: ParameterSelection::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.train_inputs.nrows() {
            return Err(ParamsError::shape(
                "weights",
                &[self.train_inputs.nrows()],
                self.weights.shape(),
            ));
        }
        if self.length_scales.len() != self.train_inputs.ncols() {
            return Err(ParamsError::shape(
                "length_scales",
                &[self.train_inputs.ncols()],
                self.length_scales.shape(),
            ));
        }
        ensure_finite("train_inputs", self.train_inputs.iter())?;
        ensure_finite("weights", self.weights.iter())?;
        ensure_finite("max_covariance", std::iter::once(&self.max_covariance))?;
        ensure_positive("length_scales", self.length_scales.iter())?;
        Ok(())
    }

    pub fn train_inputs(&self) -> &Array2<f64> {
        &self.train_inputs
    }

    pub fn max_covariance(&self) -> f64 {
        self.max_covariance
    }

    pub fn length_scales(&self) -> &Array1<f64> {
        &self.length_scales
    }

    /// Mean prediction for `inputs`.
    pub fn output(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        let covariances = ModelParametersUnified::kernel_activations_for(
            &self.train_inputs,
            &self.widths(),
            inputs,
            false,
        )?;
        Ok(covariances.dot(&self.weights) * self.max_covariance)
    }

    /// Length scales repeated for every training input.
    fn widths(&self) -> Array2<f64> {
        let n_train = self.train_inputs.nrows();
        self.length_scales
            .view()
            .insert_axis(Axis(0))
            .broadcast((n_train, self.length_scales.len()))
            .map(|view| view.to_owned())
            .unwrap_or_else(|| Array2::zeros((n_train, self.length_scales.len())))
    }

    fn unified(&self) -> Result<ModelParametersUnified> {
        ModelParametersUnified::new(
            self.train_inputs.clone(),
            self.widths(),
            Array2::zeros(self.train_inputs.raw_dim()),
            &self.weights * self.max_covariance,
            false,
            false,
        )
    }
}

impl Parameterizable for ModelParametersGpr {
    fn selectable_parameters(&self) -> BTreeSet<String> {
        ["weights", "max_covariance", "length_scales"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn parameter_vector_all(&self) -> Array1<f64> {
        self.weights
            .iter()
            .copied()
            .chain(std::iter::once(self.max_covariance))
            .chain(self.length_scales.iter().copied())
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()> {
        let blocks = split_blocks(values, &[self.weights.len(), 1, self.length_scales.len()])?;
        ensure_finite("parameter vector", values.iter())?;
        ensure_positive("length_scales", blocks[2].iter())?;
        self.weights = Array1::from_vec(blocks[0].to_vec());
        self.max_covariance = blocks[1][0];
        self.length_scales = Array1::from_vec(blocks[2].to_vec());
        Ok(())
    }

    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize> {
        block_mask(
            &[
                ("weights", self.weights.len()),
                ("max_covariance", 1),
                ("length_scales", self.length_scales.len()),
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

impl ModelParameters for ModelParametersGpr {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.train_inputs.ncols()
    }

    /// Exact for the squared-exponential covariance: one kernel per training input.
    fn to_unified(&self) -> Option<ModelParametersUnified> {
        self.unified().ok()
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn to_archive(&self) -> ParametersArchive {
        ParametersArchive::Gpr(self.clone())
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

impl fmt::Display for ModelParametersGpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ train_inputs: ", CLASS_NAME)?;
        fmt_array2(f, &self.train_inputs)?;
        write!(f, ", weights: ")?;
        fmt_array1(f, &self.weights)?;
        write!(f, ", max_covariance: {:.6}, length_scales: ", self.max_covariance)?;
        fmt_array1(f, &self.length_scales)?;
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn gpr() -> ModelParametersGpr {
        ModelParametersGpr::new(
            array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            array![0.5, -0.25, 1.0],
            2.0,
            array![0.7, 0.4],
        )
        .unwrap()
    }

    #[test]
    fn prediction_at_training_input_includes_own_weight() {
        let params = gpr();
        let output = params.output(&array![[0.0, 0.0]]).unwrap();
        let expected = 2.0
            * (0.5
                + -0.25 * (-0.5 * (1.0f64 / 0.7).powi(2)).exp()
                + 1.0 * (-0.5 * (1.0f64 / 0.4).powi(2)).exp());
        assert_abs_diff_eq!(output[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn unified_form_has_same_output() {
        let params = gpr();
        let inputs = array![[0.2, 0.3], [1.0, 1.0], [-0.5, 0.5]];
        let expected = params.output(&inputs).unwrap();
        let unified = params.to_unified().unwrap();
        assert_eq!(unified.widths().row(2).to_vec(), vec![0.7, 0.4]);
        let actual = unified.output(&inputs).unwrap();
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn length_scales_must_match_input_dim() {
        let result = ModelParametersGpr::new(array![[0.0, 0.0]], array![1.0], 1.0, array![1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_length_scale_and_infinite_covariance_are_rejected() {
        let zero_scale = ModelParametersGpr::new(array![[0.0]], array![1.0], 1.0, array![0.0]);
        assert!(matches!(zero_scale, Err(ParamsError::InvalidValue { .. })));

        let infinite = ModelParametersGpr::new(array![[0.0]], array![1.0], f64::INFINITY, array![1.0]);
        assert!(matches!(infinite, Err(ParamsError::InvalidValue { .. })));
    }
}
