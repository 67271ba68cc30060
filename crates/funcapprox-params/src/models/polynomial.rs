use std::collections::BTreeSet;
use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::archive::ParametersArchive;
use crate::error::{ParamsError, Result};
use crate::models::checks::ensure_finite;
use crate::models::model_parameters::ModelParameters;
use crate::models::parameterizable::{block_mask, split_blocks, ParameterSelection, Parameterizable};
use crate::models::unified::ModelParametersUnified;
use crate::render::fmt_array2;

pub const CLASS_NAME: &str = "ModelParametersPolynomial";

/// Additive polynomial: `intercept + sum_d sum_k coefficients[d, k] * x_d^(k + 1)`.
///
/// There are no basis functions, so this variant has neither a unified form
/// nor grid data.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelParametersPolynomial {
    /// n_dims x degree
    coefficients: Array2<f64>,
    intercept: f64,
    #[serde(default)]
    selection: ParameterSelection,
}

impl ModelParametersPolynomial {
    pub fn new(coefficients: Array2<f64>, intercept: f64) -> Result<Self> {
        let params = Self {
            coefficients,
            intercept,
            selection: ParameterSelection::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("coefficients", self.coefficients.iter())?;
        ensure_finite("intercept", std::iter::once(&self.intercept))
    }

    pub fn degree(&self) -> usize {
        self.coefficients.ncols()
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn output(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        if inputs.ncols() != self.expected_input_dim() {
            return Err(ParamsError::dimension(
                "inputs",
                self.expected_input_dim(),
                inputs.ncols(),
            ));
        }
        Ok(inputs
            .rows()
            .into_iter()
            .map(|x| {
                let mut value = self.intercept;
                for (d, xd) in x.iter().enumerate() {
                    let mut power = 1.0;
                    for k in 0..self.degree() {
                        power *= xd;
                        value += self.coefficients[(d, k)] * power;
                    }
                }
                value
            })
            .collect())
    }
}

impl Parameterizable for ModelParametersPolynomial {
    fn selectable_parameters(&self) -> BTreeSet<String> {
        ["coefficients", "intercept"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn parameter_vector_all(&self) -> Array1<f64> {
        self.coefficients
            .iter()
            .copied()
            .chain(std::iter::once(self.intercept))
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()> {
        let shape = self.coefficients.raw_dim();
        let blocks = split_blocks(values, &[self.coefficients.len(), 1])?;
        ensure_finite("parameter vector", values.iter())?;
        self.coefficients = Array2::from_shape_vec(shape, blocks[0].to_vec()).map_err(|_| {
            ParamsError::shape("coefficients", &[shape[0], shape[1]], &[blocks[0].len()])
        })?;
        self.intercept = blocks[1][0];
        Ok(())
    }

    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize> {
        block_mask(
            &[("coefficients", self.coefficients.len()), ("intercept", 1)],
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

impl ModelParameters for ModelParametersPolynomial {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.coefficients.nrows()
    }

    fn to_unified(&self) -> Option<ModelParametersUnified> {
        None
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn to_archive(&self) -> ParametersArchive {
        ParametersArchive::Polynomial(self.clone())
    }
}

impl fmt::Display for ModelParametersPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ coefficients: ", CLASS_NAME)?;
        fmt_array2(f, &self.coefficients)?;
        write!(f, ", intercept: {:.6} }}", self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn output_sums_powers_per_dimension() {
        let params = ModelParametersPolynomial::new(array![[1.0, 2.0], [0.0, -1.0]], 3.0).unwrap();
        let output = params.output(&array![[2.0, 1.0]]).unwrap();
        // 3 + (1*2 + 2*4) + (0*1 + -1*1)
        assert_eq!(output[0], 12.0);
    }

    #[test]
    fn has_no_unified_form() {
        let params = ModelParametersPolynomial::new(array![[1.0]], 0.0).unwrap();
        assert!(params.to_unified().is_none());
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        assert!(ModelParametersPolynomial::new(array![[f64::NAN]], 0.0).is_err());
        assert!(ModelParametersPolynomial::new(array![[1.0]], f64::INFINITY).is_err());

        let mut params = ModelParametersPolynomial::new(array![[1.0]], 0.0).unwrap();
        assert!(params
            .set_parameter_vector_all(&array![f64::NEG_INFINITY, 0.0])
            .is_err());
        assert_eq!(params.coefficients()[(0, 0)], 1.0);
    }
}
