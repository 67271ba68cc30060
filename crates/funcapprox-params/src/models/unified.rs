//! Unified model parameters: Gaussian kernels weighting local line segments.
//!
//! The output for an input `x` is `sum_b a_b(x) * l_b(x)`, where `a_b` is the
//! (optionally normalized) activation of kernel `b` and `l_b` its line
//! segment. Radial-basis networks, locally weighted regression and Gaussian
//! process regression with a squared-exponential covariance can all be
//! expressed in this form, which is what makes it useful for model-agnostic
//! inspection and plotting.
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::archive::ParametersArchive;
use crate::error::{ParamsError, Result};
use crate::grid::{input_grid, validate_grid_arguments, GridDataWriter};
use crate::models::checks::{ensure_finite, ensure_positive};
use crate::models::model_parameters::ModelParameters;
use crate::models::parameterizable::{block_mask, split_blocks, ParameterSelection, Parameterizable};
use crate::render::{fmt_array1, fmt_array2};

pub const CLASS_NAME: &str = "ModelParametersUnified";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelParametersUnified {
    /// n_basis x n_dims
    centers: Array2<f64>,
    /// n_basis x n_dims
    widths: Array2<f64>,
    /// n_basis x n_dims
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    normalized_basis_functions: bool,
    lines_pivot_at_max_activation: bool,
    #[serde(default)]
    slopes_as_angles: bool,
    #[serde(default)]
    selection: ParameterSelection,
}

impl ModelParametersUnified {
    /// Create unified parameters.
    ///
    /// # Arguments
    ///
    /// * `centers` - Kernel centers, one row per basis function.
    /// * `widths` - Kernel widths, same shape as `centers`.
    /// * `slopes` - Line slopes, same shape as `centers`.
    /// * `offsets` - Line offsets, one per basis function. When lines pivot at
    ///   the kernel center this is the line value at the center, else at zero.
    /// * `normalized_basis_functions` - Whether activations are normalized to sum to one.
    /// * `lines_pivot_at_max_activation` - Whether lines pivot around the kernel centers.
    pub fn new(
        centers: Array2<f64>,
        widths: Array2<f64>,
        slopes: Array2<f64>,
        offsets: Array1<f64>,
        normalized_basis_functions: bool,
        lines_pivot_at_max_activation: bool,
    ) -> Result<Self> {
        let params = Self {
            centers,
            widths,
            slopes,
            offsets,
            normalized_basis_functions,
            lines_pivot_at_max_activation,
            slopes_as_angles: false,
            selection: ParameterSelection::default(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that all arrays agree on the number of basis functions and dimensions.
    pub fn validate(&self) -> Result<()> {
        let shape = self.centers.shape();
        if self.widths.shape() != shape {
            return Err(ParamsError::shape("widths", shape, self.widths.shape()));
        }
        if self.slopes.shape() != shape {
            return Err(ParamsError::shape("slopes", shape, self.slopes.shape()));
        }
        if self.offsets.len() != self.n_basis_functions() {
            return Err(ParamsError::shape(
                "offsets",
                &[self.n_basis_functions()],
                self.offsets.shape(),
            ));
        }
        ensure_finite("centers", self.centers.iter())?;
        ensure_positive("widths", self.widths.iter())?;
        ensure_finite("slopes", self.slopes.iter())?;
        ensure_finite("offsets", self.offsets.iter())?;
        Ok(())
    }

    pub fn n_basis_functions(&self) -> usize {
        self.centers.nrows()
    }

    pub fn centers(&self) -> &Array2<f64> {
        &self.centers
    }

    pub fn widths(&self) -> &Array2<f64> {
        &self.widths
    }

    pub fn slopes(&self) -> &Array2<f64> {
        &self.slopes
    }

    pub fn offsets(&self) -> &Array1<f64> {
        &self.offsets
    }

    pub fn normalized_basis_functions(&self) -> bool {
        self.normalized_basis_functions
    }

    pub fn lines_pivot_at_max_activation(&self) -> bool {
        self.lines_pivot_at_max_activation
    }

    pub fn slopes_as_angles(&self) -> bool {
        self.slopes_as_angles
    }

    /// Gaussian kernel activations for arbitrary centers and widths.
    ///
    /// Returns an n_samples x n_basis matrix. Normalized rows sum to one; a
    /// row whose kernels are all zero gets uniform activations. Widths must
    /// be strictly positive.
    pub fn kernel_activations_for(
        centers: &Array2<f64>,
        widths: &Array2<f64>,
        inputs: &Array2<f64>,
        normalized_basis_functions: bool,
    ) -> Result<Array2<f64>> {
        if inputs.ncols() != centers.ncols() {
            return Err(ParamsError::dimension("inputs", centers.ncols(), inputs.ncols()));
        }
        if widths.shape() != centers.shape() {
            return Err(ParamsError::shape("widths", centers.shape(), widths.shape()));
        }
        ensure_positive("widths", widths.iter())?;

        let n_samples = inputs.nrows();
        let n_basis = centers.nrows();

        let rows: Vec<Vec<f64>> = (0..n_samples)
            .into_par_iter()
            .map(|sample| {
                let x = inputs.row(sample);
                let mut activations: Vec<f64> = (0..n_basis)
                    .map(|b| {
                        let exponent: f64 = x
                            .iter()
                            .zip(centers.row(b).iter())
                            .zip(widths.row(b).iter())
                            .map(|((xd, cd), wd)| {
                                let z = (xd - cd) / wd;
                                z * z
                            })
                            .sum();
                        (-0.5 * exponent).exp()
                    })
                    .collect();

                if normalized_basis_functions && n_basis > 0 {
                    let sum: f64 = activations.iter().sum();
                    if sum > 0.0 {
                        activations.iter_mut().for_each(|a| *a /= sum);
                    } else if sum == 0.0 {
                        activations.iter_mut().for_each(|a| *a = 1.0 / n_basis as f64);
                    }
                }
                activations
            })
            .collect();

        let data: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((n_samples, n_basis), data)
            .map_err(|_| ParamsError::shape("kernel activations", &[n_samples, n_basis], &[]))
    }

    pub fn kernel_activations(&self, inputs: &Array2<f64>) -> Result<Array2<f64>> {
        Self::kernel_activations_for(
            &self.centers,
            &self.widths,
            inputs,
            self.normalized_basis_functions,
        )
    }

    /// Unweighted output of every line segment, n_samples x n_basis.
    pub fn lines(&self, inputs: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_inputs(inputs)?;

        let mut lines = Array2::<f64>::zeros((inputs.nrows(), self.n_basis_functions()));
        for (sample, x) in inputs.rows().into_iter().enumerate() {
            for b in 0..self.n_basis_functions() {
                let mut value = self.offsets[b];
                for (d, xd) in x.iter().enumerate() {
                    let pivot = if self.lines_pivot_at_max_activation {
                        self.centers[(b, d)]
                    } else {
                        0.0
                    };
                    value += self.slopes[(b, d)] * (xd - pivot);
                }
                lines[(sample, b)] = value;
            }
        }
        Ok(lines)
    }

    /// Sum of the line segments weighted by the kernel activations.
    pub fn locally_weighted_lines(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        let activations = self.kernel_activations(inputs)?;
        let lines = self.lines(inputs)?;
        Ok((activations * lines).sum_axis(Axis(1)))
    }

    /// Output of the function approximator these parameters describe.
    pub fn output(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        self.locally_weighted_lines(inputs)
    }

    /// Move the line pivots between the origin and the kernel centers.
    ///
    /// The offsets are converted so that the represented function does not change.
    pub fn set_lines_pivot_at_max_activation(&mut self, lines_pivot_at_max_activation: bool) {
        if self.lines_pivot_at_max_activation == lines_pivot_at_max_activation {
            return;
        }
        for b in 0..self.n_basis_functions() {
            let at_center = self.slopes.row(b).dot(&self.centers.row(b));
            if lines_pivot_at_max_activation {
                self.offsets[b] += at_center;
            } else {
                self.offsets[b] -= at_center;
            }
        }
        self.lines_pivot_at_max_activation = lines_pivot_at_max_activation;
    }

    /// Expose slopes as angles (`atan(slope)`) in the parameter vector.
    pub fn set_slopes_as_angles(&mut self, slopes_as_angles: bool) {
        self.slopes_as_angles = slopes_as_angles;
    }

    fn check_inputs(&self, inputs: &Array2<f64>) -> Result<()> {
        if inputs.ncols() != self.expected_input_dim() {
            return Err(ParamsError::dimension(
                "inputs",
                self.expected_input_dim(),
                inputs.ncols(),
            ));
        }
        Ok(())
    }

    fn block_lengths(&self) -> [usize; 4] {
        let n = self.centers.len();
        [n, n, n, self.offsets.len()]
    }
}

impl Parameterizable for ModelParametersUnified {
    fn selectable_parameters(&self) -> BTreeSet<String> {
        ["centers", "widths", "slopes", "offsets"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn parameter_vector_all(&self) -> Array1<f64> {
        let slopes = if self.slopes_as_angles {
            self.slopes.mapv(f64::atan)
        } else {
            self.slopes.clone()
        };
        self.centers
            .iter()
            .chain(self.widths.iter())
            .chain(slopes.iter())
            .chain(self.offsets.iter())
            .copied()
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()> {
        let shape = self.centers.raw_dim();
        let blocks = split_blocks(values, &self.block_lengths())?;
        ensure_finite("parameter vector", values.iter())?;
        ensure_positive("widths", blocks[1].iter())?;

        let centers = Array2::from_shape_vec(shape, blocks[0].to_vec())
            .map_err(|_| ParamsError::shape("centers", self.centers.shape(), &[blocks[0].len()]))?;
        let widths = Array2::from_shape_vec(shape, blocks[1].to_vec())
            .map_err(|_| ParamsError::shape("widths", self.widths.shape(), &[blocks[1].len()]))?;
        let mut slopes = Array2::from_shape_vec(shape, blocks[2].to_vec())
            .map_err(|_| ParamsError::shape("slopes", self.slopes.shape(), &[blocks[2].len()]))?;
        if self.slopes_as_angles {
            slopes.mapv_inplace(f64::tan);
        }

        self.centers = centers;
        self.widths = widths;
        self.slopes = slopes;
        self.offsets = Array1::from_vec(blocks[3].to_vec());
        Ok(())
    }

    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize> {
        let [centers, widths, slopes, offsets] = self.block_lengths();
        block_mask(
            &[
                ("centers", centers),
                ("widths", widths),
                ("slopes", slopes),
                ("offsets", offsets),
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

impl ModelParameters for ModelParametersUnified {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.centers.ncols()
    }

    fn to_unified(&self) -> Option<ModelParametersUnified> {
        Some(self.clone())
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn to_archive(&self) -> ParametersArchive {
        ParametersArchive::Unified(self.clone())
    }

    /// Writes `n_samples_per_dim.txt`, `inputs_grid.txt`, `activations.txt`,
    /// `activations_unnormalized.txt` (normalized kernels only), `lines.txt`,
    /// `weighted_lines.txt` and `output.txt`, one grid point per line.
    fn save_grid_data(
        &self,
        min: &Array1<f64>,
        max: &Array1<f64>,
        n_samples_per_dim: &Array1<usize>,
        directory: &Path,
        overwrite: bool,
    ) -> Result<bool> {
        validate_grid_arguments(self.expected_input_dim(), min, max, n_samples_per_dim)?;

        let inputs = input_grid(min, max, n_samples_per_dim)?;
        let activations = self.kernel_activations(&inputs)?;
        let lines = self.lines(&inputs)?;
        let weighted_lines = &activations * &lines;
        let output = weighted_lines.sum_axis(Axis(1)).insert_axis(Axis(1));

        let mut writer = GridDataWriter::new(directory, overwrite)?;
        writer.write_vector("n_samples_per_dim.txt", n_samples_per_dim)?;
        writer.write_matrix("inputs_grid.txt", &inputs)?;
        writer.write_matrix("activations.txt", &activations)?;
        if self.normalized_basis_functions {
            let unnormalized =
                Self::kernel_activations_for(&self.centers, &self.widths, &inputs, false)?;
            writer.write_matrix("activations_unnormalized.txt", &unnormalized)?;
        }
        writer.write_matrix("lines.txt", &lines)?;
        writer.write_matrix("weighted_lines.txt", &weighted_lines)?;
        writer.write_matrix("output.txt", &output)?;

        info!(
            "Saved grid data for {} points to {} ({} files written, {} skipped)",
            inputs.nrows(),
            directory.display(),
            writer.written().len(),
            writer.skipped().len()
        );
        Ok(writer.all_written())
    }
}

impl fmt::Display for ModelParametersUnified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ centers: ", CLASS_NAME)?;
        fmt_array2(f, &self.centers)?;
        write!(f, ", widths: ")?;
        fmt_array2(f, &self.widths)?;
        write!(f, ", slopes: ")?;
        fmt_array2(f, &self.slopes)?;
        write!(f, ", offsets: ")?;
        fmt_array1(f, &self.offsets)?;
        write!(
            f,
            ", normalized_basis_functions: {}, lines_pivot_at_max_activation: {}, \
             slopes_as_angles: {} }}",
            self.normalized_basis_functions,
            self.lines_pivot_at_max_activation,
            self.slopes_as_angles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_kernels_1d(normalized: bool) -> ModelParametersUnified {
        ModelParametersUnified::new(
            array![[0.0], [1.0]],
            array![[0.5], [0.5]],
            array![[1.0], [-2.0]],
            array![0.5, 1.0],
            normalized,
            false,
        )
        .unwrap()
    }

    #[test]
    fn activation_is_one_at_center() {
        let params = two_kernels_1d(false);
        let activations = params.kernel_activations(&array![[0.0], [1.0]]).unwrap();
        assert_abs_diff_eq!(activations[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(activations[(1, 1)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(activations[(0, 1)], (-2.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn normalized_rows_sum_to_one() {
        let params = two_kernels_1d(true);
        let activations = params
            .kernel_activations(&array![[-3.0], [0.3], [0.7], [40.0]])
            .unwrap();
        for row in activations.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        // Far outside the kernels every activation underflows to zero.
        assert_abs_diff_eq!(activations[(3, 0)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn pivot_change_keeps_output() {
        let mut params = two_kernels_1d(true);
        let inputs = array![[-0.5], [0.0], [0.25], [0.8], [1.5]];
        let before = params.output(&inputs).unwrap();

        params.set_lines_pivot_at_max_activation(true);
        let after = params.output(&inputs).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(params.offsets()[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let result = ModelParametersUnified::new(
            array![[0.0, 0.0]],
            array![[1.0]],
            array![[0.0, 0.0]],
            array![0.0],
            false,
            false,
        );
        assert!(matches!(result, Err(ParamsError::InvalidShape { .. })));
    }

    #[test]
    fn zero_and_non_finite_values_are_rejected() {
        let zero_width = ModelParametersUnified::new(
            array![[0.0], [1.0]],
            array![[0.0], [0.5]],
            array![[0.0], [0.0]],
            array![1.0, 1.0],
            true,
            false,
        );
        assert!(matches!(zero_width, Err(ParamsError::InvalidValue { .. })));

        let infinite_offset = ModelParametersUnified::new(
            array![[0.0]],
            array![[0.5]],
            array![[0.0]],
            array![f64::INFINITY],
            false,
            false,
        );
        assert!(matches!(infinite_offset, Err(ParamsError::InvalidValue { .. })));
    }

    #[test]
    fn zero_width_is_not_hidden_by_normalization() {
        let result = ModelParametersUnified::kernel_activations_for(
            &array![[0.0], [1.0]],
            &array![[0.0], [0.5]],
            &array![[0.0]],
            true,
        );
        assert!(matches!(result, Err(ParamsError::InvalidValue { .. })));
    }

    #[test]
    fn non_finite_input_is_not_replaced_by_uniform_row() {
        let params = two_kernels_1d(true);
        let activations = params.kernel_activations(&array![[f64::NAN]]).unwrap();
        assert!(activations.iter().all(|a| a.is_nan()));
    }

    #[test]
    fn parameter_vector_with_zero_width_is_rejected() {
        let mut params = two_kernels_1d(false);
        let mut values = params.parameter_vector_all();
        values[2] = 0.0;
        assert!(params.set_parameter_vector_all(&values).is_err());
        assert_eq!(params, two_kernels_1d(false));
    }

    #[test]
    fn inputs_with_wrong_dimension_are_rejected() {
        let params = two_kernels_1d(false);
        assert!(params.output(&array![[0.0, 1.0]]).is_err());
    }

    #[test]
    fn rendering_distinguishes_slopes_as_angles() {
        let plain = two_kernels_1d(false);
        let mut angles = plain.clone();
        angles.set_slopes_as_angles(true);
        assert_ne!(plain.parameter_vector_all(), angles.parameter_vector_all());
        assert_ne!(plain.to_string(), angles.to_string());
        assert!(angles.to_string().ends_with("slopes_as_angles: true }"));
    }

    #[test]
    fn slopes_as_angles_round_trip() {
        let mut params = two_kernels_1d(false);
        params.set_slopes_as_angles(true);
        let values = params.parameter_vector_all();
        assert_abs_diff_eq!(values[4], 1.0f64.atan(), epsilon = 1e-12);

        params.set_parameter_vector_all(&values).unwrap();
        assert_abs_diff_eq!(params.slopes()[(1, 0)], -2.0, epsilon = 1e-12);
    }
}
