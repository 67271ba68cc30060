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

pub const CLASS_NAME: &str = "ModelParametersLwr";

/// Locally weighted regression parameters: line segments blended by normalized Gaussian kernels.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelParametersLwr {
    centers: Array2<f64>,
    widths: Array2<f64>,
    slopes: Array2<f64>,
    offsets: Array1<f64>,
    #[serde(default)]
    lines_pivot_at_max_activation: bool,
    #[serde(default)]
    selection: ParameterSelection,
}

impl ModelParametersLwr {
    pub fn new(
        centers: Array2<f64>,
        widths: Array2<f64>,
        slopes: Array2<f64>,
        offsets: Array1<f64>,
        lines_pivot_at_max_activation: bool,
    ) -> Result<Self> {
        let params = Self {
            centers,
            widths,
            slopes,
            offsets,
            lines_pivot_at_max_activation,
            selection: ParameterSelection::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let shape = self.centers.shape();
        if self.widths.shape() != shape {
            return Err(ParamsError::shape("widths", shape, self.widths.shape()));
        }
        if self.slopes.shape() != shape {
            return Err(ParamsError::shape("slopes", shape, self.slopes.shape()));
        }
        if self.offsets.len() != self.centers.nrows() {
            return Err(ParamsError::shape(
                "offsets",
                &[self.centers.nrows()],
                self.offsets.shape(),
            ));
        }
        ensure_finite("centers", self.centers.iter())?;
        ensure_positive("widths", self.widths.iter())?;
        ensure_finite("slopes", self.slopes.iter())?;
        ensure_finite("offsets", self.offsets.iter())?;
        Ok(())
    }

    pub fn slopes(&self) -> &Array2<f64> {
        &self.slopes
    }

    pub fn offsets(&self) -> &Array1<f64> {
        &self.offsets
    }

    pub fn output(&self, inputs: &Array2<f64>) -> Result<Array1<f64>> {
        self.unified()?.output(inputs)
    }

    fn unified(&self) -> Result<ModelParametersUnified> {
        ModelParametersUnified::new(
            self.centers.clone(),
            self.widths.clone(),
            self.slopes.clone(),
            self.offsets.clone(),
            true,
            self.lines_pivot_at_max_activation,
        )
    }
}

impl Parameterizable for ModelParametersLwr {
    fn selectable_parameters(&self) -> BTreeSet<String> {
        ["centers", "widths", "slopes", "offsets"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn parameter_vector_all(&self) -> Array1<f64> {
        self.centers
            .iter()
            .chain(self.widths.iter())
            .chain(self.slopes.iter())
            .chain(self.offsets.iter())
            .copied()
            .collect()
    }

    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()> {
        let shape = self.centers.raw_dim();
        let n = self.centers.len();
        let blocks = split_blocks(values, &[n, n, n, self.offsets.len()])?;
        ensure_finite("parameter vector", values.iter())?;
        ensure_positive("widths", blocks[1].iter())?;
        let matrix = |what: &str, block: &[f64]| {
            Array2::from_shape_vec(shape, block.to_vec())
                .map_err(|_| ParamsError::shape(what, &[shape[0], shape[1]], &[block.len()]))
        };
        let centers = matrix("centers", blocks[0])?;
        let widths = matrix("widths", blocks[1])?;
        let slopes = matrix("slopes", blocks[2])?;

        self.centers = centers;
        self.widths = widths;
        self.slopes = slopes;
        self.offsets = Array1::from_vec(blocks[3].to_vec());
        Ok(())
    }

    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize> {
        let n = self.centers.len();
        block_mask(
            &[
                ("centers", n),
                ("widths", n),
                ("slopes", n),
                ("offsets", self.offsets.len()),
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

impl ModelParameters for ModelParametersLwr {
    fn clone_box(&self) -> Box<dyn ModelParameters> {
        Box::new(self.clone())
    }

    fn expected_input_dim(&self) -> usize {
        self.centers.ncols()
    }

    fn to_unified(&self) -> Option<ModelParametersUnified> {
        self.unified().ok()
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn to_archive(&self) -> ParametersArchive {
        ParametersArchive::Lwr(self.clone())
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

impl fmt::Display for ModelParametersLwr {
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
            ", lines_pivot_at_max_activation: {} }}",
            self.lines_pivot_at_max_activation
        )
    }
}
