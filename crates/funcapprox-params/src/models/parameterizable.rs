use std::collections::BTreeSet;

use log::warn;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{ParamsError, Result};

/// Labels of the parameter blocks currently exposed to an optimizer.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSelection {
    pub selected: BTreeSet<String>,
}

impl ParameterSelection {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Optimization-facing view of a parameter set: a flat vector of values
/// split into labelled blocks, some of which are selected.
pub trait Parameterizable {
    /// Labels of the blocks this parameter set exposes.
    fn selectable_parameters(&self) -> BTreeSet<String>;

    /// All values, concatenated block by block (matrices row-major).
    fn parameter_vector_all(&self) -> Array1<f64>;

    /// Inverse of `parameter_vector_all`.
    fn set_parameter_vector_all(&mut self, values: &Array1<f64>) -> Result<()>;

    /// For each entry of the full vector, the 1-based index of its block
    /// label in `selectable_parameters()` when that label is in `selected`,
    /// else 0.
    fn parameter_vector_mask(&self, selected: &BTreeSet<String>) -> Array1<usize>;

    fn selection(&self) -> &ParameterSelection;

    fn selection_mut(&mut self) -> &mut ParameterSelection;

    fn parameter_vector_all_size(&self) -> usize {
        self.parameter_vector_all().len()
    }

    /// Select blocks by label. Labels this parameter set does not expose are ignored.
    fn set_selected_parameters(&mut self, labels: &BTreeSet<String>) {
        let selectable = self.selectable_parameters();
        let mut selected = BTreeSet::new();
        for label in labels {
            if selectable.contains(label) {
                selected.insert(label.clone());
            } else {
                warn!("Ignoring unknown parameter label '{}'", label);
            }
        }
        self.selection_mut().selected = selected;
    }

    fn parameter_vector_selected_size(&self) -> usize {
        self.parameter_vector_mask(&self.selection().selected)
            .iter()
            .filter(|&&m| m > 0)
            .count()
    }

    /// Values of the selected blocks only, in full-vector order.
    fn parameter_vector_selected(&self) -> Array1<f64> {
        let all = self.parameter_vector_all();
        let mask = self.parameter_vector_mask(&self.selection().selected);
        all.iter()
            .zip(mask.iter())
            .filter(|(_, m)| **m > 0)
            .map(|(&v, _)| v)
            .collect()
    }

    /// Overwrite the selected blocks, leaving the others unchanged.
    fn set_parameter_vector_selected(&mut self, values: &Array1<f64>) -> Result<()> {
        let mut all = self.parameter_vector_all();
        let mask = self.parameter_vector_mask(&self.selection().selected);
        let n_selected = mask.iter().filter(|&&m| m > 0).count();
        if values.len() != n_selected {
            return Err(ParamsError::dimension(
                "selected parameter vector",
                n_selected,
                values.len(),
            ));
        }

        let mut next = values.iter();
        for (value, &m) in all.iter_mut().zip(mask.iter()) {
            if m > 0 {
                if let Some(&v) = next.next() {
                    *value = v;
                }
            }
        }
        self.set_parameter_vector_all(&all)
    }
}

/// Build a mask for a vector made of consecutive labelled blocks.
///
/// `blocks` lists `(label, block_len)` in full-vector order.
pub fn block_mask(
    blocks: &[(&str, usize)],
    selectable: &BTreeSet<String>,
    selected: &BTreeSet<String>,
) -> Array1<usize> {
    let mut mask = Vec::with_capacity(blocks.iter().map(|(_, len)| len).sum());
    for (label, len) in blocks {
        let index = if selected.contains(*label) {
            selectable
                .iter()
                .position(|s| s == label)
                .map(|p| p + 1)
                .unwrap_or(0)
        } else {
            0
        };
        mask.extend(std::iter::repeat(index).take(*len));
    }
    Array1::from_vec(mask)
}

/// Split `values` into consecutive blocks of the given lengths.
pub(crate) fn split_blocks<'a>(
    values: &'a Array1<f64>,
    lengths: &[usize],
) -> Result<Vec<&'a [f64]>> {
    let expected: usize = lengths.iter().sum();
    if values.len() != expected {
        return Err(ParamsError::dimension("parameter vector", expected, values.len()));
    }
    let slice = values
        .as_slice()
        .ok_or_else(|| ParamsError::Serialization("parameter vector is not contiguous".into()))?;

    let mut blocks = Vec::with_capacity(lengths.len());
    let mut start = 0;
    for len in lengths {
        blocks.push(&slice[start..start + len]);
        start += len;
    }
    Ok(blocks)
}
