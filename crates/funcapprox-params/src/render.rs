//! Textual rendering of model parameters.
//!
//! Every parameter set renders through its `Display` implementation, so
//! generic code can write any `dyn ModelParameters` to a sink without knowing
//! the concrete type. The array helpers keep the output format identical
//! across variants, which makes the rendered string usable as a cheap
//! equality witness in round-trip tests.
use std::fmt;
use std::io;

use ndarray::{Array1, Array2};

use crate::models::model_parameters::ModelParameters;

/// Write the string representation of `params` to `sink`.
pub fn render<W: io::Write + ?Sized>(sink: &mut W, params: &dyn ModelParameters) -> io::Result<()> {
    write!(sink, "{}", params)
}

/// Format a vector as `[v0, v1, ...]` with a fixed precision.
pub fn fmt_array1(f: &mut fmt::Formatter<'_>, values: &Array1<f64>) -> fmt::Result {
    write!(f, "[")?;
    for (idx, value) in values.iter().enumerate() {
        write!(f, "{:.6}", value)?;
        if idx + 1 != values.len() {
            write!(f, ", ")?;
        }
    }
    write!(f, "]")
}

/// Format a matrix row by row as `[[a, b], [c, d]]`.
pub fn fmt_array2(f: &mut fmt::Formatter<'_>, values: &Array2<f64>) -> fmt::Result {
    write!(f, "[")?;
    for (row_idx, row) in values.rows().into_iter().enumerate() {
        write!(f, "[")?;
        for (idx, value) in row.iter().enumerate() {
            write!(f, "{:.6}", value)?;
            if idx + 1 != row.len() {
                write!(f, ", ")?;
            }
        }
        write!(f, "]")?;
        if row_idx + 1 != values.nrows() {
            write!(f, ", ")?;
        }
    }
    write!(f, "]")
}
