//! Regular input grids and the files written by `save_grid_data`.
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use itertools_num::linspace;
use log::{debug, warn};
use ndarray::{Array1, Array2};

use crate::error::{ParamsError, Result};

/// Upper bound on the number of points a single grid request may evaluate.
pub const MAX_GRID_POINTS: usize = 1 << 24;

/// Number of points of a grid with `n_samples_per_dim` samples along each axis.
///
/// A grid without dimensions has no points. Fails when the product overflows
/// or exceeds [`MAX_GRID_POINTS`].
pub fn grid_point_count(n_samples_per_dim: &[usize]) -> Result<usize> {
    if n_samples_per_dim.is_empty() {
        return Ok(0);
    }
    let n_points = n_samples_per_dim
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| {
            ParamsError::InvalidGrid(format!(
                "number of grid points for {:?} overflows",
                n_samples_per_dim
            ))
        })?;
    if n_points > MAX_GRID_POINTS {
        return Err(ParamsError::InvalidGrid(format!(
            "{} grid points requested, at most {} allowed",
            n_points, MAX_GRID_POINTS
        )));
    }
    Ok(n_points)
}

/// Check the arguments of a grid request against the dimensionality of the parameters.
///
/// `min`, `max` and `n_samples_per_dim` must all have `expected_dim` entries,
/// every sample count must be at least one, the bounds must be finite with
/// `min[d] <= max[d]` and the grid may not exceed [`MAX_GRID_POINTS`].
pub fn validate_grid_arguments(
    expected_dim: usize,
    min: &Array1<f64>,
    max: &Array1<f64>,
    n_samples_per_dim: &Array1<usize>,
) -> Result<()> {
    if min.len() != expected_dim {
        return Err(ParamsError::dimension("grid min", expected_dim, min.len()));
    }
    if max.len() != expected_dim {
        return Err(ParamsError::dimension("grid max", expected_dim, max.len()));
    }
    if n_samples_per_dim.len() != expected_dim {
        return Err(ParamsError::dimension(
            "grid n_samples_per_dim",
            expected_dim,
            n_samples_per_dim.len(),
        ));
    }
    for dim in 0..expected_dim {
        if n_samples_per_dim[dim] == 0 {
            return Err(ParamsError::InvalidGrid(format!(
                "dimension {} has zero samples",
                dim
            )));
        }
        if !min[dim].is_finite() || !max[dim].is_finite() {
            return Err(ParamsError::InvalidGrid(format!(
                "dimension {}: bounds {} and {} must be finite",
                dim, min[dim], max[dim]
            )));
        }
        if min[dim] > max[dim] {
            return Err(ParamsError::InvalidGrid(format!(
                "dimension {}: min {} is not <= max {}",
                dim, min[dim], max[dim]
            )));
        }
    }
    grid_point_count(&n_samples_per_dim.to_vec())?;
    Ok(())
}

/// Generate the points of a regular grid, one point per row.
///
/// Each axis is `linspace(min[d], max[d], n_samples_per_dim[d])`; the last
/// dimension varies fastest.
pub fn input_grid(
    min: &Array1<f64>,
    max: &Array1<f64>,
    n_samples_per_dim: &Array1<usize>,
) -> Result<Array2<f64>> {
    validate_grid_arguments(min.len(), min, max, n_samples_per_dim)?;

    let n_dims = min.len();
    let axes: Vec<Vec<f64>> = (0..n_dims)
        .map(|d| linspace(min[d], max[d], n_samples_per_dim[d]).collect())
        .collect();
    let n_points = grid_point_count(&n_samples_per_dim.to_vec())?;

    let mut grid = Array2::<f64>::zeros((n_points, n_dims));
    for point in 0..n_points {
        let mut remainder = point;
        for dim in (0..n_dims).rev() {
            let n = n_samples_per_dim[dim];
            grid[(point, dim)] = axes[dim][remainder % n];
            remainder /= n;
        }
    }

    debug!("Generated input grid with {} points in {} dimensions", n_points, n_dims);
    Ok(grid)
}

/// Writes space-separated matrices into a directory, honouring the overwrite policy.
///
/// With `overwrite == false` an existing file is left untouched: the write is
/// skipped with a warning and recorded, so the caller can report the conflict.
#[derive(Debug)]
pub struct GridDataWriter {
    directory: PathBuf,
    overwrite: bool,
    skipped: Vec<PathBuf>,
    written: Vec<PathBuf>,
}

impl GridDataWriter {
    pub fn new<P: AsRef<Path>>(directory: P, overwrite: bool) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|e| ParamsError::io(&directory, e))?;
        Ok(Self {
            directory,
            overwrite,
            skipped: Vec::new(),
            written: Vec::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write a matrix, one row per line. Returns `false` when the file was skipped.
    pub fn write_matrix(&mut self, name: &str, matrix: &Array2<f64>) -> Result<bool> {
        let records = matrix
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        self.write_records(name, records)
    }

    /// Write a vector as a single line.
    pub fn write_vector<T: Display>(&mut self, name: &str, values: &Array1<T>) -> Result<bool> {
        let record = values.iter().map(|v| v.to_string()).collect();
        self.write_records(name, vec![record])
    }

    fn write_records(&mut self, name: &str, records: Vec<Vec<String>>) -> Result<bool> {
        let path = self.directory.join(name);
        if path.exists() && !self.overwrite {
            warn!(
                "Not overwriting existing file {} (set overwrite to replace it)",
                path.display()
            );
            self.skipped.push(path);
            return Ok(false);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| ParamsError::io(&path, io::Error::from(e)))?;
        for record in records {
            writer
                .write_record(&record)
                .map_err(|e| ParamsError::io(&path, io::Error::from(e)))?;
        }
        writer.flush().map_err(|e| ParamsError::io(&path, e))?;

        debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(true)
    }

    /// Files skipped because they already existed.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// `true` when no file had to be skipped.
    pub fn all_written(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Read a matrix written by [`GridDataWriter`].
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ParamsError::io(path, io::Error::from(e)))?;

    let mut values = Vec::new();
    let mut n_cols = None;
    let mut n_rows = 0;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParamsError::io(path, io::Error::from(e)))?;
        match n_cols {
            None => n_cols = Some(record.len()),
            Some(n) if n != record.len() => {
                return Err(ParamsError::dimension(
                    format!("row {} of {}", row_idx + 1, path.display()),
                    n,
                    record.len(),
                ))
            }
            Some(_) => {}
        }
        for field in record.iter() {
            let value = field.parse::<f64>().map_err(|e| {
                ParamsError::Serialization(format!(
                    "invalid value '{}' at row {} of {}: {}",
                    field,
                    row_idx + 1,
                    path.display(),
                    e
                ))
            })?;
            values.push(value);
        }
        n_rows += 1;
    }

    let n_cols = n_cols.unwrap_or(0);
    Array2::from_shape_vec((n_rows, n_cols), values)
        .map_err(|_| ParamsError::shape(path.display().to_string(), &[n_rows, n_cols], &[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn grid_has_product_of_samples_points() {
        let grid = input_grid(&array![0.0, 0.0], &array![1.0, 1.0], &array![3, 3]).unwrap();
        assert_eq!(grid.shape(), &[9, 2]);
        assert_eq!(grid.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(grid.row(1).to_vec(), vec![0.0, 0.5]);
        assert_eq!(grid.row(3).to_vec(), vec![0.5, 0.0]);
        assert_eq!(grid.row(8).to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn single_sample_sits_at_min() {
        let grid = input_grid(&array![2.0], &array![5.0], &array![1]).unwrap();
        assert_eq!(grid.shape(), &[1, 1]);
        assert_eq!(grid[(0, 0)], 2.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = validate_grid_arguments(2, &array![0.0], &array![1.0, 1.0], &array![3, 3])
            .unwrap_err();
        assert!(matches!(err, ParamsError::DimensionMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn zero_samples_and_inverted_bounds_are_rejected() {
        assert!(validate_grid_arguments(1, &array![0.0], &array![1.0], &array![0]).is_err());
        assert!(validate_grid_arguments(1, &array![2.0], &array![1.0], &array![3]).is_err());
    }

    #[test]
    fn overflowing_sample_counts_are_rejected() {
        let err = validate_grid_arguments(
            2,
            &array![0.0, 0.0],
            &array![1.0, 1.0],
            &array![usize::MAX, 2],
        )
        .unwrap_err();
        assert!(matches!(err, ParamsError::InvalidGrid(_)));
        assert!(input_grid(&array![0.0, 0.0], &array![1.0, 1.0], &array![usize::MAX, 2]).is_err());
    }

    #[test]
    fn grid_size_is_capped() {
        assert_eq!(grid_point_count(&[3, 3]).unwrap(), 9);
        assert_eq!(grid_point_count(&[]).unwrap(), 0);
        assert_eq!(grid_point_count(&[MAX_GRID_POINTS]).unwrap(), MAX_GRID_POINTS);
        assert!(grid_point_count(&[MAX_GRID_POINTS, 2]).is_err());
        assert!(grid_point_count(&[1 << 40]).is_err());
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        assert!(validate_grid_arguments(1, &array![f64::NEG_INFINITY], &array![1.0], &array![3]).is_err());
        assert!(validate_grid_arguments(1, &array![0.0], &array![f64::NAN], &array![3]).is_err());
    }

    #[test]
    fn writer_skips_existing_files_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = array![[1.0, 2.0], [3.0, 4.0]];

        let mut first = GridDataWriter::new(dir.path(), false).unwrap();
        assert!(first.write_matrix("m.txt", &matrix).unwrap());
        let before = fs::read_to_string(dir.path().join("m.txt")).unwrap();
        assert_eq!(before, "1 2\n3 4\n");

        let mut second = GridDataWriter::new(dir.path(), false).unwrap();
        assert!(!second.write_matrix("m.txt", &array![[9.0]]).unwrap());
        assert!(!second.all_written());
        assert_eq!(fs::read_to_string(dir.path().join("m.txt")).unwrap(), before);

        let mut third = GridDataWriter::new(dir.path(), true).unwrap();
        assert!(third.write_matrix("m.txt", &array![[9.0]]).unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("m.txt")).unwrap(), "9\n");
    }

    #[test]
    fn written_matrix_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = array![[0.125, -2.0, 3.5], [1e-3, 0.0, 7.0]];
        let mut writer = GridDataWriter::new(dir.path(), false).unwrap();
        writer.write_matrix("m.txt", &matrix).unwrap();
        assert_eq!(read_matrix(dir.path().join("m.txt")).unwrap(), matrix);
    }
}
