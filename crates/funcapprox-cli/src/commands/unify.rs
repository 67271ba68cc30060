use anyhow::{Context, Result};
use std::path::Path;

use funcapprox_params::{load_parameters, save_parameters, ModelParametersUnified};

/// Convert the parameters in `input` to the unified representation and save
/// them to `output`. The archive format follows each file's extension.
pub fn run_unify(input: &Path, output: &Path) -> Result<ModelParametersUnified> {
    let params = load_parameters(input)
        .with_context(|| format!("Failed to load parameters from {:?}", input))?;
    let unified = params.to_unified().with_context(|| {
        format!(
            "{} in {:?} has no unified representation",
            params.class_name(),
            input
        )
    })?;
    save_parameters(&unified, output)
        .with_context(|| format!("Failed to write unified parameters to {:?}", output))?;
    log::info!(
        "Converted {} to {} with {} basis functions",
        params.class_name(),
        funcapprox_params::models::unified::CLASS_NAME,
        unified.centers().nrows()
    );
    Ok(unified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcapprox_params::{ModelParametersPolynomial, ModelParametersRbfn};
    use ndarray::array;

    #[test]
    fn rbfn_archive_converts_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rbfn.bin");
        let output = dir.path().join("unified.json");
        let params = ModelParametersRbfn::new(
            array![[0.0, 0.0], [1.0, 1.0]],
            array![[0.5, 0.5], [0.5, 0.5]],
            array![1.0, -1.0],
        )
        .unwrap();
        save_parameters(&params, &input).unwrap();

        let unified = run_unify(&input, &output).unwrap();
        let reloaded = load_parameters(&output).unwrap();
        assert_eq!(reloaded.class_name(), "ModelParametersUnified");
        assert_eq!(reloaded.to_string(), unified.to_string());
    }

    #[test]
    fn polynomial_has_nothing_to_convert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("poly.json");
        let output = dir.path().join("unified.json");
        save_parameters(&ModelParametersPolynomial::new(array![[1.0]], 0.0).unwrap(), &input).unwrap();

        let err = run_unify(&input, &output).unwrap_err();
        assert!(err.to_string().contains("no unified representation"));
        assert!(!output.exists());
    }
}
