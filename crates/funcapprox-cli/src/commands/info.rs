use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use funcapprox_params::config::ParametersKind;
use funcapprox_params::{load_parameters, render, ModelParameters};

/// Describe the parameters stored in `archive` and print them in full.
pub fn run_info<W: Write>(archive: &Path, sink: &mut W) -> Result<()> {
    let params = load_parameters(archive)
        .with_context(|| format!("Failed to load parameters from {:?}", archive))?;
    write_summary(params.as_ref(), sink)?;
    render(sink, params.as_ref())?;
    writeln!(sink)?;
    Ok(())
}

pub fn write_summary<W: Write>(params: &dyn ModelParameters, sink: &mut W) -> Result<()> {
    let kind: ParametersKind = params.class_name().parse()?;
    writeln!(sink, "class:              {}", params.class_name())?;
    writeln!(sink, "kind:               {:?}", kind)?;
    writeln!(sink, "input dimensions:   {}", params.expected_input_dim())?;
    writeln!(sink, "parameters:         {}", params.parameter_vector_all_size())?;
    let labels: Vec<String> = params.selectable_parameters().into_iter().collect();
    writeln!(sink, "selectable:         {}", labels.join(", "))?;
    writeln!(
        sink,
        "unified form:       {}",
        if params.to_unified().is_some() { "yes" } else { "no" }
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcapprox_params::{save_parameters, ModelParametersRbfn};
    use ndarray::array;

    #[test]
    fn info_reports_class_and_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rbfn.json");
        let params =
            ModelParametersRbfn::new(array![[0.0], [1.0]], array![[0.5], [0.5]], array![1.0, 2.0])
                .unwrap();
        save_parameters(&params, &path).unwrap();

        let mut out = Vec::new();
        run_info(&path, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("class:              ModelParametersRbfn"));
        assert!(text.contains("input dimensions:   1"));
        assert!(text.contains("parameters:         6"));
        assert!(text.contains("unified form:       yes"));
    }

    #[test]
    fn missing_archive_is_an_error() {
        let mut out = Vec::new();
        assert!(run_info(Path::new("/nonexistent/params.json"), &mut out).is_err());
    }
}
