//! Integration tests for the `ModelParameters` contract over `dyn` values.

use std::collections::BTreeSet;

use funcapprox_params::{
    render, ModelParameters, ModelParametersGpr, ModelParametersPolynomial, ModelParametersRbfn,
    Parameterizable,
};
use ndarray::array;

fn rbfn() -> ModelParametersRbfn {
    ModelParametersRbfn::new(
        array![[0.0, 0.0], [1.0, 1.0]],
        array![[0.5, 0.5], [0.5, 0.5]],
        array![1.0, -1.0],
    )
    .unwrap()
}

fn labels(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Cloning
// ---------------------------------------------------------------------------

#[test]
fn clone_renders_identically() {
    let original: Box<dyn ModelParameters> = Box::new(rbfn());
    let copy = original.clone();
    assert_eq!(copy.to_string(), original.to_string());
    assert_eq!(copy.expected_input_dim(), original.expected_input_dim());
}

#[test]
fn mutating_clone_leaves_original_untouched() {
    let original: Box<dyn ModelParameters> = Box::new(rbfn());
    let before = original.to_string();

    let mut copy = original.clone_box();
    copy.set_selected_parameters(&labels(&["weights"]));
    copy.set_parameter_vector_selected(&array![10.0, 20.0]).unwrap();

    assert_eq!(original.to_string(), before);
    assert_ne!(copy.to_string(), before);
    assert!(original.selection().is_empty());
    assert_eq!(copy.parameter_vector_selected().to_vec(), vec![10.0, 20.0]);
}

// ---------------------------------------------------------------------------
// Dimensionality and unified form
// ---------------------------------------------------------------------------

#[test]
fn expected_input_dim_is_stable() {
    let mut params = rbfn();
    assert_eq!(params.expected_input_dim(), 2);
    let all = params.parameter_vector_all();
    params.set_parameter_vector_all(&all.mapv(|v| v * 2.0)).unwrap();
    assert_eq!(params.expected_input_dim(), 2);
    assert_eq!(params.clone_box().expected_input_dim(), 2);
}

#[test]
fn polynomial_has_no_unified_form() {
    let params: Box<dyn ModelParameters> =
        Box::new(ModelParametersPolynomial::new(array![[1.0, 0.5]], 2.0).unwrap());
    assert!(params.to_unified().is_none());
}

#[test]
fn kernel_variants_convert_to_unified() {
    let gpr = ModelParametersGpr::new(array![[0.0], [1.0]], array![1.0, 2.0], 1.5, array![0.3])
        .unwrap();
    let variants: Vec<Box<dyn ModelParameters>> = vec![
        Box::new(rbfn()) as Box<dyn ModelParameters>,
        Box::new(gpr) as Box<dyn ModelParameters>,
    ];
    for params in variants {
        let unified = params.to_unified().expect("kernel variants have a unified form");
        assert_eq!(unified.expected_input_dim(), params.expected_input_dim());
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn render_writes_string_representation() {
    let params = rbfn();
    let mut sink = Vec::new();
    render(&mut sink, &params).unwrap();
    let rendered = String::from_utf8(sink).unwrap();
    assert_eq!(rendered, params.to_string());
    assert!(rendered.starts_with("ModelParametersRbfn"));
    assert!(rendered.contains("weights: [1.000000, -1.000000]"));
}

#[test]
fn to_string_is_deterministic() {
    let params = rbfn();
    assert_eq!(params.to_string(), params.to_string());
    assert_eq!(format!("{}", params), rbfn().to_string());
}

// ---------------------------------------------------------------------------
// Parameterizable
// ---------------------------------------------------------------------------

#[test]
fn selected_vector_follows_mask() {
    let mut params = rbfn();
    assert_eq!(params.parameter_vector_all_size(), 10);

    params.set_selected_parameters(&labels(&["widths", "not_a_label"]));
    assert_eq!(params.selection().selected, labels(&["widths"]));
    assert_eq!(params.parameter_vector_selected_size(), 4);
    assert_eq!(params.parameter_vector_selected().to_vec(), vec![0.5; 4]);

    let mask = params.parameter_vector_mask(&labels(&["widths"]));
    assert_eq!(mask.to_vec(), vec![0, 0, 0, 0, 3, 3, 3, 3, 0, 0]);
}

#[test]
fn selected_vector_length_is_checked() {
    let mut params = rbfn();
    params.set_selected_parameters(&labels(&["weights"]));
    assert!(params.set_parameter_vector_selected(&array![1.0]).is_err());
}
