use std::env;
use std::path::PathBuf;

use funcapprox_params::{render, ModelParameters, ModelParametersRbfn};
use ndarray::array;

fn main() {
    env_logger::init();

    // Three kernels along the diagonal of the unit square
    let params = ModelParametersRbfn::new(
        array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]],
        array![[0.2, 0.2], [0.2, 0.2], [0.2, 0.2]],
        array![1.0, -0.5, 2.0],
    )
    .expect("failed to create RBFN parameters");

    render(&mut std::io::stdout(), &params).expect("failed to render parameters");
    println!();

    let directory = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("rbfn_grid_data"));

    let ok = params
        .save_grid_data(
            &array![0.0, 0.0],
            &array![1.0, 1.0],
            &array![21, 21],
            &directory,
            true,
        )
        .expect("failed to save grid data");

    println!("Grid data written to {} (complete: {})", directory.display(), ok);
}
