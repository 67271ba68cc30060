//! funcapprox-params: model parameters of function approximators.
//!
//! Every concrete parameter set (radial basis function network, locally
//! weighted regression, Gaussian process regression, polynomial and the
//! unified kernel/line-segment form) implements the
//! [`ModelParameters`](models::ModelParameters) contract, so generic code can
//! clone, render, convert, sample and persist parameters without knowing the
//! concrete type.
//!
//! Grid sampling writes the responses of the basis functions to plain text
//! files for plotting; archives are JSON or bincode, keyed by class name.
pub mod archive;
pub mod config;
pub mod error;
pub mod grid;
pub mod models;
pub mod render;

pub use archive::{load_parameters, save_parameters, ArchiveFormat, ParametersArchive};
pub use error::{ParamsError, Result};
pub use models::factory::build_parameters;
pub use models::gpr::ModelParametersGpr;
pub use models::lwr::ModelParametersLwr;
pub use models::polynomial::ModelParametersPolynomial;
pub use models::rbfn::ModelParametersRbfn;
pub use models::unified::ModelParametersUnified;
pub use models::{ModelParameters, ParameterSelection, Parameterizable};
pub use render::render;
