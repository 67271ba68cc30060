mod checks;
pub mod factory;
pub mod gpr;
pub mod lwr;
pub mod model_parameters;
pub mod parameterizable;
pub mod polynomial;
pub mod rbfn;
pub mod unified;

pub use model_parameters::ModelParameters;
pub use parameterizable::{ParameterSelection, Parameterizable};
