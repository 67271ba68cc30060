use crate::archive::ParametersArchive;
use crate::error::Result;
use crate::models::model_parameters::ModelParameters;

/// Build boxed model parameters from a decoded archive.
///
/// Archives bypass the constructors, so shapes and values are validated here
/// and a corrupt archive is reported instead of producing an unusable value.
pub fn build_parameters(archive: ParametersArchive) -> Result<Box<dyn ModelParameters>> {
    match archive {
        ParametersArchive::Unified(params) => {
            params.validate()?;
            Ok(Box::new(params))
        }
        ParametersArchive::Rbfn(params) => {
            params.validate()?;
            Ok(Box::new(params))
        }
        ParametersArchive::Lwr(params) => {
            params.validate()?;
            Ok(Box::new(params))
        }
        ParametersArchive::Gpr(params) => {
            params.validate()?;
            Ok(Box::new(params))
        }
        ParametersArchive::Polynomial(params) => {
            params.validate()?;
            Ok(Box::new(params))
        }
    }
}
