//! Persistent archives of model parameters.
//!
//! Every concrete variant has one entry in [`ParametersArchive`], keyed by its
//! class name. Saving goes through `ModelParameters::to_archive`; loading
//! decodes the archive and hands it to [`build_parameters`], which validates
//! the arrays before boxing the variant. Archives carry no version tag.
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ParametersKind;
use crate::error::{ParamsError, Result};
use crate::models::factory::build_parameters;
use crate::models::gpr::ModelParametersGpr;
use crate::models::lwr::ModelParametersLwr;
use crate::models::model_parameters::ModelParameters;
use crate::models::polynomial::ModelParametersPolynomial;
use crate::models::rbfn::ModelParametersRbfn;
use crate::models::unified::ModelParametersUnified;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ParametersArchive {
    #[serde(rename = "ModelParametersUnified")]
    Unified(ModelParametersUnified),
    #[serde(rename = "ModelParametersRbfn")]
    Rbfn(ModelParametersRbfn),
    #[serde(rename = "ModelParametersLwr")]
    Lwr(ModelParametersLwr),
    #[serde(rename = "ModelParametersGpr")]
    Gpr(ModelParametersGpr),
    #[serde(rename = "ModelParametersPolynomial")]
    Polynomial(ModelParametersPolynomial),
}

impl ParametersArchive {
    pub fn kind(&self) -> ParametersKind {
        match self {
            ParametersArchive::Unified(_) => ParametersKind::Unified,
            ParametersArchive::Rbfn(_) => ParametersKind::Rbfn,
            ParametersArchive::Lwr(_) => ParametersKind::Lwr,
            ParametersArchive::Gpr(_) => ParametersKind::Gpr,
            ParametersArchive::Polynomial(_) => ParametersKind::Polynomial,
        }
    }
}

/// Encoding of an archive on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Json,
    Bincode,
}

impl ArchiveFormat {
    /// `.json` files are JSON, everything else is bincode.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_json = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            ArchiveFormat::Json
        } else {
            ArchiveFormat::Bincode
        }
    }
}

pub fn to_bytes(params: &dyn ModelParameters, format: ArchiveFormat) -> Result<Vec<u8>> {
    let archive = params.to_archive();
    let bytes = match format {
        ArchiveFormat::Json => serde_json::to_vec_pretty(&archive)?,
        ArchiveFormat::Bincode => bincode::serialize(&archive)?,
    };
    Ok(bytes)
}

pub fn from_bytes(bytes: &[u8], format: ArchiveFormat) -> Result<Box<dyn ModelParameters>> {
    let archive: ParametersArchive = match format {
        ArchiveFormat::Json => serde_json::from_slice(bytes)?,
        ArchiveFormat::Bincode => bincode::deserialize(bytes)?,
    };
    build_parameters(archive)
}

/// Save `params` to `path`, picking the format from the extension.
pub fn save_parameters<P: AsRef<Path>>(params: &dyn ModelParameters, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ArchiveFormat::from_path(path);
    let bytes = to_bytes(params, format)?;
    fs::write(path, bytes).map_err(|e| ParamsError::io(path, e))?;
    debug!("Saved {} to {} ({:?})", params.class_name(), path.display(), format);
    Ok(())
}

/// Load parameters saved with [`save_parameters`].
pub fn load_parameters<P: AsRef<Path>>(path: P) -> Result<Box<dyn ModelParameters>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ParamsError::io(path, e))?;
    let params = from_bytes(&bytes, ArchiveFormat::from_path(path))?;
    debug!("Loaded {} from {}", params.class_name(), path.display());
    Ok(params)
}
