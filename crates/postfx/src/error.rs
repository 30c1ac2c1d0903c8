use thiserror::Error;

use crate::types::StageKind;

/// Result of asking a source provider for a shader it cannot supply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("shader '{0}' not found")]
    NotFound(String),

    #[error("shader '{id}' is malformed: {reason}")]
    Malformed { id: String, reason: String },
}

/// Everything that can go wrong in the shader subsystem.
///
/// Only `CapabilityUnavailable` prevents the subsystem from being built; the
/// other variants are recorded on the program they affect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("programmable pipeline unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to compile {stage} stage of shader '{id}':\n{log}")]
    Compile {
        id: String,
        stage: StageKind,
        log: String,
    },

    #[error("failed to link shader '{id}':\n{log}")]
    Link { id: String, log: String },

    #[error("OpenGL error {code:#06x} while setting up shader '{id}'")]
    Driver { id: String, code: u32 },
}

impl ShaderError {
    /// Diagnostic text reported by the driver, when the error carries one.
    pub fn driver_log(&self) -> Option<&str> {
        match self {
            Self::Compile { log, .. } | Self::Link { log, .. } => Some(log.as_str()),
            _ => None,
        }
    }
}
