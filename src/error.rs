use thiserror::Error;

use crate::pam::{PamStatus, PamStep, Severity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("PAM service name must not be empty")]
    EmptyService,

    #[error("PAM service name must not contain NUL bytes or '/'")]
    InvalidService,

    #[error("{field} contains a NUL byte")]
    InvalidInput { field: &'static str },

    #[error("{step} failed: {status}")]
    Pam { step: PamStep, status: PamStatus },
}

impl AuthError {
    /// Log level a failed attempt should be reported at.
    pub fn severity(&self) -> Severity {
        match self {
            AuthError::InvalidInput { .. } => Severity::Debug,
            AuthError::Pam { step, status } => step.severity(*status),
            AuthError::EmptyService | AuthError::InvalidService => Severity::Error,
        }
    }

    /// The PAM status behind this error, if PAM was reached at all.
    pub fn status(&self) -> Option<PamStatus> {
        match self {
            AuthError::Pam { status, .. } => Some(*status),
            _ => None,
        }
    }
}
