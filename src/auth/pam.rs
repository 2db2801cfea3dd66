use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::logger::{SharedLogger, TracingLogger};
use super::Authenticator;
use crate::config::PamConfig;
use crate::error::AuthError;
#[cfg(feature = "pam-auth")]
use crate::pam::NativePam;
use crate::pam::{Credentials, PamBackend, PamStatus, PamStep, PamTransaction, Severity};

pub const DEFAULT_SERVICE: &str = "login";

/// Construction options for [`PamAuthenticator`].
#[derive(Clone)]
pub struct PamOptions {
    /// Name of the policy under `/etc/pam.d`.
    pub service: String,
    /// Where attempt outcomes are reported. `None` keeps the authenticator quiet.
    pub logger: Option<SharedLogger>,
    pub silent: bool,
    pub allow_empty_password: bool,
}

impl Default for PamOptions {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            logger: Some(Arc::new(TracingLogger)),
            silent: false,
            allow_empty_password: false,
        }
    }
}

impl PamOptions {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            ..Self::default()
        }
    }

    pub fn with_logger(mut self, logger: Option<SharedLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn from_config(config: &PamConfig) -> Self {
        Self {
            service: config.service.clone(),
            silent: config.silent,
            allow_empty_password: config.allow_empty_password,
            ..Self::default()
        }
    }
}

/// Checks passwords with `pam_authenticate` followed by `pam_acct_mgmt`.
pub struct PamAuthenticator<B: PamBackend> {
    service: String,
    backend: Arc<B>,
    logger: Option<SharedLogger>,
}

impl<B: PamBackend> Clone for PamAuthenticator<B> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            backend: self.backend.clone(),
            logger: self.logger.clone(),
        }
    }
}

#[cfg(feature = "pam-auth")]
impl PamAuthenticator<NativePam> {
    pub fn new(options: PamOptions) -> Result<Self, AuthError> {
        let backend = NativePam::new(options.silent, options.allow_empty_password);
        Self::with_backend(backend, options)
    }
}

impl<B: PamBackend> PamAuthenticator<B> {
    pub fn with_backend(backend: B, options: PamOptions) -> Result<Self, AuthError> {
        validate_service(&options.service)?;

        Ok(Self {
            service: options.service,
            backend: Arc::new(backend),
            logger: options.logger,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Run the full check and report why it failed, without logging.
    pub fn try_authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(username, password)?;

        let mut transaction = self
            .backend
            .start(&self.service, credentials, self.logger.clone())
            .map_err(|status| AuthError::Pam {
                step: PamStep::Start,
                status,
            })?;

        check(PamStep::Authenticate, transaction.authenticate())?;
        check(PamStep::AccountManagement, transaction.acct_mgmt())?;
        Ok(())
    }

    /// Blocking check. Any failure is logged and reported as `false`.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.try_authenticate(username, password) {
            Ok(()) => {
                if let Some(logger) = &self.logger {
                    logger.info(&format!(
                        "user '{}' authenticated via PAM service '{}'",
                        username, self.service
                    ));
                }
                true
            }
            Err(err) => {
                if let Some(logger) = &self.logger {
                    let msg = failure_message(username, &err);
                    match err.severity() {
                        Severity::Debug => logger.debug(&msg),
                        Severity::Error => logger.error(&msg),
                    }
                }
                false
            }
        }
    }
}

/// Service names are file names under `/etc/pam.d`.
pub fn validate_service(service: &str) -> Result<(), AuthError> {
    if service.trim().is_empty() {
        return Err(AuthError::EmptyService);
    }
    if service.contains('\0') || service.contains('/') {
        return Err(AuthError::InvalidService);
    }
    Ok(())
}

/// `<step> failed for user '<u>': <description> (<NAME>)`
fn failure_message(username: &str, err: &AuthError) -> String {
    let username = username.escape_debug();
    match err {
        AuthError::Pam { step, status } => {
            format!("{} failed for user '{}': {}", step, username, status)
        }
        other => format!("credentials for user '{}' rejected: {}", username, other),
    }
}

fn check(step: PamStep, status: PamStatus) -> Result<(), AuthError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AuthError::Pam { step, status })
    }
}

#[async_trait]
impl<B: PamBackend> Authenticator for PamAuthenticator<B> {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let this = self.clone();
        let username = username.to_string();
        let password = password.to_string();

        let result = tokio::task::spawn_blocking(move || this.authenticate(&username, &password)).await;

        match result {
            Ok(authenticated) => Ok(authenticated),
            Err(join_err) => Err(anyhow!("PAM task panicked: {}", join_err)),
        }
    }
}
