use std::sync::Arc;

/// Sink for the messages produced while checking a password.
pub trait AuthLogger: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Forwards everything to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl AuthLogger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "pam_authd", "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "pam_authd", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "pam_authd", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "pam_authd", "{}", msg);
    }
}

pub type SharedLogger = Arc<dyn AuthLogger>;
