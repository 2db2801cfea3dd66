//! PAM status codes plus the backend seam, with a libpam implementation
//! built on `pam-client`.

use crate::auth::logger::SharedLogger;
use crate::error::AuthError;

#[cfg(feature = "pam-auth")]
mod converse;
#[cfg(feature = "pam-auth")]
mod native;
mod status;

#[cfg(feature = "pam-auth")]
pub use converse::CredentialConversation;
#[cfg(feature = "pam-auth")]
pub use native::{NativePam, NativeTransaction};
pub use status::{PamStatus, PamStep, Severity};

/// Username and password for a single attempt, checked for interior NUL
/// bytes so they can be handed to C.
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, AuthError> {
        if username.contains('\0') {
            return Err(AuthError::InvalidInput { field: "username" });
        }
        if password.contains('\0') {
            return Err(AuthError::InvalidInput { field: "password" });
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Opens PAM transactions for a service.
pub trait PamBackend: Send + Sync + 'static {
    type Transaction: PamTransaction;

    fn start(
        &self,
        service: &str,
        credentials: Credentials,
        logger: Option<SharedLogger>,
    ) -> Result<Self::Transaction, PamStatus>;
}

/// One open PAM handle. Dropping it ends the transaction.
pub trait PamTransaction {
    fn authenticate(&mut self) -> PamStatus;

    fn acct_mgmt(&mut self) -> PamStatus;
}
