use std::ffi::CString;

use pam_client::{Context, Flag};
use tracing::trace;

use crate::auth::logger::SharedLogger;

use super::converse::CredentialConversation;
use super::{Credentials, PamBackend, PamStatus, PamTransaction};

/// Backend that talks to the host's libpam through `pam-client`.
#[derive(Debug, Clone, Copy)]
pub struct NativePam {
    silent: bool,
    allow_empty_password: bool,
}

impl NativePam {
    pub fn new(silent: bool, allow_empty_password: bool) -> Self {
        Self {
            silent,
            allow_empty_password,
        }
    }

    fn flags(&self) -> Flag {
        let mut flags = Flag::NONE;
        if self.silent {
            flags = flags | Flag::SILENT;
        }
        if !self.allow_empty_password {
            flags = flags | Flag::DISALLOW_NULL_AUTHTOK;
        }
        flags
    }
}

impl Default for NativePam {
    fn default() -> Self {
        Self::new(false, false)
    }
}

fn status_of(err: &pam_client::Error) -> PamStatus {
    PamStatus::from_code(err.code() as i32)
}

impl PamBackend for NativePam {
    type Transaction = NativeTransaction;

    fn start(
        &self,
        service: &str,
        credentials: Credentials,
        logger: Option<SharedLogger>,
    ) -> Result<NativeTransaction, PamStatus> {
        let username = CString::new(credentials.username()).map_err(|_| PamStatus::BufferError)?;
        let password = CString::new(credentials.password()).map_err(|_| PamStatus::BufferError)?;
        let conversation = CredentialConversation::new(username, password, logger);

        let context = Context::new(service, Some(credentials.username()), conversation).map_err(|e| {
            trace!("pam_start({}) failed: {}", service, e);
            status_of(&e)
        })?;

        Ok(NativeTransaction {
            context,
            flags: self.flags(),
        })
    }
}

/// Open PAM context; `pam-client` ends it when dropped.
pub struct NativeTransaction {
    context: Context<CredentialConversation>,
    flags: Flag,
}

impl NativeTransaction {
    fn record(&self, result: pam_client::Result<()>) -> PamStatus {
        let status = match result {
            Ok(()) => PamStatus::Success,
            Err(e) => status_of(&e),
        };
        settle(status, self.context.conversation().panicked())
    }
}

/// A conversation that lost its logger mid-call counts as a conversation
/// error, whatever the module reported.
fn settle(status: PamStatus, conversation_panicked: bool) -> PamStatus {
    if conversation_panicked {
        PamStatus::ConversationError
    } else {
        status
    }
}

impl PamTransaction for NativeTransaction {
    fn authenticate(&mut self) -> PamStatus {
        let result = self.context.authenticate(self.flags);
        trace!("pam_authenticate returned {:?}", result.as_ref().err().map(|e| e.code()));
        self.record(result)
    }

    fn acct_mgmt(&mut self) -> PamStatus {
        let result = self.context.acct_mgmt(self.flags);
        trace!("pam_acct_mgmt returned {:?}", result.as_ref().err().map(|e| e.code()));
        self.record(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_passwords_are_refused_by_default() {
        assert_eq!(NativePam::default().flags(), Flag::DISALLOW_NULL_AUTHTOK);
    }

    #[test]
    fn silent_and_permissive_flags() {
        assert_eq!(NativePam::new(true, true).flags(), Flag::SILENT);
        assert_eq!(NativePam::new(false, true).flags(), Flag::NONE);
        assert_eq!(
            NativePam::new(true, false).flags(),
            Flag::SILENT | Flag::DISALLOW_NULL_AUTHTOK
        );
    }

    #[test]
    fn panicked_conversation_overrides_module_status() {
        assert_eq!(settle(PamStatus::Success, true), PamStatus::ConversationError);
        assert_eq!(settle(PamStatus::AuthError, true), PamStatus::ConversationError);
        assert_eq!(settle(PamStatus::AuthError, false), PamStatus::AuthError);
        assert_eq!(settle(PamStatus::Success, false), PamStatus::Success);
    }
}
