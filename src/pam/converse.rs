use std::ffi::{CStr, CString};
use std::panic::{self, AssertUnwindSafe};

use pam_client::{ConversationHandler, ReturnCode};

use crate::auth::logger::SharedLogger;

/// Answers PAM prompts with a fixed username and password.
///
/// Prompts that echo get the username, hidden prompts the password. Error
/// and info messages from modules go to the logger. A logger that panics
/// marks the conversation as broken and every later prompt is refused.
pub struct CredentialConversation {
    username: CString,
    password: CString,
    logger: Option<SharedLogger>,
    panicked: bool,
}

impl CredentialConversation {
    pub fn new(username: CString, password: CString, logger: Option<SharedLogger>) -> Self {
        Self {
            username,
            password,
            logger,
            panicked: false,
        }
    }

    pub fn panicked(&self) -> bool {
        self.panicked
    }

    fn report(&mut self, warn: bool, msg: &CStr) {
        let Some(logger) = &self.logger else {
            return;
        };
        let text = format!("PAM: {}", msg.to_string_lossy());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            if warn {
                logger.warn(&text)
            } else {
                logger.info(&text)
            }
        }));
        if result.is_err() {
            self.panicked = true;
        }
    }

    fn answer(&self, value: &CString) -> Result<CString, ReturnCode> {
        if self.panicked {
            return Err(ReturnCode::CONV_ERR);
        }
        Ok(value.clone())
    }
}

impl ConversationHandler for CredentialConversation {
    fn prompt_echo_on(&mut self, _msg: &CStr) -> Result<CString, ReturnCode> {
        self.answer(&self.username)
    }

    fn prompt_echo_off(&mut self, _msg: &CStr) -> Result<CString, ReturnCode> {
        self.answer(&self.password)
    }

    fn text_info(&mut self, msg: &CStr) {
        self.report(false, msg);
    }

    fn error_msg(&mut self, msg: &CStr) {
        self.report(true, msg);
    }
}
