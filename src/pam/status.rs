use std::ffi::c_int;
use std::fmt;

// Linux-PAM return codes from <security/_pam_types.h>.
const PAM_SUCCESS: c_int = 0;
const PAM_OPEN_ERR: c_int = 1;
const PAM_SYMBOL_ERR: c_int = 2;
const PAM_SERVICE_ERR: c_int = 3;
const PAM_SYSTEM_ERR: c_int = 4;
const PAM_BUF_ERR: c_int = 5;
const PAM_PERM_DENIED: c_int = 6;
const PAM_AUTH_ERR: c_int = 7;
const PAM_CRED_INSUFFICIENT: c_int = 8;
const PAM_AUTHINFO_UNAVAIL: c_int = 9;
const PAM_USER_UNKNOWN: c_int = 10;
const PAM_MAXTRIES: c_int = 11;
const PAM_NEW_AUTHTOK_REQD: c_int = 12;
const PAM_ACCT_EXPIRED: c_int = 13;
const PAM_SESSION_ERR: c_int = 14;
const PAM_CRED_UNAVAIL: c_int = 15;
const PAM_CRED_EXPIRED: c_int = 16;
const PAM_CRED_ERR: c_int = 17;
const PAM_NO_MODULE_DATA: c_int = 18;
const PAM_CONV_ERR: c_int = 19;
const PAM_AUTHTOK_ERR: c_int = 20;
const PAM_AUTHTOK_RECOVERY_ERR: c_int = 21;
const PAM_AUTHTOK_LOCK_BUSY: c_int = 22;
const PAM_AUTHTOK_DISABLE_AGING: c_int = 23;
const PAM_TRY_AGAIN: c_int = 24;
const PAM_IGNORE: c_int = 25;
const PAM_ABORT: c_int = 26;
const PAM_AUTHTOK_EXPIRED: c_int = 27;
const PAM_MODULE_UNKNOWN: c_int = 28;
const PAM_BAD_ITEM: c_int = 29;
const PAM_CONV_AGAIN: c_int = 30;
const PAM_INCOMPLETE: c_int = 31;

/// Result code returned by a libpam call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PamStatus {
    Success,
    OpenError,
    SymbolError,
    ServiceError,
    SystemError,
    BufferError,
    PermissionDenied,
    /// The user failed to authenticate correctly.
    AuthError,
    CredentialsInsufficient,
    /// PAM modules were unable to reach the authentication information, e.g.
    /// a network directory is down.
    AuthInfoUnavailable,
    UserUnknown,
    /// No more attempts should be made.
    MaxTries,
    NewAuthTokenRequired,
    AccountExpired,
    SessionError,
    CredentialsUnavailable,
    CredentialsExpired,
    CredentialsError,
    NoModuleData,
    ConversationError,
    AuthTokenError,
    AuthTokenRecoveryError,
    AuthTokenLockBusy,
    AuthTokenDisableAging,
    TryAgain,
    Ignore,
    Abort,
    AuthTokenExpired,
    ModuleUnknown,
    BadItem,
    ConversationAgain,
    Incomplete,
    Unknown(i32),
}

impl PamStatus {
    pub fn from_code(code: c_int) -> PamStatus {
        use PamStatus::*;

        match code {
            PAM_SUCCESS => Success,
            PAM_OPEN_ERR => OpenError,
            PAM_SYMBOL_ERR => SymbolError,
            PAM_SERVICE_ERR => ServiceError,
            PAM_SYSTEM_ERR => SystemError,
            PAM_BUF_ERR => BufferError,
            PAM_PERM_DENIED => PermissionDenied,
            PAM_AUTH_ERR => AuthError,
            PAM_CRED_INSUFFICIENT => CredentialsInsufficient,
            PAM_AUTHINFO_UNAVAIL => AuthInfoUnavailable,
            PAM_USER_UNKNOWN => UserUnknown,
            PAM_MAXTRIES => MaxTries,
            PAM_NEW_AUTHTOK_REQD => NewAuthTokenRequired,
            PAM_ACCT_EXPIRED => AccountExpired,
            PAM_SESSION_ERR => SessionError,
            PAM_CRED_UNAVAIL => CredentialsUnavailable,
            PAM_CRED_EXPIRED => CredentialsExpired,
            PAM_CRED_ERR => CredentialsError,
            PAM_NO_MODULE_DATA => NoModuleData,
            PAM_CONV_ERR => ConversationError,
            PAM_AUTHTOK_ERR => AuthTokenError,
            PAM_AUTHTOK_RECOVERY_ERR => AuthTokenRecoveryError,
            PAM_AUTHTOK_LOCK_BUSY => AuthTokenLockBusy,
            PAM_AUTHTOK_DISABLE_AGING => AuthTokenDisableAging,
            PAM_TRY_AGAIN => TryAgain,
            PAM_IGNORE => Ignore,
            PAM_ABORT => Abort,
            PAM_AUTHTOK_EXPIRED => AuthTokenExpired,
            PAM_MODULE_UNKNOWN => ModuleUnknown,
            PAM_BAD_ITEM => BadItem,
            PAM_CONV_AGAIN => ConversationAgain,
            PAM_INCOMPLETE => Incomplete,
            other => Unknown(other),
        }
    }

    pub fn code(self) -> c_int {
        use PamStatus::*;

        match self {
            Success => PAM_SUCCESS,
            OpenError => PAM_OPEN_ERR,
            SymbolError => PAM_SYMBOL_ERR,
            ServiceError => PAM_SERVICE_ERR,
            SystemError => PAM_SYSTEM_ERR,
            BufferError => PAM_BUF_ERR,
            PermissionDenied => PAM_PERM_DENIED,
            AuthError => PAM_AUTH_ERR,
            CredentialsInsufficient => PAM_CRED_INSUFFICIENT,
            AuthInfoUnavailable => PAM_AUTHINFO_UNAVAIL,
            UserUnknown => PAM_USER_UNKNOWN,
            MaxTries => PAM_MAXTRIES,
            NewAuthTokenRequired => PAM_NEW_AUTHTOK_REQD,
            AccountExpired => PAM_ACCT_EXPIRED,
            SessionError => PAM_SESSION_ERR,
            CredentialsUnavailable => PAM_CRED_UNAVAIL,
            CredentialsExpired => PAM_CRED_EXPIRED,
            CredentialsError => PAM_CRED_ERR,
            NoModuleData => PAM_NO_MODULE_DATA,
            ConversationError => PAM_CONV_ERR,
            AuthTokenError => PAM_AUTHTOK_ERR,
            AuthTokenRecoveryError => PAM_AUTHTOK_RECOVERY_ERR,
            AuthTokenLockBusy => PAM_AUTHTOK_LOCK_BUSY,
            AuthTokenDisableAging => PAM_AUTHTOK_DISABLE_AGING,
            TryAgain => PAM_TRY_AGAIN,
            Ignore => PAM_IGNORE,
            Abort => PAM_ABORT,
            AuthTokenExpired => PAM_AUTHTOK_EXPIRED,
            ModuleUnknown => PAM_MODULE_UNKNOWN,
            BadItem => PAM_BAD_ITEM,
            ConversationAgain => PAM_CONV_AGAIN,
            Incomplete => PAM_INCOMPLETE,
            Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == PamStatus::Success
    }

    /// Symbolic name as spelled in `pam_appl.h`.
    pub fn name(self) -> &'static str {
        use PamStatus::*;

        match self {
            Success => "PAM_SUCCESS",
            OpenError => "PAM_OPEN_ERR",
            SymbolError => "PAM_SYMBOL_ERR",
            ServiceError => "PAM_SERVICE_ERR",
            SystemError => "PAM_SYSTEM_ERR",
            BufferError => "PAM_BUF_ERR",
            PermissionDenied => "PAM_PERM_DENIED",
            AuthError => "PAM_AUTH_ERR",
            CredentialsInsufficient => "PAM_CRED_INSUFFICIENT",
            AuthInfoUnavailable => "PAM_AUTHINFO_UNAVAIL",
            UserUnknown => "PAM_USER_UNKNOWN",
            MaxTries => "PAM_MAXTRIES",
            NewAuthTokenRequired => "PAM_NEW_AUTHTOK_REQD",
            AccountExpired => "PAM_ACCT_EXPIRED",
            SessionError => "PAM_SESSION_ERR",
            CredentialsUnavailable => "PAM_CRED_UNAVAIL",
            CredentialsExpired => "PAM_CRED_EXPIRED",
            CredentialsError => "PAM_CRED_ERR",
            NoModuleData => "PAM_NO_MODULE_DATA",
            ConversationError => "PAM_CONV_ERR",
            AuthTokenError => "PAM_AUTHTOK_ERR",
            AuthTokenRecoveryError => "PAM_AUTHTOK_RECOVERY_ERR",
            AuthTokenLockBusy => "PAM_AUTHTOK_LOCK_BUSY",
            AuthTokenDisableAging => "PAM_AUTHTOK_DISABLE_AGING",
            TryAgain => "PAM_TRY_AGAIN",
            Ignore => "PAM_IGNORE",
            Abort => "PAM_ABORT",
            AuthTokenExpired => "PAM_AUTHTOK_EXPIRED",
            ModuleUnknown => "PAM_MODULE_UNKNOWN",
            BadItem => "PAM_BAD_ITEM",
            ConversationAgain => "PAM_CONV_AGAIN",
            Incomplete => "PAM_INCOMPLETE",
            Unknown(_) => "PAM_UNKNOWN",
        }
    }

    /// Human readable text, matching what Linux-PAM's `pam_strerror` prints.
    pub fn description(self) -> &'static str {
        use PamStatus::*;

        match self {
            Success => "Success",
            OpenError => "Failed to load module",
            SymbolError => "Symbol not found",
            ServiceError => "Error in service module",
            SystemError => "System error",
            BufferError => "Memory buffer error",
            PermissionDenied => "Permission denied",
            AuthError => "Authentication failure",
            CredentialsInsufficient => "Insufficient credentials to access authentication data",
            AuthInfoUnavailable => "Authentication service cannot retrieve authentication info",
            UserUnknown => "User not known to the underlying authentication module",
            MaxTries => "Have exhausted maximum number of retries for service",
            NewAuthTokenRequired => "Authentication token is no longer valid; new one required",
            AccountExpired => "User account has expired",
            SessionError => "Cannot make/remove an entry for the specified session",
            CredentialsUnavailable => "Authentication service cannot retrieve user credentials",
            CredentialsExpired => "User credentials expired",
            CredentialsError => "Failure setting user credentials",
            NoModuleData => "No module specific data is present",
            ConversationError => "Conversation error",
            AuthTokenError => "Authentication token manipulation error",
            AuthTokenRecoveryError => "Authentication information cannot be recovered",
            AuthTokenLockBusy => "Authentication token lock busy",
            AuthTokenDisableAging => "Authentication token aging disabled",
            TryAgain => "Failed preliminary check by password service",
            Ignore => "The return value should be ignored by PAM dispatch",
            Abort => "Critical error - immediate abort",
            AuthTokenExpired => "Authentication token expired",
            ModuleUnknown => "Module is unknown",
            BadItem => "Bad item passed to pam_*_item()",
            ConversationAgain => "Conversation is waiting for event",
            Incomplete => "Application needs to call libpam again",
            Unknown(_) => "Unknown PAM error",
        }
    }
}

impl fmt::Display for PamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PamStatus::Unknown(code) => write!(f, "{} ({} {})", self.description(), self.name(), code),
            _ => write!(f, "{} ({})", self.description(), self.name()),
        }
    }
}

/// The libpam call a status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamStep {
    Start,
    Authenticate,
    AccountManagement,
}

/// How loudly a failed step should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user was refused: wrong password, unknown or expired account.
    Debug,
    /// Something is wrong with the PAM stack or the host itself.
    Error,
}

impl PamStep {
    /// Classify a failure of this step.
    ///
    /// Denials that are part of normal operation are reported at debug level
    /// so that a mistyped password doesn't flood the error log. Everything
    /// else points at a misconfigured service or a broken module.
    pub fn severity(self, status: PamStatus) -> Severity {
        use PamStatus::*;

        let denial = match self {
            PamStep::Start => false,
            PamStep::Authenticate => matches!(
                status,
                AuthError | CredentialsInsufficient | AuthInfoUnavailable | UserUnknown | MaxTries
            ),
            PamStep::AccountManagement => matches!(
                status,
                AccountExpired | NewAuthTokenRequired | AuthTokenExpired | PermissionDenied | UserUnknown
            ),
        };

        if denial {
            Severity::Debug
        } else {
            Severity::Error
        }
    }
}

impl fmt::Display for PamStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PamStep::Start => "pam_start",
            PamStep::Authenticate => "pam_authenticate",
            PamStep::AccountManagement => "pam_acct_mgmt",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_back_to_the_same_number() {
        for code in 0..=31 {
            let status = PamStatus::from_code(code);
            assert!(!matches!(status, PamStatus::Unknown(_)), "code {code} has no variant");
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn unknown_code_is_preserved() {
        let status = PamStatus::from_code(1234);
        assert_eq!(status, PamStatus::Unknown(1234));
        assert_eq!(status.code(), 1234);
        assert_eq!(status.to_string(), "Unknown PAM error (PAM_UNKNOWN 1234)");
    }

    #[test]
    fn display_uses_pam_strerror_text() {
        assert_eq!(
            PamStatus::AuthError.to_string(),
            "Authentication failure (PAM_AUTH_ERR)"
        );
        assert_eq!(PamStatus::from_code(13).description(), "User account has expired");
    }

    #[test]
    fn wrong_password_is_a_debug_event() {
        assert_eq!(PamStep::Authenticate.severity(PamStatus::AuthError), Severity::Debug);
        assert_eq!(PamStep::Authenticate.severity(PamStatus::UserUnknown), Severity::Debug);
        assert_eq!(PamStep::Authenticate.severity(PamStatus::MaxTries), Severity::Debug);
    }

    #[test]
    fn account_denials_are_debug_events() {
        for status in [
            PamStatus::AccountExpired,
            PamStatus::NewAuthTokenRequired,
            PamStatus::AuthTokenExpired,
            PamStatus::PermissionDenied,
        ] {
            assert_eq!(PamStep::AccountManagement.severity(status), Severity::Debug);
        }
    }

    #[test]
    fn broken_stack_is_an_error() {
        assert_eq!(PamStep::Authenticate.severity(PamStatus::SystemError), Severity::Error);
        assert_eq!(PamStep::Authenticate.severity(PamStatus::ConversationError), Severity::Error);
        assert_eq!(PamStep::AccountManagement.severity(PamStatus::AuthError), Severity::Error);
        assert_eq!(PamStep::Start.severity(PamStatus::AuthError), Severity::Error);
        assert_eq!(PamStep::Start.severity(PamStatus::BufferError), Severity::Error);
    }
}
