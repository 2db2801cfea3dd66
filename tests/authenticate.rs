use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pam_authd::pam::{Credentials, PamBackend, PamStatus, PamStep, PamTransaction};
use pam_authd::{AuthError, AuthLogger, Authenticator, Config, PamAuthenticator, PamOptions};

/// Stand-in for /etc/pam.d: a user table plus accounts that fail acct_mgmt.
struct FakeStack {
    passwords: HashMap<&'static str, &'static str>,
    account_status: HashMap<&'static str, PamStatus>,
}

struct FakeTransaction {
    status: PamStatus,
    account: PamStatus,
}

impl FakeStack {
    fn new() -> Self {
        let passwords = HashMap::from([("alice", "wonderland"), ("bob", "builder"), ("carol", "")]);
        let account_status = HashMap::from([
            ("bob", PamStatus::NewAuthTokenRequired),
            ("carol", PamStatus::AuthTokenLockBusy),
        ]);
        Self {
            passwords,
            account_status,
        }
    }
}

impl PamBackend for FakeStack {
    type Transaction = FakeTransaction;

    fn start(
        &self,
        service: &str,
        credentials: Credentials,
        logger: Option<Arc<dyn AuthLogger>>,
    ) -> Result<FakeTransaction, PamStatus> {
        if service != "login" {
            return Err(PamStatus::OpenError);
        }
        if let Some(logger) = logger {
            logger.info("PAM: last login: never");
        }

        let status = match self.passwords.get(credentials.username()) {
            None => PamStatus::UserUnknown,
            Some(expected) if *expected == credentials.password() => PamStatus::Success,
            Some(_) => PamStatus::AuthError,
        };
        let account = self
            .account_status
            .get(credentials.username())
            .copied()
            .unwrap_or(PamStatus::Success);

        Ok(FakeTransaction { status, account })
    }
}

impl PamTransaction for FakeTransaction {
    fn authenticate(&mut self) -> PamStatus {
        self.status
    }

    fn acct_mgmt(&mut self) -> PamStatus {
        self.account
    }
}

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl AuthLogger for Collect {
    fn debug(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("DEBUG {msg}"));
    }
    fn info(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("INFO {msg}"));
    }
    fn warn(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("WARN {msg}"));
    }
    fn error(&self, msg: &str) {
        self.0.lock().unwrap().push(format!("ERROR {msg}"));
    }
}

fn build(config: &Config) -> (PamAuthenticator<FakeStack>, Arc<Collect>) {
    let log = Arc::new(Collect::default());
    let options = PamOptions::from_config(&config.pam).with_logger(Some(log.clone()));
    let auth = PamAuthenticator::with_backend(FakeStack::new(), options).unwrap();
    (auth, log)
}

#[test]
fn defaults_use_login_service() {
    let (auth, log) = build(&Config::default());
    assert_eq!(auth.service(), "login");

    assert!(auth.authenticate("alice", "wonderland"));
    let log = log.0.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], "INFO PAM: last login: never");
    assert!(log[1].starts_with("INFO user 'alice' authenticated"), "{}", log[1]);
}

#[test]
fn each_failure_is_classified() {
    let (auth, _) = build(&Config::default());

    let cases = [
        ("alice", "guess", PamStep::Authenticate, PamStatus::AuthError),
        ("mallory", "x", PamStep::Authenticate, PamStatus::UserUnknown),
        ("bob", "builder", PamStep::AccountManagement, PamStatus::NewAuthTokenRequired),
        ("carol", "", PamStep::AccountManagement, PamStatus::AuthTokenLockBusy),
    ];

    for (user, password, step, status) in cases {
        assert_eq!(
            auth.try_authenticate(user, password),
            Err(AuthError::Pam { step, status }),
            "{user}"
        );
        assert!(!auth.authenticate(user, password));
    }
}

#[test]
fn log_severity_follows_failure_category() {
    let (auth, log) = build(&Config::default());

    assert!(!auth.authenticate("alice", "guess"));
    assert!(!auth.authenticate("bob", "builder"));
    assert!(!auth.authenticate("carol", ""));

    let levels: Vec<String> = log
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|line| !line.contains("last login"))
        .map(|line| line.split(' ').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(levels, vec!["DEBUG", "DEBUG", "ERROR"]);
}

#[test]
fn unknown_service_fails_at_start() {
    let config = Config::from_yaml("pam:\n  service: vsftpd\n").unwrap();
    let (auth, log) = build(&config);

    assert_eq!(
        auth.try_authenticate("alice", "wonderland"),
        Err(AuthError::Pam {
            step: PamStep::Start,
            status: PamStatus::OpenError,
        })
    );
    assert!(!auth.authenticate("alice", "wonderland"));
    let log = log.0.lock().unwrap();
    assert!(log[0].starts_with("ERROR"), "{}", log[0]);
    assert!(log[0].contains("Failed to load module (PAM_OPEN_ERR)"), "{}", log[0]);
}

#[test]
fn async_trait_path() {
    let (auth, _) = build(&Config::default());
    let auth: Arc<dyn Authenticator> = Arc::new(auth);

    assert!(tokio_test::block_on(auth.authenticate("alice", "wonderland")).unwrap());
    assert!(!tokio_test::block_on(auth.authenticate("alice", "nope")).unwrap());
}
