pub mod auth;
pub mod config;
pub mod error;
pub mod pam;

pub use auth::logger::{AuthLogger, TracingLogger};
pub use auth::pam::{PamAuthenticator, PamOptions};
pub use auth::Authenticator;
pub use config::Config;
pub use error::AuthError;
