pub mod credentials;
pub mod session;

use thiserror::Error;

pub use credentials::{CredentialVerifier, Principal, StaticCredentials};
pub use session::{Session, SessionStore, SESSION_COOKIE};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Admin access required")]
    NotAdmin,

    #[error("unauthorized")]
    InvalidToken,
}
