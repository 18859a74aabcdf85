use async_trait::async_trait;
use serde::Serialize;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

/// Who a successful login is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub is_admin: bool,
}

/// Checks a username/password pair. Implementations decide where accounts
/// live; `None` means the pair is rejected.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Option<Principal>;
}

/// One configured admin account shared by everyone who edits the site
/// The password is kept only as an HMAC tag under a per-process random key.
pub struct StaticCredentials {
    username: String,
    keyed: Hmac<Sha256>,
    password_tag: Vec<u8>,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        let keyed = Hmac::<Sha256>::new_from_slice(Uuid::new_v4().as_bytes())
            .expect("HMAC accepts keys of any length");
        let mut mac = keyed.clone();
        mac.update(password.as_bytes());
        Self {
            username: username.into(),
            password_tag: mac.finalize().into_bytes().to_vec(),
            keyed,
        }
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        let mut mac = self.keyed.clone();
        mac.update(password.as_bytes());
        let password_ok = mac.verify_slice(&self.password_tag).is_ok();

        (username == self.username && password_ok).then(|| Principal {
            username: self.username.clone(),
            is_admin: true,
        })
    }
}
