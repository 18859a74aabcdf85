use std::sync::Arc;

use crate::auth::{CredentialVerifier, SessionStore, StaticCredentials};
use crate::config::AppConfig;
use crate::services::ContentService;
use crate::storage::{ContentStore, FileStore};
use crate::uploads::UploadStore;

/// Shared handles every handler and middleware can reach
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub content: ContentService,
    pub uploads: Arc<UploadStore>,
    pub sessions: SessionStore,
    pub credentials: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Wire the file-backed store and the configured admin account
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn ContentStore> = Arc::new(FileStore::new(&config.storage.data_dir));
        let credentials = Arc::new(StaticCredentials::new(
            config.security.admin_username.clone(),
            &config.security.admin_password,
        ));
        Self::with_parts(config, store, credentials)
    }

    /// Assemble state around any store and credential check
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn ContentStore>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let uploads = UploadStore::new(&config.storage.upload_dir, config.storage.max_upload_bytes);
        let sessions = SessionStore::new(
            &config.security.session_secret,
            config.security.session_ttl_hours,
        );
        Self {
            config: Arc::new(config),
            content: ContentService::new(store),
            uploads: Arc::new(uploads),
            sessions,
            credentials,
        }
    }
}
