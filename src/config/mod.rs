use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<collection>.json` file per collection
    pub data_dir: PathBuf,
    /// Directory holding `<category>/<file>` uploads, served under `/uploads`
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_dev_endpoints: bool,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub secure_cookies: bool,
    pub session_secret: String,
    pub session_ttl_hours: u64,
    /// Static token for the `/dev/*` endpoints; `None` rejects every request
    pub local_admin_token: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Storage overrides
        if let Ok(v) = env::var("CLUBSITE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CLUBSITE_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }

        // API overrides
        if let Some(v) = env::var("CLUBSITE_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("DEV_ENDPOINTS") {
            self.api.enable_dev_endpoints = v.parse().unwrap_or(self.api.enable_dev_endpoints);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("LOCAL_ADMIN_TOKEN") {
            let v = v.trim().to_string();
            self.security.local_admin_token = (!v.is_empty()).then_some(v);
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.security.admin_username = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.security.admin_password = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            storage: StorageConfig {
                data_dir: PathBuf::from("public/data"),
                upload_dir: PathBuf::from("public/uploads"),
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            api: ApiConfig {
                port: 3000,
                enable_dev_endpoints: true,
                enable_request_logging: true,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                secure_cookies: false,
                session_secret: "dev-session-secret".to_string(),
                session_ttl_hours: 24 * 7, // 1 week
                local_admin_token: None,
                admin_username: "admin".to_string(),
                admin_password: "admin".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            storage: StorageConfig {
                data_dir: PathBuf::from("public/data"),
                upload_dir: PathBuf::from("public/uploads"),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_dev_endpoints: false,
                enable_request_logging: true,
                max_request_size_bytes: 2 * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                secure_cookies: true,
                session_secret: String::new(),
                session_ttl_hours: 24,
                local_admin_token: None,
                admin_username: "admin".to_string(),
                admin_password: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            storage: StorageConfig {
                data_dir: PathBuf::from("public/data"),
                upload_dir: PathBuf::from("public/uploads"),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_dev_endpoints: false,
                enable_request_logging: false,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                secure_cookies: true,
                session_secret: String::new(),
                session_ttl_hours: 12,
                local_admin_token: None,
                admin_username: "admin".to_string(),
                admin_password: String::new(),
            },
        }
    }

    /// Settings that make the server refuse to start. An empty admin password
    /// would let anyone log in with just the username.
    pub fn startup_problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.security.session_secret.is_empty() {
            problems.push("SESSION_SECRET is not set");
        }
        if self.security.admin_password.is_empty() {
            problems.push("ADMIN_PASSWORD is not set");
        }
        problems
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
