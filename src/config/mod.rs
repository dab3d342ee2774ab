use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::rate_limit::{LimitPolicy, RateLimitConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitSettings,
    pub storage: StorageConfig,
    pub sharing: SharingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL this service is reachable at; bucket URLs are built from it.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub general_max: u32,
    pub general_window_secs: u64,
    pub upload_max: u32,
    pub upload_window_secs: u64,
    pub chat_max: u32,
    pub chat_window_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket_dir: String,
    pub signing_secret: String,
    pub upload_url_ttl_secs: u64,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
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
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("ANNOTATION_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = v.trim_end_matches('/').to_string();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Ok(v) = env::var("RATE_LIMIT_GENERAL_MAX") {
            self.rate_limit.general_max = v.parse().unwrap_or(self.rate_limit.general_max);
        }
        if let Ok(v) = env::var("RATE_LIMIT_GENERAL_WINDOW_SECS") {
            self.rate_limit.general_window_secs = v.parse().unwrap_or(self.rate_limit.general_window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_UPLOAD_MAX") {
            self.rate_limit.upload_max = v.parse().unwrap_or(self.rate_limit.upload_max);
        }
        if let Ok(v) = env::var("RATE_LIMIT_UPLOAD_WINDOW_SECS") {
            self.rate_limit.upload_window_secs = v.parse().unwrap_or(self.rate_limit.upload_window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_CHAT_MAX") {
            self.rate_limit.chat_max = v.parse().unwrap_or(self.rate_limit.chat_max);
        }
        if let Ok(v) = env::var("RATE_LIMIT_CHAT_WINDOW_SECS") {
            self.rate_limit.chat_window_secs = v.parse().unwrap_or(self.rate_limit.chat_window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_SWEEP_SECS") {
            self.rate_limit.sweep_interval_secs = v.parse().unwrap_or(self.rate_limit.sweep_interval_secs);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BUCKET_DIR") {
            self.storage.bucket_dir = v;
        }
        if let Ok(v) = env::var("STORAGE_SIGNING_SECRET") {
            self.storage.signing_secret = v;
        }
        if let Ok(v) = env::var("STORAGE_UPLOAD_URL_TTL_SECS") {
            self.storage.upload_url_ttl_secs = v.parse().unwrap_or(self.storage.upload_url_ttl_secs);
        }
        if let Ok(v) = env::var("STORAGE_MAX_UPLOAD_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }

        // Sharing overrides
        if let Ok(v) = env::var("FRONTEND_URL") {
            self.sharing.frontend_url = v.trim_end_matches('/').to_string();
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    /// Limiter policies for the three request categories.
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        let r = &self.rate_limit;
        RateLimitConfig {
            enabled: r.enabled,
            general: LimitPolicy::new(r.general_max, Duration::from_secs(r.general_window_secs)),
            upload: LimitPolicy::new(r.upload_max, Duration::from_secs(r.upload_window_secs)),
            chat: LimitPolicy::new(r.chat_max, Duration::from_secs(r.chat_window_secs)),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit.sweep_interval_secs.max(1))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn default_rate_limits() -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            general_max: 100,
            general_window_secs: 60,
            upload_max: 10,
            upload_window_secs: 300,
            chat_max: 50,
            chat_window_secs: 60,
            sweep_interval_secs: 60,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                public_base_url: "http://localhost:4000".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            rate_limit: Self::default_rate_limits(),
            storage: StorageConfig {
                bucket_dir: "./data/images".to_string(),
                signing_secret: "dev-signing-secret".to_string(),
                upload_url_ttl_secs: 3600,
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
            },
            sharing: SharingConfig {
                frontend_url: "http://localhost:3000".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                public_base_url: "https://api.staging.example.com".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            rate_limit: Self::default_rate_limits(),
            storage: StorageConfig {
                bucket_dir: "/var/lib/annotation-api/images".to_string(),
                signing_secret: String::new(),
                upload_url_ttl_secs: 3600,
                max_upload_bytes: 10 * 1024 * 1024,
            },
            sharing: SharingConfig {
                frontend_url: "https://staging.example.com".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                public_base_url: "https://api.example.com".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            rate_limit: Self::default_rate_limits(),
            storage: StorageConfig {
                bucket_dir: "/var/lib/annotation-api/images".to_string(),
                signing_secret: String::new(),
                upload_url_ttl_secs: 3600,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            sharing: SharingConfig {
                frontend_url: "https://app.example.com".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
