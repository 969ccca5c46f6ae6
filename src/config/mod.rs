use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Signing secret used when `JWT_SECRET` is not provided. Startup warns loudly when it is in effect.
pub const INSECURE_DEFAULT_JWT_SECRET: &str = "blu-dev-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub integrations: IntegrationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub uploads_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; wins over the individual parts when set
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub correios_user: String,
    pub correios_api_key: Option<String>,
    pub correios_base_url: String,
    pub autentique_api_token: Option<String>,
    pub autentique_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub http_timeout_secs: u64,
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
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("UPLOADS_DIR") {
            self.server.uploads_dir = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            if !v.trim().is_empty() {
                self.security.jwt_secret = v;
            }
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Integration credentials
        if let Ok(v) = env::var("CORREIOS_USER") {
            self.integrations.correios_user = v;
        }
        self.integrations.correios_api_key = non_empty_env("CORREIOS_API_KEY");
        if let Ok(v) = env::var("CORREIOS_BASE_URL") {
            self.integrations.correios_base_url = v;
        }
        self.integrations.autentique_api_token = non_empty_env("AUTENTIQUE_API_TOKEN");
        if let Ok(v) = env::var("AUTENTIQUE_URL") {
            self.integrations.autentique_url = v;
        }
        self.integrations.gemini_api_key = non_empty_env("GEMINI_API_KEY");
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.integrations.gemini_model = v;
        }
        if let Ok(v) = env::var("GEMINI_BASE_URL") {
            self.integrations.gemini_base_url = v;
        }
        if let Ok(v) = env::var("INTEGRATIONS_HTTP_TIMEOUT_SECS") {
            self.integrations.http_timeout_secs = v.parse().unwrap_or(self.integrations.http_timeout_secs);
        }

        self
    }

    /// True while the signing secret is the built-in default.
    pub fn uses_insecure_secret(&self) -> bool {
        self.security.jwt_secret == INSECURE_DEFAULT_JWT_SECRET
    }

    /// Connection URL for the store, assembled from parts unless `DATABASE_URL` was given.
    pub fn database_url(&self) -> Result<String, url::ParseError> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }

        let mut url = url::Url::parse("postgres://localhost")?;
        // set_* only fail for cannot-be-a-base URLs, which a postgres:// URL never is
        let _ = url.set_host(Some(&self.database.host));
        let _ = url.set_port(Some(self.database.port));
        let _ = url.set_username(&self.database.user);
        if !self.database.password.is_empty() {
            let _ = url.set_password(Some(&self.database.password));
        }
        url.set_path(&format!("/{}", self.database.name));
        Ok(url.into())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3001,
                uploads_dir: "uploads".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: String::new(),
                name: "blu".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 20 * 1024 * 1024, // 20MB
            },
            security: SecurityConfig {
                jwt_secret: INSECURE_DEFAULT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()],
            },
            integrations: IntegrationsConfig::defaults(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 10 * 1024 * 1024;
        config.security.cors_origins = vec!["https://staging.blu.app".to_string()];
        config
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3001,
                uploads_dir: "uploads".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "blu".to_string(),
                password: String::new(),
                name: "blu".to_string(),
                max_connections: 30,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: INSECURE_DEFAULT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://app.blu.app".to_string()],
            },
            integrations: IntegrationsConfig::defaults(),
        }
    }
}

impl IntegrationsConfig {
    fn defaults() -> Self {
        Self {
            correios_user: String::new(),
            correios_api_key: None,
            correios_base_url: "https://api.correios.com.br".to_string(),
            autentique_api_token: None,
            autentique_url: "https://api.autentique.com.br/v2/graphql".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            http_timeout_secs: 30,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
