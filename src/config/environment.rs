// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses typed server, database, auth, upstream and security sections from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Environment-based configuration management for production deployment
//!
//! Every setting has a development default so the server starts with no
//! environment at all; `validate()` refuses insecure defaults in production.

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use karetek_core::constants::{auth, chat};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite:").unwrap_or(s);
        let path_str = path_str.strip_prefix("//").unwrap_or(path_str);
        if path_str == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path_str),
            }
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/karetek.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// Chat completion provider
    pub llm: LlmConfig,
    /// Text-to-speech provider
    pub speech: SpeechConfig,
    /// Object storage for synthesized audio
    pub storage: StorageConfig,
    /// CORS and rate limiting
    pub security: SecurityConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Maximum pooled connections
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing bearer tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
}

/// OpenAI-compatible chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (`OPENAI_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL ending in `/v1`
    pub base_url: String,
    /// Model used for chat and translation
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// `ElevenLabs` text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// API key (`ELEVENLABS_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL ending in `/v1`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Where synthesized audio is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files on local disk served under `public_base_url`
    Local,
    /// Supabase Storage bucket
    Supabase,
}

impl StorageBackend {
    /// Parse from string with fallback to local storage
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "supabase" => Self::Supabase,
            _ => Self::Local,
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,
    /// Bucket (Supabase) or sub-directory (local) name
    pub bucket: String,
    /// Root directory for the local backend
    pub local_dir: PathBuf,
    /// Public URL prefix for the local backend
    pub public_base_url: String,
    /// Supabase project URL
    pub supabase_url: Option<String>,
    /// Supabase service-role key
    #[serde(skip_serializing)]
    pub supabase_service_key: Option<String>,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
    /// Per-IP rate limiting on `/api`
    pub rate_limit: RateLimitConfig,
}

/// Fixed-window rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is applied
    pub enabled: bool,
    /// Requests allowed per window per client
    pub requests_per_window: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 100,
            window_seconds: 15 * 60,
        }
    }
}

impl ServerConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cors = lookup("CORS_ORIGINS")
            .or_else(|| lookup("FRONTEND_URL"))
            .unwrap_or_else(|| "http://localhost:3000".to_owned());

        Ok(Self {
            http_port: var_or("HTTP_PORT", "5000")
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::from_str_or_default(&var_or("ENVIRONMENT", "development")),
            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&var_or("DATABASE_URL", "sqlite:./data/karetek.db")),
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", "5")
                    .parse()
                    .context("Invalid DATABASE_MAX_CONNECTIONS value")?,
            },
            auth: AuthConfig {
                jwt_secret: var_or("JWT_SECRET", auth::DEV_JWT_SECRET),
                jwt_expiry_hours: var_or(
                    "JWT_EXPIRY_HOURS",
                    &auth::DEFAULT_JWT_EXPIRY_HOURS.to_string(),
                )
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
            },
            llm: LlmConfig {
                api_key: non_empty("OPENAI_API_KEY"),
                base_url: var_or("LLM_BASE_URL", "https://api.openai.com/v1"),
                model: var_or("LLM_MODEL", chat::DEFAULT_MODEL),
                timeout_secs: var_or("LLM_TIMEOUT_SECS", "60")
                    .parse()
                    .context("Invalid LLM_TIMEOUT_SECS value")?,
            },
            speech: SpeechConfig {
                api_key: non_empty("ELEVENLABS_API_KEY"),
                base_url: var_or("ELEVENLABS_BASE_URL", "https://api.elevenlabs.io/v1"),
                timeout_secs: var_or("ELEVENLABS_TIMEOUT_SECS", "60")
                    .parse()
                    .context("Invalid ELEVENLABS_TIMEOUT_SECS value")?,
            },
            storage: StorageConfig {
                backend: StorageBackend::from_str_or_default(&var_or("STORAGE_BACKEND", "local")),
                bucket: var_or("STORAGE_BUCKET", "avatar-audio"),
                local_dir: PathBuf::from(var_or("STORAGE_LOCAL_DIR", "./data/storage")),
                public_base_url: var_or("STORAGE_PUBLIC_BASE_URL", "http://localhost:5000/media"),
                supabase_url: non_empty("SUPABASE_URL"),
                supabase_service_key: non_empty("SUPABASE_SERVICE_KEY"),
            },
            security: SecurityConfig {
                cors_origins: parse_origins(&cors),
                rate_limit: RateLimitConfig {
                    enabled: parse_bool(&var_or("RATE_LIMIT_ENABLED", "true"))
                        .context("Invalid RATE_LIMIT_ENABLED value")?,
                    requests_per_window: var_or("RATE_LIMIT_REQUESTS", "100")
                        .parse()
                        .context("Invalid RATE_LIMIT_REQUESTS value")?,
                    window_seconds: var_or("RATE_LIMIT_WINDOW_SECS", "900")
                        .parse()
                        .context("Invalid RATE_LIMIT_WINDOW_SECS value")?,
                },
            },
        })
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error when production runs with the development secret, a
    /// non-positive token lifetime, or an incomplete storage backend
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.environment.is_production() && self.auth.jwt_secret == auth::DEV_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }
        if self.auth.jwt_expiry_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive");
        }
        if self.security.rate_limit.enabled
            && (self.security.rate_limit.requests_per_window == 0
                || self.security.rate_limit.window_seconds == 0)
        {
            bail!("Rate limit window and request count must be positive");
        }
        if self.storage.backend == StorageBackend::Supabase
            && (self.storage.supabase_url.is_none() || self.storage.supabase_service_key.is_none())
        {
            bail!("STORAGE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_SERVICE_KEY");
        }

        let upstreams = [
            ("LLM_BASE_URL", Some(self.llm.base_url.as_str())),
            ("ELEVENLABS_BASE_URL", Some(self.speech.base_url.as_str())),
            ("STORAGE_PUBLIC_BASE_URL", Some(self.storage.public_base_url.as_str())),
            ("SUPABASE_URL", self.storage.supabase_url.as_deref()),
        ];
        for (key, value) in upstreams
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
        {
            require_http_url(key, value)?;
        }

        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; chat and translation requests will fail");
        }
        if self.speech.api_key.is_none() {
            warn!("ELEVENLABS_API_KEY is not set; avatar speech requests will fail");
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Karetek Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - LLM Model: {} ({})\n\
             - Speech: {}\n\
             - Storage: {:?}\n\
             - CORS Origins: {}\n\
             - Rate Limiting: {}",
            self.http_port,
            self.environment,
            if self.database.url.is_memory() {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            self.llm.model,
            if self.llm.api_key.is_some() {
                "configured"
            } else {
                "no API key"
            },
            if self.speech.api_key.is_some() {
                "ElevenLabs"
            } else {
                "Disabled"
            },
            self.storage.backend,
            self.security.cors_origins.join(", "),
            if self.security.rate_limit.enabled {
                format!(
                    "{} requests / {}s",
                    self.security.rate_limit.requests_per_window,
                    self.security.rate_limit.window_seconds
                )
            } else {
                "Disabled".to_owned()
            },
        )
    }
}

/// Parse a boolean flag accepting the usual spellings
fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

/// Reject values that are not absolute http(s) URLs
fn require_http_url(key: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value).with_context(|| format!("{key} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{key} must use http or https, got {}", parsed.scheme());
    }
    Ok(())
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
