//! Configuration management for the Mail Merge Server

use serde::Deserialize;
use std::env;

use crate::merge::DEFAULT_IMAGE_ROUTE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in minutes (0 = never expire)
    pub ttl_minutes: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of a merge request body
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// URL prefix of the image links embedded in previews
    pub image_route: String,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_SESSION_TTL_MINUTES: u64 = 60;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
            },
            session: SessionConfig {
                ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
                cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            },
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            preview: PreviewConfig {
                image_route: DEFAULT_IMAGE_ROUTE.to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Each variable falls back to its own default when unset or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "SERVER_PORT", DEFAULT_PORT),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|origins| parse_origins(&origins))
                    .unwrap_or_default(),
            },
            session: SessionConfig {
                ttl_minutes: parse_var(&lookup, "SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES),
                cleanup_interval_secs: parse_var(&lookup, "SESSION_CLEANUP_INTERVAL_SECS", DEFAULT_CLEANUP_INTERVAL_SECS),
            },
            upload: UploadConfig {
                max_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            preview: PreviewConfig {
                image_route: lookup("PREVIEW_IMAGE_ROUTE").unwrap_or_else(|| DEFAULT_IMAGE_ROUTE.to_string()),
            },
        }
    }
}

impl SessionConfig {
    /// Session lifetime, or None when sessions never expire
    ///
    /// Lifetimes too long for `chrono::Duration` are treated as never expiring.
    pub fn ttl(&self) -> Option<chrono::Duration> {
        match self.ttl_minutes {
            0 => None,
            minutes => i64::try_from(minutes)
                .ok()
                .and_then(chrono::Duration::try_minutes),
        }
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default {}", name, value, default);
            default
        }),
        _ => default,
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
