use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use super::upstream::{UpstreamConfig, DEFAULT_UPSTREAM_URL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SESSION_SECRET: &str = "default-secret-key";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const SCRATCH_DIR_NAME: &str = "bg_remover_uploads";
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Where scratch artifacts live and how long they are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchConfig {
    pub dir: PathBuf,
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub session_secret: String,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub max_upload_bytes: usize,
    pub static_dir: PathBuf,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
    pub scratch: ScratchConfig,
    pub upstream: UpstreamConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => parse(&v, "PORT", "a valid u16")?,
            None => DEFAULT_PORT,
        };

        let session_secret =
            get("SESSION_SECRET").unwrap_or_else(|| DEFAULT_SESSION_SECRET.to_string());

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => parse(&v, "MAX_UPLOAD_BYTES", "a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let static_dir = get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));

        let shutdown_grace = match get("SHUTDOWN_GRACE_SECS") {
            Some(v) => Duration::from_secs(parse(
                &v,
                "SHUTDOWN_GRACE_SECS",
                "a number of seconds",
            )?),
            None => DEFAULT_SHUTDOWN_GRACE,
        };

        // Constrained platforms (Vercel) only allow writes under /tmp.
        let scratch_dir = match get("SCRATCH_DIR") {
            Some(dir) => PathBuf::from(dir),
            None if get("VERCEL").is_some() => PathBuf::from("/tmp").join(SCRATCH_DIR_NAME),
            None => std::env::temp_dir().join(SCRATCH_DIR_NAME),
        };

        let ttl = match get("SCRATCH_TTL_SECS") {
            Some(v) => Some(Duration::from_secs(parse(
                &v,
                "SCRATCH_TTL_SECS",
                "a number of seconds",
            )?)),
            None => None,
        };

        let timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(parse(
                &v,
                "UPSTREAM_TIMEOUT_SECS",
                "a number of seconds",
            )?)),
            None => None,
        };

        let max_retries = match get("UPSTREAM_MAX_RETRIES") {
            Some(v) => parse(&v, "UPSTREAM_MAX_RETRIES", "a retry count")?,
            None => 0,
        };

        let fetch_results = match get("UPSTREAM_FETCH_RESULTS") {
            Some(v) => parse_bool(&v, "UPSTREAM_FETCH_RESULTS")?,
            None => true,
        };

        let mut upstream = UpstreamConfig::new(
            get("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
        );
        if let Some(api_name) = get("UPSTREAM_API_NAME") {
            upstream.api_name = api_name;
        }
        upstream.timeout = timeout;
        upstream.max_retries = max_retries;
        upstream.fetch_results = fetch_results;
        upstream.token = get("HF_TOKEN");

        Ok(Self {
            port,
            session_secret,
            cors_allowed_origins,
            max_upload_bytes,
            static_dir,
            shutdown_grace,
            scratch: ScratchConfig {
                dir: scratch_dir,
                ttl,
            },
            upstream,
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    name: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        expected,
        value: value.to_string(),
    })
}

fn parse_bool(value: &str, name: &'static str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            expected: "a boolean",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_secret, DEFAULT_SESSION_SECRET);
        assert_eq!(config.cors_allowed_origins, None);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(
            config.scratch.dir,
            std::env::temp_dir().join(SCRATCH_DIR_NAME)
        );
        assert_eq!(config.scratch.ttl, None);
        assert_eq!(config.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
        assert_eq!(config.upstream, UpstreamConfig::default());
        assert!(config.upstream.fetch_results);
    }

    #[test]
    fn test_fetch_results_can_be_disabled() {
        let config = config_from(&[("UPSTREAM_FETCH_RESULTS", "false")]).unwrap();
        assert!(!config.upstream.fetch_results);
    }

    #[test]
    fn test_shutdown_grace() {
        let config = config_from(&[("SHUTDOWN_GRACE_SECS", "5")]).unwrap();
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
        assert!(config_from(&[("SHUTDOWN_GRACE_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_vercel_mode_uses_tmp() {
        let config = config_from(&[("VERCEL", "1")]).unwrap();
        assert_eq!(config.scratch.dir, PathBuf::from("/tmp/bg_remover_uploads"));
    }

    #[test]
    fn test_explicit_scratch_dir_wins() {
        let config = config_from(&[("VERCEL", "1"), ("SCRATCH_DIR", "/srv/scratch")]).unwrap();
        assert_eq!(config.scratch.dir, PathBuf::from("/srv/scratch"));
    }

    #[test]
    fn test_upstream_settings() {
        let config = config_from(&[
            ("UPSTREAM_URL", "http://localhost:7860/"),
            ("UPSTREAM_API_NAME", "/remove"),
            ("UPSTREAM_TIMEOUT_SECS", "30"),
            ("UPSTREAM_MAX_RETRIES", "2"),
            ("UPSTREAM_FETCH_RESULTS", "true"),
            ("HF_TOKEN", "hf_abc"),
        ])
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://localhost:7860");
        assert_eq!(config.upstream.endpoint(), "remove");
        assert_eq!(config.upstream.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.upstream.max_retries, 2);
        assert!(config.upstream.fetch_results);
        assert_eq!(config.upstream.token.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn test_cors_origins_are_split() {
        let config =
            config_from(&[("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test,")]).unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["https://a.test".to_string(), "https://b.test".to_string()])
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "PORT",
                expected: "a valid u16",
                value: "eighty".to_string(),
            }
        );

        assert!(config_from(&[("UPSTREAM_FETCH_RESULTS", "maybe")]).is_err());
        assert!(config_from(&[("SCRATCH_TTL_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("PORT", ""), ("SESSION_SECRET", " ")]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_secret, DEFAULT_SESSION_SECRET);
    }
}
