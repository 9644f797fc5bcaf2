use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Upstream deadline used when `GEMINI_TIMEOUT_SECS` is not set.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Absent when `GEMINI_API_KEY` is unset or blank. The service still
    /// starts; proxy requests then fail with a configuration error.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl ProxyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup instead of the
    /// process environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);

        let timeout_raw = get_env(
            &lookup,
            "GEMINI_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        );
        let timeout_secs = match timeout_raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "GEMINI_TIMEOUT_SECS must be a positive number of seconds, got '{}'",
                    timeout_raw
                )))
            }
        };

        Ok(ProxyConfig {
            common,
            gemini: GeminiSettings {
                api_key,
                model: get_env(&lookup, "GEMINI_MODEL", DEFAULT_MODEL),
                api_base: get_env(
                    &lookup,
                    "GEMINI_API_BASE",
                    crate::services::providers::gemini::GEMINI_API_BASE,
                ),
                timeout_secs,
            },
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
