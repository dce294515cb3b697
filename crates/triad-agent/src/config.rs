use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_NAME_VAR: &str = "MODEL_NAME";
pub const MAX_TOKENS_VAR: &str = "MAX_TOKENS";
pub const TEMPERATURE_VAR: &str = "TEMPERATURE";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Errors raised while loading configuration or prompt templates
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(String),

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidVar {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse prompt templates: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Prompt templates are missing a system prompt for role '{0}'")]
    MissingRole(String),
}

/// Optional model settings from a source other than the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_name: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
}

/// Model and credential settings, loaded once at startup and never mutated.
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    /// Per-request timeout (None = client default)
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }

    /// Load from process environment variables.
    pub fn from_env(
        overrides: ConfigOverrides,
        fallback: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides, fallback)
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Precedence: `overrides` > looked-up variables > `fallback` > defaults.
    pub fn from_lookup<F>(
        lookup: F,
        overrides: ConfigOverrides,
        fallback: ConfigOverrides,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var(API_KEY_VAR).ok_or_else(|| ConfigError::MissingVar(API_KEY_VAR.into()))?;

        let model_name = overrides
            .model_name
            .or_else(|| var(MODEL_NAME_VAR))
            .or(fallback.model_name)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match overrides.max_tokens {
            Some(v) => v,
            None => parse_var(MAX_TOKENS_VAR, var(MAX_TOKENS_VAR))?
                .or(fallback.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let temperature = match overrides.temperature {
            Some(v) => v,
            None => parse_var(TEMPERATURE_VAR, var(TEMPERATURE_VAR))?
                .or(fallback.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
        };

        let base_url = overrides
            .base_url
            .or_else(|| var(BASE_URL_VAR))
            .or(fallback.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let config = Self {
            api_key,
            model_name,
            max_tokens,
            temperature,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: overrides.request_timeout.or(fallback.request_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidVar {
                name: TEMPERATURE_VAR.into(),
                value: self.temperature.to_string(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidVar {
                name: MAX_TOKENS_VAR.into(),
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|e| ConfigError::InvalidVar {
            name: name.to_string(),
            value: value.clone(),
            reason: e.to_string(),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key() {
        let err = ModelConfig::from_lookup(
            lookup(&[]),
            ConfigOverrides::default(),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == API_KEY_VAR));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let err = ModelConfig::from_lookup(
            lookup(&[(API_KEY_VAR, "   ")]),
            ConfigOverrides::default(),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_defaults() {
        let config = ModelConfig::from_lookup(
            lookup(&[(API_KEY_VAR, "sk-test")]),
            ConfigOverrides::default(),
            ConfigOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!((config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_values_and_overrides() {
        let vars = lookup(&[
            (API_KEY_VAR, "sk-test"),
            (MODEL_NAME_VAR, "gpt-4o-mini"),
            (MAX_TOKENS_VAR, "800"),
            (TEMPERATURE_VAR, "0.2"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
        ]);
        let overrides = ConfigOverrides {
            model_name: Some("gpt-4o".into()),
            ..Default::default()
        };

        let config = ModelConfig::from_lookup(vars, overrides, ConfigOverrides::default()).unwrap();
        assert_eq!(config.model_name, "gpt-4o");
        assert_eq!(config.max_tokens, 800);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_numbers() {
        let err = ModelConfig::from_lookup(
            lookup(&[(API_KEY_VAR, "k"), (MAX_TOKENS_VAR, "lots")]),
            ConfigOverrides::default(),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { ref name, .. } if name == MAX_TOKENS_VAR));

        let err = ModelConfig::from_lookup(
            lookup(&[(API_KEY_VAR, "k"), (TEMPERATURE_VAR, "3.5")]),
            ConfigOverrides::default(),
            ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { ref name, .. } if name == TEMPERATURE_VAR));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ModelConfig::new("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn test_fallback_loses_to_env() {
        let vars = lookup(&[(API_KEY_VAR, "k"), (MAX_TOKENS_VAR, "200")]);
        let fallback = ConfigOverrides {
            max_tokens: Some(300),
            model_name: Some("gpt-4o".into()),
            ..Default::default()
        };

        let config = ModelConfig::from_lookup(vars, ConfigOverrides::default(), fallback).unwrap();
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.model_name, "gpt-4o");
    }
}
