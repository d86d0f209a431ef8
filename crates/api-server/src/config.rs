use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use ai_assistant::assistant::DEFAULT_MODEL;
use ai_assistant::providers::openai::DEFAULT_OPENAI_API_BASE;
use marketplace_store::DEFAULT_SESSION_TTL;

/// Connection settings for the chat-completion backend.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Login brute-force thresholds.
#[derive(Debug, Clone)]
pub struct BruteForceSettings {
    pub max_failures: u32,
    pub window: Duration,
    pub lockout: Duration,
}

impl Default for BruteForceSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// `["*"]` allows any origin
    pub cors_origins: Vec<String>,
    /// `None` disables the AI endpoints
    pub llm: Option<LlmSettings>,
    pub brute_force: BruteForceSettings,
    /// Login token lifetime
    pub session_ttl: Duration,
    pub enable_hsts: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:artisant.db".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_origins: vec!["*".to_string()],
            llm: None,
            brute_force: BruteForceSettings::default(),
            session_ttl: DEFAULT_SESSION_TTL,
            enable_hsts: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let llm = ["LLM_API_KEY", "EMERGENT_LLM_KEY", "OPENAI_API_KEY"]
            .iter()
            .find_map(|var| env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .map(|api_key| -> Result<LlmSettings> {
                Ok(LlmSettings {
                    api_key,
                    api_base: env::var("LLM_API_BASE")
                        .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string()),
                    model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
                    timeout_secs: parse_var("LLM_TIMEOUT_SECS", 120)?,
                })
            })
            .transpose()?;

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            llm,
            brute_force: BruteForceSettings {
                max_failures: parse_var("AUTH_MAX_FAILURES", defaults.brute_force.max_failures)?,
                window: Duration::from_secs(parse_var(
                    "AUTH_FAILURE_WINDOW_SECS",
                    defaults.brute_force.window.as_secs(),
                )?),
                lockout: Duration::from_secs(parse_var(
                    "AUTH_LOCKOUT_SECS",
                    defaults.brute_force.lockout.as_secs(),
                )?),
            },
            session_ttl: Duration::from_secs(parse_var(
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
            enable_hsts: env::var("ENABLE_HSTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }
        if self.brute_force.max_failures == 0 {
            anyhow::bail!("AUTH_MAX_FAILURES must be at least 1");
        }
        if self.session_ttl.is_zero() {
            anyhow::bail!("SESSION_TTL_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8001");
        assert!(config.allows_any_origin());
        assert!(config.llm.is_none());
        assert_eq!(config.brute_force.max_failures, 5);
        assert_eq!(config.session_ttl, Duration::from_secs(604_800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://localhost:3000, https://artisant.app"),
            vec!["http://localhost:3000".to_string(), "https://artisant.app".to_string()]
        );
        assert_eq!(parse_origins(" , "), vec!["*".to_string()]);
    }

    #[test]
    fn test_validate_rejects_zero_failures() {
        let mut config = ServerConfig::default();
        config.brute_force.max_failures = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_session_ttl() {
        let config = ServerConfig {
            session_ttl: Duration::ZERO,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
