use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Application configuration loaded from environment variables.
/// Fails at startup if the generation credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_max_retries: u32,
    pub summary_max_attempts: u32,
    pub summary_max_tokens: u32,
    pub rate_limit_per_day: u32,
    pub trust_forwarded_for: bool,
    pub max_upload_bytes: usize,
    pub tesseract_path: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            summary_max_attempts: parse_env("SUMMARY_MAX_ATTEMPTS", 3)?,
            summary_max_tokens: parse_env("SUMMARY_MAX_TOKENS", 200)?,
            rate_limit_per_day: parse_env("RATE_LIMIT_PER_DAY", 50)?,
            trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR", false)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            tesseract_path: env_or("TESSERACT_PATH", "tesseract"),
            port: parse_env("PORT", 5000)?,
            rust_log: env_or("RUST_LOG", "info"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.summary_max_attempts == 0 {
            bail!("SUMMARY_MAX_ATTEMPTS must be at least 1");
        }
        if self.rate_limit_per_day == 0 {
            bail!("RATE_LIMIT_PER_DAY must be at least 1");
        }
        if self.llm_max_retries == 0 {
            bail!("LLM_MAX_RETRIES must be at least 1");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    non_blank(key, value)
}

fn non_blank(key: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Baseline configuration for tests; never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            openai_api_key: "test-key".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            llm_max_retries: 1,
            summary_max_attempts: 3,
            summary_max_tokens: 200,
            rate_limit_per_day: 50,
            trust_forwarded_for: false,
            max_upload_bytes: 1024 * 1024,
            tesseract_path: "tesseract".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
