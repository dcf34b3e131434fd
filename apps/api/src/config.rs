use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::document::info::SectionRule;
use crate::llm_client::retry::RetryPolicy;

const DEFAULT_LLM_API_BASE: &str = "https://api.deepseek.com";
const DEFAULT_LLM_MODEL: &str = "deepseek-chat";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: LlmConfig,
    pub retry: RetryPolicy,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: u64,
    /// Number of questions requested per interview session.
    pub question_count: usize,
    pub section_rules: Vec<SectionRule>,
    pub port: u16,
    pub rust_log: String,
}

/// Connection settings for the chat-completions backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let llm = LlmConfig {
            api_base: or_default("LLM_API_BASE", DEFAULT_LLM_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            api_key: require("LLM_API_KEY")?,
            model: or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            timeout: Duration::from_secs(parse_number(&lookup, "LLM_TIMEOUT_SECS", 30)?),
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_number(&lookup, "LLM_MAX_ATTEMPTS", defaults.max_attempts)?.max(1),
            base_delay: Duration::from_millis(parse_number(
                &lookup,
                "LLM_RETRY_BASE_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
            ..defaults
        };

        let mut section_rules = SectionRule::defaults();
        for (key, section) in [
            ("EDUCATION_KEYWORDS", "education"),
            ("EXPERIENCE_KEYWORDS", "experience"),
        ] {
            if let Some(raw) = lookup(key) {
                let keywords = split_keywords(&raw);
                if keywords.is_empty() {
                    anyhow::bail!("{key} must list at least one keyword");
                }
                if let Some(rule) = section_rules.iter_mut().find(|r| r.name == section) {
                    rule.keywords = keywords;
                }
            }
        }

        let upload_max_mb: u64 = parse_number(&lookup, "UPLOAD_MAX_MB", 10)?;
        let upload_max_bytes = upload_max_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("UPLOAD_MAX_MB is too large, got {upload_max_mb}"))?;

        let question_count: usize = parse_number(&lookup, "QUESTION_COUNT", 5)?;
        if question_count == 0 {
            anyhow::bail!("QUESTION_COUNT must be at least 1");
        }

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            llm,
            retry,
            upload_dir: PathBuf::from(or_default("UPLOAD_DIR", "./uploads")),
            upload_max_bytes,
            question_count,
            section_rules,
            port: parse_number(&lookup, "PORT", 8080)?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
