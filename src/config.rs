use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{0} is set but {1} is not")]
    Incomplete(&'static str, &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub url: String,
    pub element_id: String,
    pub game_name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: String,
    pub question_count: i64,
    pub time_limit_secs: i64,
    pub questions_file: Option<PathBuf>,
    pub game_name: String,
    pub supabase: Option<SupabaseConfig>,
    pub webhook: Option<WebhookConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let supabase = match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            (Some(_), None) => return Err(ConfigError::Incomplete("SUPABASE_URL", "SUPABASE_ANON_KEY")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("SUPABASE_ANON_KEY", "SUPABASE_URL")),
            (None, None) => None,
        };

        let webhook = var("RESULTS_WEBHOOK_URL").map(|url| WebhookConfig {
            url,
            element_id: var("WEBHOOK_ELEMENT_ID").unwrap_or_else(|| "04".to_string()),
            game_name: var("WEBHOOK_GAME_NAME").unwrap_or_else(|| "MCQ".to_string()),
            location: var("WEBHOOK_LOCATION").unwrap_or_else(|| "surat".to_string()),
        });

        Ok(Self {
            db_path: var("QUIZ_DB_PATH").unwrap_or_else(|| "db.sqlite".to_string()),
            question_count: parse_or(var("QUIZ_QUESTION_COUNT"), "QUIZ_QUESTION_COUNT", 10)?,
            time_limit_secs: parse_or(var("QUIZ_TIME_LIMIT_SECS"), "QUIZ_TIME_LIMIT_SECS", 120)?,
            questions_file: var("QUIZ_QUESTIONS_FILE").map(PathBuf::from),
            game_name: var("QUIZ_GAME_NAME").unwrap_or_else(|| "General Knowledge Quiz".to_string()),
            supabase,
            webhook,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
