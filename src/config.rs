use std::fmt;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    Missing(&'static str),
    /// A numeric variable failed to parse.
    InvalidNumber {
        key: &'static str,
        value: String,
        source: std::num::ParseIntError,
    },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} is not set"),
            Self::InvalidNumber { key, value, source } => {
                write!(f, "invalid value '{value}' for {key}: {source}")
            }
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidNumber { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub suno_api_key: String,
    /// Provider base URL, without trailing slash.
    pub suno_base_url: String,
    pub poll_interval_sec: u64,
    pub generation_timeout_sec: u64,
    /// Provider statuses that mean the task will never complete.
    /// Configuration data rather than an enum: the provider adds new ones.
    pub failed_statuses: Vec<String>,
}

const DEFAULT_BASE_URL: &str = "https://api.sunoapi.org";
const DEFAULT_POLL_INTERVAL_SEC: u64 = 10;
const DEFAULT_GENERATION_TIMEOUT_SEC: u64 = 300;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telegram_bot_token = required(&get, "TELEGRAM_BOT_TOKEN")?;
        let suno_api_key = required(&get, "SUNO_API_KEY")?;

        let suno_base_url = optional(&get, "SUNO_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_interval_sec =
            parse_seconds(&get, "POLL_INTERVAL_SEC", DEFAULT_POLL_INTERVAL_SEC)?;
        let generation_timeout_sec =
            parse_seconds(&get, "GENERATION_TIMEOUT_SEC", DEFAULT_GENERATION_TIMEOUT_SEC)?;

        if poll_interval_sec == 0 {
            return Err(ConfigError::Validation(
                "POLL_INTERVAL_SEC must be greater than zero".into(),
            ));
        }

        let failed_statuses = match optional(&get, "SUNO_FAILED_STATUSES") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => default_failed_statuses(),
        };

        Ok(Self {
            telegram_bot_token,
            suno_api_key,
            suno_base_url,
            poll_interval_sec,
            generation_timeout_sec,
            failed_statuses,
        })
    }
}

fn required<F>(get: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(get, key).ok_or(ConfigError::Missing(key))
}

fn optional<F>(get: &F, key: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key).filter(|v| !v.trim().is_empty())
}

fn parse_seconds<F>(get: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(get, key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidNumber { key, value, source: e }),
        None => Ok(default),
    }
}

fn default_failed_statuses() -> Vec<String> {
    [
        "CREATE_TASK_FAILED",
        "GENERATE_AUDIO_FAILED",
        "CALLBACK_EXCEPTION",
        "SENSITIVE_WORD_ERROR",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    fn assert_err(result: Result<Config, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_minimal_config_with_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
        ]))
        .expect("should load minimal config");

        assert_eq!(config.telegram_bot_token, "123456789:ABCdef");
        assert_eq!(config.suno_api_key, "sk-test");
        assert_eq!(config.suno_base_url, "https://api.sunoapi.org");
        assert_eq!(config.poll_interval_sec, 10);
        assert_eq!(config.generation_timeout_sec, 300);
        assert_eq!(config.failed_statuses.len(), 4);
        assert!(config.failed_statuses.contains(&"SENSITIVE_WORD_ERROR".to_string()));
    }

    #[test]
    fn test_missing_token() {
        let err = assert_err(Config::from_lookup(lookup(&[("SUNO_API_KEY", "sk-test")])));
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_missing_api_key() {
        let err = assert_err(Config::from_lookup(lookup(&[(
            "TELEGRAM_BOT_TOKEN",
            "123456789:ABCdef",
        )])));
        assert!(matches!(err, ConfigError::Missing("SUNO_API_KEY")));
        assert!(err.to_string().contains("SUNO_API_KEY"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = assert_err(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "  "),
            ("SUNO_API_KEY", "sk-test"),
        ])));
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
            ("SUNO_BASE_URL", "https://example.org/suno//"),
        ]))
        .unwrap();
        assert_eq!(config.suno_base_url, "https://example.org/suno");
    }

    #[test]
    fn test_invalid_poll_interval() {
        let err = assert_err(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
            ("POLL_INTERVAL_SEC", "ten"),
        ])));
        assert!(matches!(err, ConfigError::InvalidNumber { key: "POLL_INTERVAL_SEC", .. }));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = assert_err(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
            ("POLL_INTERVAL_SEC", "0"),
        ])));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_custom_timeout() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
            ("GENERATION_TIMEOUT_SEC", "120"),
        ]))
        .unwrap();
        assert_eq!(config.generation_timeout_sec, 120);
    }

    #[test]
    fn test_failed_statuses_override() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdef"),
            ("SUNO_API_KEY", "sk-test"),
            ("SUNO_FAILED_STATUSES", "create_task_failed, QUOTA_EXCEEDED,,"),
        ]))
        .unwrap();
        assert_eq!(
            config.failed_statuses,
            vec!["CREATE_TASK_FAILED".to_string(), "QUOTA_EXCEEDED".to_string()]
        );
    }
}
