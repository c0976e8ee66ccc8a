use std::collections::HashSet;
use std::fmt;
use teloxide::types::UserId;

const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
const WEATHER_KEY_VAR: &str = "WEATHERAPI_KEY";
const ALLOWED_IDS_VAR: &str = "ALLOWED_USER_IDS";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    MissingVar(&'static str),
    /// An entry in the allow-list is not a numeric user ID.
    InvalidUserId { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(var) => {
                write!(f, "required environment variable {var} is not set")
            }
            Self::InvalidUserId { var, value } => {
                write!(f, "{var} contains '{value}', expected a numeric Telegram user ID")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    /// WeatherAPI.com key. When absent, weather replies fall back to a static text.
    pub weatherapi_key: Option<String>,
    /// Users permitted to talk to the bot. Empty set means everyone is allowed.
    pub allowed_user_ids: HashSet<UserId>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let telegram_bot_token = lookup(BOT_TOKEN_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(BOT_TOKEN_VAR))?;
        let openai_api_key = lookup(OPENAI_KEY_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(OPENAI_KEY_VAR))?;
        let weatherapi_key = lookup(WEATHER_KEY_VAR).filter(|v| !v.is_empty());
        let allowed_user_ids = match lookup(ALLOWED_IDS_VAR) {
            Some(raw) => parse_allow_list(&raw)?,
            None => HashSet::new(),
        };

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            weatherapi_key,
            allowed_user_ids,
        })
    }

    /// Check if a user may talk to the bot. An empty allow-list admits everyone.
    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed_user_ids.is_empty() || self.allowed_user_ids.contains(&user_id)
    }
}

fn parse_allow_list(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<u64>().map(UserId).map_err(|_| ConfigError::InvalidUserId {
                var: ALLOWED_IDS_VAR,
                value: entry.to_string(),
            })
        })
        .collect()
}
