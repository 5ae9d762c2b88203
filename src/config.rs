use crate::error::{Error, Result};
use crate::utils::telegram_auth::KeyChaining;
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// What to do with a launch payload when signatures are not being checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Every payload must carry a valid signature; no bot token means every login fails.
    #[default]
    Enforce,
    /// Payloads are trusted without a signature check. Development only.
    Bypass,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Enforce => "enforce",
            AuthMode::Bypass => "bypass",
        }
    }
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" => Ok(AuthMode::Enforce),
            "bypass" => Ok(AuthMode::Bypass),
            other => Err(format!("unknown auth mode '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_address: String,
    pub telegram_bot_token: Option<String>,
    pub auth_mode: AuthMode,
    pub init_data_max_age_secs: Option<u64>,
    pub key_chaining: KeyChaining,
    pub session_ttl_secs: u64,
    pub auth_rps: u32,
    pub cors_allowed_origin: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_address", &self.server_address)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_mode", &self.auth_mode)
            .field("init_data_max_age_secs", &self.init_data_max_age_secs)
            .field("key_chaining", &self.key_chaining)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("auth_rps", &self.auth_rps)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .finish()
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            telegram_bot_token: get_env_opt("TELEGRAM_BOT_TOKEN"),
            auth_mode: get_env_parse_or("TELEGRAM_AUTH_MODE", AuthMode::Enforce)?,
            init_data_max_age_secs: get_env_parse_opt("TELEGRAM_INIT_DATA_MAX_AGE_SECS")?,
            key_chaining: get_env_parse_or("TELEGRAM_KEY_CHAINING", KeyChaining::RawBytes)?,
            session_ttl_secs: get_env_parse_or("SESSION_TTL_SECS", 86_400)?,
            auth_rps: get_env_parse_or("AUTH_RPS", 20)?,
            cors_allowed_origin: get_env_opt("CORS_ALLOWED_ORIGIN"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_opt(name).map(|raw| parse_value(name, &raw)).transpose()
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse_opt(name)?.unwrap_or(default))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_parses_case_insensitively() {
        assert_eq!("Bypass".parse::<AuthMode>(), Ok(AuthMode::Bypass));
        assert_eq!("enforce".parse::<AuthMode>(), Ok(AuthMode::Enforce));
        assert!("trust".parse::<AuthMode>().is_err());
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = parse_value::<u64>("SESSION_TTL_SECS", "soon").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("SESSION_TTL_SECS")));
    }

    #[test]
    fn debug_output_hides_bot_token() {
        let config = Config {
            server_address: "127.0.0.1:0".into(),
            telegram_bot_token: Some("123:secret".into()),
            auth_mode: AuthMode::Enforce,
            init_data_max_age_secs: None,
            key_chaining: KeyChaining::RawBytes,
            session_ttl_secs: 60,
            auth_rps: 5,
            cors_allowed_origin: None,
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("123:secret"));
        assert!(printed.contains("<redacted>"));
    }
}
