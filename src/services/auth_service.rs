use std::sync::Arc;

use crate::config::{AuthMode, Config};
use crate::models::telegram_user::AuthenticatedIdentity;
use crate::utils::telegram_auth::{self, AuthError, KeyChaining, ValidationOptions};

/// Applies the configured policy around `initData` validation.
#[derive(Clone)]
pub struct AuthService {
    mode: AuthMode,
    bot_token: Option<Arc<str>>,
    max_age_secs: Option<u64>,
    chaining: KeyChaining,
}

impl AuthService {
    pub fn new(
        mode: AuthMode,
        bot_token: Option<String>,
        max_age_secs: Option<u64>,
        chaining: KeyChaining,
    ) -> Self {
        match (mode, bot_token.is_some()) {
            (AuthMode::Bypass, _) => tracing::warn!(
                "Telegram auth mode is BYPASS: initData signatures will not be checked"
            ),
            (AuthMode::Enforce, false) => tracing::warn!(
                "TELEGRAM_BOT_TOKEN is not set: every Telegram login will be rejected"
            ),
            (AuthMode::Enforce, true) => tracing::info!(
                max_age_secs = ?max_age_secs,
                chaining = ?chaining,
                "Telegram initData validation enabled"
            ),
        }

        Self {
            mode,
            bot_token: bot_token.map(Arc::from),
            max_age_secs,
            chaining,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.auth_mode,
            config.telegram_bot_token.clone(),
            config.init_data_max_age_secs,
            config.key_chaining,
        )
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn authenticate(&self, raw: &str) -> Result<AuthenticatedIdentity, AuthError> {
        match self.mode {
            AuthMode::Bypass => {
                tracing::debug!("Accepting initData without signature check (bypass mode)");
                telegram_auth::read_unverified(raw)
            }
            AuthMode::Enforce => {
                let secret = self.bot_token.as_deref().ok_or(AuthError::MissingSecret)?;
                let options = ValidationOptions {
                    max_age_seconds: self.max_age_secs,
                    chaining: self.chaining,
                    now: crate::utils::time::now(),
                };
                telegram_auth::validate_with(raw, secret, &options)
            }
        }
    }
}
