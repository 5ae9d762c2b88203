use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::telegram_user::AuthenticatedIdentity;

#[derive(Debug, Deserialize, Validate)]
pub struct TelegramLoginRequest {
    #[validate(length(min = 1, max = 4096))]
    pub init_data: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub display_name: String,
    pub identity: AuthenticatedIdentity,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub identity: AuthenticatedIdentity,
}
