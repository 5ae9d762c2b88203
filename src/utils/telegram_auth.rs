//! Verification of the `initData` payload Telegram hands to a Mini App at launch.
//!
//! See <https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app>.
//! Everything here is pure: no logging, no environment reads, no shared state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::models::telegram_user::{AuthenticatedIdentity, WebAppChat, WebAppUser};

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Decoded `initData` fields. A `BTreeMap` keeps keys in byte-wise order,
/// which is exactly the order the data-check string needs.
pub type InitDataFields = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("init data carries no hash")]
    MissingSignature,

    #[error("init data signature does not match")]
    SignatureMismatch,

    #[error("user field is not a valid Telegram user object")]
    MalformedUserField,

    #[error("chat field is not a valid Telegram chat object")]
    MalformedChatField,

    #[error("auth_date is missing or not a unix timestamp")]
    MalformedAuthDate,

    #[error("init data is older than the allowed window")]
    Expired,

    #[error("bot token is not configured")]
    MissingSecret,
}

impl AuthError {
    /// Stable snake_case code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingSignature => "missing_signature",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::MalformedUserField => "malformed_user_field",
            AuthError::MalformedChatField => "malformed_chat_field",
            AuthError::MalformedAuthDate => "malformed_auth_date",
            AuthError::Expired => "expired",
            AuthError::MissingSecret => "missing_secret",
        }
    }
}

/// How the derived secret key is fed into the second HMAC.
///
/// Telegram's signer uses the raw 32 bytes. `HexText` keys the second HMAC with
/// the lowercase hex rendering instead, which is what some JavaScript front ends
/// (crypto-js `.toString()`) end up doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyChaining {
    #[default]
    RawBytes,
    HexText,
}

impl std::str::FromStr for KeyChaining {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "raw_bytes" | "bytes" => Ok(KeyChaining::RawBytes),
            "hex" | "hex_text" => Ok(KeyChaining::HexText),
            other => Err(format!("unknown key chaining mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Freshness bound on `auth_date`; `None` disables the check.
    pub max_age_seconds: Option<u64>,
    pub chaining: KeyChaining,
    pub now: DateTime<Utc>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_age_seconds: None,
            chaining: KeyChaining::default(),
            now: Utc::now(),
        }
    }
}

/// Validates `raw` against the bot token `secret` and returns the signed identity.
pub fn validate(
    raw: &str,
    secret: &str,
    max_age_seconds: Option<u64>,
) -> Result<AuthenticatedIdentity, AuthError> {
    let options = ValidationOptions {
        max_age_seconds,
        ..ValidationOptions::default()
    };
    validate_with(raw, secret, &options)
}

pub fn validate_with(
    raw: &str,
    secret: &str,
    options: &ValidationOptions,
) -> Result<AuthenticatedIdentity, AuthError> {
    let mut fields = parse_init_data(raw);
    let hash = fields.remove("hash").ok_or(AuthError::MissingSignature)?;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let computed = sign(&fields, secret, options.chaining);
    let provided = hash.to_ascii_lowercase();
    if !bool::from(computed.as_bytes().ct_eq(provided.as_bytes())) {
        return Err(AuthError::SignatureMismatch);
    }

    let auth_date = parse_auth_date(&fields)?;
    if let Some(max_age) = options.max_age_seconds {
        let age = options.now.timestamp().saturating_sub(auth_date.timestamp());
        if age > i64::try_from(max_age).unwrap_or(i64::MAX) {
            return Err(AuthError::Expired);
        }
    }

    identity_from_fields(&fields, auth_date, provided)
}

/// Builds an identity from fields whose signature has NOT been checked.
/// Only reachable through an explicit bypass policy.
pub fn read_unverified(raw: &str) -> Result<AuthenticatedIdentity, AuthError> {
    let mut fields = parse_init_data(raw);
    let hash = fields.remove("hash").unwrap_or_default();
    let auth_date = parse_auth_date(&fields)?;
    identity_from_fields(&fields, auth_date, hash)
}

/// Percent-decodes a query string. Duplicated keys keep their last value.
pub fn parse_init_data(raw: &str) -> InitDataFields {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// `key=value` lines in byte-wise key order, joined by `\n`. `hash` must already be removed.
pub fn data_check_string(fields: &InitDataFields) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// HMAC-SHA256 keyed with "WebAppData" over the bot token.
pub fn derive_secret_key(secret: &str) -> [u8; 32] {
    let mut mac = hmac_sha256(WEB_APP_DATA_KEY);
    mac.update(secret.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    key
}

/// Lowercase hex signature the host would attach to `fields`.
pub fn sign(fields: &InitDataFields, secret: &str, chaining: KeyChaining) -> String {
    let secret_key = derive_secret_key(secret);
    let mut mac = match chaining {
        KeyChaining::RawBytes => hmac_sha256(&secret_key),
        KeyChaining::HexText => hmac_sha256(hex::encode(secret_key).as_bytes()),
    };
    mac.update(data_check_string(fields).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn hmac_sha256(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length")
}

fn parse_auth_date(fields: &InitDataFields) -> Result<DateTime<Utc>, AuthError> {
    fields
        .get("auth_date")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(crate::utils::time::from_unix_seconds)
        .ok_or(AuthError::MalformedAuthDate)
}

fn identity_from_fields(
    fields: &InitDataFields,
    auth_date: DateTime<Utc>,
    signature_hex: String,
) -> Result<AuthenticatedIdentity, AuthError> {
    let user = parse_json_field::<WebAppUser>(fields, "user", AuthError::MalformedUserField)?;
    let receiver =
        parse_json_field::<WebAppUser>(fields, "receiver", AuthError::MalformedUserField)?;
    let chat = parse_json_field::<WebAppChat>(fields, "chat", AuthError::MalformedChatField)?;

    Ok(AuthenticatedIdentity {
        user,
        receiver,
        chat,
        query_id: fields.get("query_id").cloned(),
        chat_type: fields.get("chat_type").cloned(),
        chat_instance: fields.get("chat_instance").cloned(),
        start_param: fields.get("start_param").cloned(),
        can_send_after: fields
            .get("can_send_after")
            .and_then(|v| v.parse::<u64>().ok()),
        auth_date,
        signature_hex,
    })
}

fn parse_json_field<T: serde::de::DeserializeOwned>(
    fields: &InitDataFields,
    key: &str,
    err: AuthError,
) -> Result<Option<T>, AuthError> {
    match fields.get(key) {
        Some(raw) => serde_json::from_str(raw).map(Some).map_err(|_| err),
        None => Ok(None),
    }
}
