use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `user` / `receiver` object embedded in `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_write_to_pm: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppChat {
    pub id: i64,
    pub r#type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// What a launch proved about its caller. Only built by a successful
/// validation (or an explicit bypass), never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub user: Option<WebAppUser>,
    pub receiver: Option<WebAppUser>,
    pub chat: Option<WebAppChat>,
    pub query_id: Option<String>,
    pub chat_type: Option<String>,
    pub chat_instance: Option<String>,
    pub start_param: Option<String>,
    pub can_send_after: Option<u64>,
    pub auth_date: DateTime<Utc>,
    pub signature_hex: String,
}

impl AuthenticatedIdentity {
    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// `@username` when set, otherwise the full name, otherwise a generic label.
    pub fn display_name(&self) -> String {
        let Some(user) = &self.user else {
            return "Telegram User".to_string();
        };
        if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{}", username);
        }
        match user.last_name.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {}", user.first_name, last),
            None if !user.first_name.is_empty() => user.first_name.clone(),
            None => "Telegram User".to_string(),
        }
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.user.as_ref()?.photo_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user: Option<WebAppUser>) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user,
            receiver: None,
            chat: None,
            query_id: None,
            chat_type: None,
            chat_instance: None,
            start_param: None,
            can_send_after: None,
            auth_date: Utc::now(),
            signature_hex: String::new(),
        }
    }

    fn ann() -> WebAppUser {
        serde_json::from_str(r#"{"id":42,"first_name":"Ann"}"#).unwrap()
    }

    #[test]
    fn display_name_prefers_username() {
        let mut user = ann();
        user.username = Some("ann_ton".into());
        user.last_name = Some("Lee".into());
        assert_eq!(identity(Some(user)).display_name(), "@ann_ton");
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        let mut user = ann();
        user.last_name = Some("Lee".into());
        assert_eq!(identity(Some(user)).display_name(), "Ann Lee");
        assert_eq!(identity(Some(ann())).display_name(), "Ann");
        assert_eq!(identity(None).display_name(), "Telegram User");
    }

    #[test]
    fn optional_fields_are_not_serialized_when_absent() {
        let json = serde_json::to_value(ann()).unwrap();
        assert_eq!(json, serde_json::json!({"id": 42, "first_name": "Ann"}));
    }

    #[test]
    fn avatar_comes_from_photo_url() {
        let mut user = ann();
        assert_eq!(identity(Some(user.clone())).avatar_url(), None);
        user.photo_url = Some("https://t.me/i/userpic/320/a.svg".into());
        assert_eq!(
            identity(Some(user)).avatar_url(),
            Some("https://t.me/i/userpic/320/a.svg")
        );
    }
}
