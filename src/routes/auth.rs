use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    dto::auth_dto::{LoginResponse, MeResponse, TelegramLoginRequest},
    error::{Error, Result},
    middleware::auth::SessionToken,
    services::session_service::Session,
    utils::validation::validate,
    AppState,
};

pub async fn telegram_login(
    State(state): State<AppState>,
    Json(payload): Json<TelegramLoginRequest>,
) -> Result<Json<LoginResponse>> {
    validate(&payload)?;

    let identity = match state.auth_service.authenticate(&payload.init_data) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::info!(reason = err.code(), "Rejected Telegram login");
            return Err(err.into());
        }
    };

    let display_name = identity.display_name();
    tracing::info!(
        user_id = ?identity.user_id(),
        start_param = ?identity.start_param,
        "Telegram login accepted"
    );

    let (token, session) = state.session_service.create(identity);
    Ok(Json(LoginResponse {
        token,
        expires_at: session.expires_at,
        display_name,
        identity: session.identity,
    }))
}

pub async fn me(Extension(session): Extension<Session>) -> Json<MeResponse> {
    Json(MeResponse {
        display_name: session.identity.display_name(),
        avatar_url: session.identity.avatar_url().map(str::to_string),
        expires_at: session.expires_at,
        identity: session.identity,
    })
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<StatusCode> {
    if state.session_service.revoke(&token) {
        tracing::info!("Session revoked");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::Unauthorized("invalid_session".into()))
    }
}
