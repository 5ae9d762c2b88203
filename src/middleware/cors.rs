use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// The Mini App is served from its own origin; pin it when known.
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match allowed_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => base.allow_origin(origin),
        None => {
            if allowed_origin.is_some() {
                tracing::warn!("CORS_ALLOWED_ORIGIN is not a valid header value, allowing any origin");
            }
            base.allow_origin(Any)
        }
    }
}
