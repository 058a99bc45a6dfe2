use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// Restricts browsers to `origin` when one is configured, otherwise allows
/// any origin.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(value) => layer.allow_origin(value),
        None => {
            if let Some(raw) = origin {
                tracing::warn!(origin = raw, "Ignoring unparsable CORS_ORIGIN");
            }
            layer.allow_origin(Any)
        }
    }
}
