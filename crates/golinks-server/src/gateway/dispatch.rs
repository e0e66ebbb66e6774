//! Top-level request routing: `/api/v1/*` to the REST translator, the
//! `golinks.api.v1.*` service paths to the browser-framing adapter, and
//! everything else to the static handler (when configured) or 404.

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Assemble the public HTTP router from the two translator routers.
pub fn build_router(
    rest: Router,
    web: Router,
    static_dir: Option<&str>,
    allowed_origins: &[String],
) -> Router {
    // The REST router is fallback-only, so it is mounted as a service; the
    // prefix is stripped before its translate handler sees the path.
    let mut app = Router::new()
        .nest_service("/api/v1", rest)
        .merge(web)
        .route("/api/health", axum::routing::get(health_check))
        .layer(build_cors(allowed_origins))
        .layer(TraceLayer::new_for_http());

    if let Some(static_dir) = static_dir {
        let static_path = std::path::Path::new(static_dir);
        if static_path.exists() && static_path.is_dir() {
            tracing::info!("Serving static frontend from: {}", static_dir);
            let serve_dir = tower_http::services::ServeDir::new(static_dir)
                .not_found_service(tower_http::services::ServeFile::new(
                    static_path.join("index.html"),
                ));
            app = app.fallback_service(serve_dir);
        } else {
            tracing::warn!(
                "Static directory not found: {}. Frontend won't be served.",
                static_dir
            );
        }
    }

    app
}

/// Cross-origin policy. An empty list or a `*` entry allows any origin;
/// otherwise only the listed origins pass preflight.
fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "golinks-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
