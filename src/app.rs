use std::net::SocketAddr;

use axum::{http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::AVATARS_URL_PREFIX;
use crate::{admin, auth, books, exchange, profile};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);
    let avatars = ServeDir::new(&state.config.avatars_dir);

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(books::router())
                .merge(exchange::router())
                .merge(profile::router())
                .merge(admin::router())
                .route("/health", get(health)),
        )
        .nest_service(AVATARS_URL_PREFIX, avatars)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        match origin.trim().parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(error = %e, origin, "unusable CORS_ORIGIN; cross-origin calls refused");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };
    CorsLayer::new()
        .allow_origin(allow)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
