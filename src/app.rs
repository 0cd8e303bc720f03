use std::{future::IntoFuture, net::SocketAddr, time::Duration};

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth;
use crate::config::ServerConfig;
use crate::error::ErrorBody;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .nest(
            "/v1",
            Router::new()
                .nest("/auth", auth::router(state.clone()))
                .route("/health", get(|| async { Json(json!({ "status": "ok" })) })),
        )
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": "PAGE_NOT_FOUND", "message": "Page not found" })),
            )
        })
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(uniform_error_body))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_owned();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        %request_id,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Gives the bodiless 405 from method routing and 408 from the timeout layer
/// the same `{code, message}` shape as every other error.
async fn uniform_error_body(res: Response) -> Response {
    let code = match res.status() {
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        _ => return res,
    };
    if res.headers().contains_key(header::CONTENT_TYPE) {
        return res;
    }

    let (parts, _) = res.into_parts();
    let message = parts
        .status
        .canonical_reason()
        .unwrap_or_default()
        .to_string();
    let mut out = (parts.status, Json(ErrorBody { code, message })).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_LENGTH {
            out.headers_mut().append(name.clone(), value.clone());
        }
    }
    out
}

/// Serves until SIGINT/SIGTERM, then drains in-flight requests for at most
/// `shutdown_grace_secs` before returning.
pub async fn serve(app: Router, cfg: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    let grace = Duration::from_secs(cfg.shutdown_grace_secs);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (tx, mut rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });

    let mut drain_rx = rx.clone();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = drain_rx.wait_for(|stop| *stop).await;
    });

    tokio::select! {
        res = server.into_future() => res?,
        _ = async {
            let _ = rx.wait_for(|stop| *stop).await;
            tokio::time::sleep(grace).await;
        } => tracing::warn!(grace_secs = cfg.shutdown_grace_secs, "shutdown grace elapsed, dropping connections"),
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
