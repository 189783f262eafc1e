use crate::config::{Config, Transport};
use crate::mcp;
use crate::tools::Tools;
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::TypedHeader;
use constant_time_eq::constant_time_eq;
use headers::{authorization::Bearer, Authorization};
use std::{net::SocketAddr, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<Tools>,
    pub auth_token: Option<String>,
}

pub async fn run(config: Config) -> Result<()> {
    let settings = config.server.clone();
    let tools = Arc::new(Tools::from_config(config)?);
    match settings.transport {
        Transport::Stdio => run_stdio(tools).await,
        Transport::Http => {
            if settings.auth_token.is_none() {
                warn!("MCP_AUTH_TOKEN not set - HTTP endpoint is unauthenticated");
            }
            let state = AppState {
                tools,
                auth_token: settings.auth_token,
            };
            run_http(state, settings.bind).await
        }
    }
}

/// Serves line-delimited JSON-RPC on stdin/stdout until stdin closes.
pub async fn run_stdio(tools: Arc<Tools>) -> Result<()> {
    info!("Serving tool calls on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(&tools, stdin, tokio::io::stdout()).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

/// One message per line in, one response per line out. Lines stay raw bytes:
/// a frame that is not UTF-8 is answered with a parse error.
pub async fn serve_lines<R, W>(tools: &Tools, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        if let Some(response) = mcp::handle_message(tools, &line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
}

pub async fn run_http(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = build_router(state);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(handle_rpc))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn handle_rpc(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = state.auth_token.as_deref() {
        let presented = bearer.as_ref().map(|TypedHeader(auth)| auth.token());
        let authorized = presented
            .is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()));
        if !authorized {
            warn!("Rejecting tool call: invalid or missing bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Invalid or missing bearer token"})),
            )
                .into_response();
        }
    }

    let content_type_ok = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        == Some(true);
    if !content_type_ok {
        warn!(
            "Rejecting request: unsupported content-type {:?}",
            headers.get(header::CONTENT_TYPE)
        );
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    match mcp::handle_message(&state.tools, &body).await {
        Some(response) => {
            if let Some(err) = &response.error {
                debug!("JSON-RPC error {}: {}", err.code, err.message);
            }
            Json(response).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
