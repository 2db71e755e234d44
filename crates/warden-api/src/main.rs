//! 인증/인가 API 서버.
//!
//! 설정을 로드하고, 초기 사용자를 생성한 뒤 Axum 서버를 시작합니다.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use warden_api::routes::create_api_router;
use warden_api::state::AppState;
use warden_core::{init_logging, IdentityService, LogConfig, WardenConfig};

/// 설정 파일 경로 (`WARDEN_CONFIG` 또는 `config/warden.toml`).
fn config_path() -> PathBuf {
    std::env::var("WARDEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/warden.toml"))
}

fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WardenConfig::load(Some(config_path().as_path())).context("설정 로드 실패")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting Warden API server...");

    let identity = Arc::new(IdentityService::from_config(&config)?);

    let seeded = identity.seed_if_empty(&config.auth.seed_users).await?;
    if seeded > 0 {
        info!(count = seeded, "Seed users created");
    } else if config.auth.seed_users.is_empty() && identity.list_usernames().await?.is_empty() {
        warn!("Credential store is empty and no seed users are configured");
    }

    let state = Arc::new(AppState::new(identity, config.auth.scheme));
    info!(version = %state.version, scheme = ?state.scheme, "Application state initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "소켓 주소가 유효하지 않습니다: {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
