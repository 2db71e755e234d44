//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 저장소 포함 헬스 체크 (readiness)
//! - `/api/v1/auth` - 등록, 로그인, 토큰 갱신, 현재 주체
//! - `/api/v1/admin` - 관리자 전용

pub mod admin;
pub mod auth;
pub mod health;

pub use admin::{admin_router, UsersListResponse};
pub use auth::{auth_router, LoginMessage, LoginRequest, PrincipalResponse, RegisterRequest};
pub use health::{health_router, ComponentStatus, HealthResponse};

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/admin", admin_router())
}
