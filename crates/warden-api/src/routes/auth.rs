//! 등록/로그인 endpoint.
//!
//! - `POST /register`: 새 사용자 등록
//! - `POST /login`: 비밀번호 확인 (Bearer 방식이면 토큰 발급)
//! - `GET /me`: 현재 주체 조회 (Admin/Customer)
//!
//! 토큰은 갱신되지 않습니다. 만료되면 다시 로그인해야 합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use warden_core::{AuthScheme, Credentials, Principal, Role};

use crate::auth::{MaybeAuthenticated, MemberAuth};
use crate::error::ApiResult;
use crate::state::AppState;

/// 등록 요청.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// 요청 역할 (생략 시 기본 역할)
    #[serde(default)]
    pub role: Option<Role>,
}

/// 로그인 요청.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 비밀번호가 포함되지 않은 주체 정보.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub username: String,
    pub role: Role,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self {
            username: principal.username.to_string(),
            role: principal.role,
        }
    }
}

/// Basic 방식 로그인 응답 (토큰 없음).
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginMessage {
    pub message: String,
    pub username: String,
    pub role: Role,
}

/// 새 사용자를 등록합니다.
///
/// 인증된 호출자가 등록하면 Admin만 Admin 역할을 부여할 수 있습니다.
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    MaybeAuthenticated(actor): MaybeAuthenticated,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<PrincipalResponse>)> {
    let result = match actor {
        Some(actor) => {
            state
                .identity
                .register_by(&actor, &req.username, &req.password, req.role)
                .await
        }
        None => {
            state
                .identity
                .register(&req.username, &req.password, req.role)
                .await
        }
    };

    let principal = result.map_err(|e| state.reject(e))?;
    Ok((StatusCode::CREATED, Json(principal.into())))
}

/// 로그인.
///
/// Bearer 방식이면 토큰을, Basic 방식이면 확인 메시지를 반환합니다.
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    match state.scheme {
        AuthScheme::Bearer => {
            let issued = state
                .identity
                .login(&req.username, &req.password)
                .await
                .map_err(|e| state.reject(e))?;
            Ok(Json(issued).into_response())
        }
        AuthScheme::Basic => {
            let principal = state
                .identity
                .authenticate(&Credentials::basic(req.username, req.password))
                .await
                .map_err(|e| state.reject(e))?;
            Ok(Json(LoginMessage {
                message: "Login successful".to_string(),
                username: principal.username.to_string(),
                role: principal.role,
            })
            .into_response())
        }
    }
}

/// 현재 주체 조회.
///
/// GET /api/v1/auth/me
pub async fn me(MemberAuth(principal): MemberAuth) -> Json<PrincipalResponse> {
    Json(principal.into())
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}
