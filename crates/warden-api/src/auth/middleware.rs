//! Axum 인증 추출기.
//!
//! 핸들러 인자로 선언하면 핸들러 본문이 실행되기 전에 인증/인가가 끝납니다.
//!
//! ```rust,ignore
//! async fn list_users(AdminAuth(admin): AdminAuth) -> impl IntoResponse {
//!     format!("Hello, {}", admin.username)
//! }
//! ```

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use warden_core::{AuthError, Principal, RoleSet, UnauthorizedReason};

use super::header::credentials_from_headers;
use crate::error::ApiError;
use crate::state::AppState;

/// 인증된 주체 추출기.
///
/// 설정된 방식(Basic 또는 Bearer)의 `Authorization` 헤더만 받아들입니다.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials_from_headers(&parts.headers, state.scheme).ok_or_else(|| {
            tracing::debug!(path = %parts.uri.path(), "Missing or malformed Authorization header");
            state.reject(AuthError::Unauthorized(
                UnauthorizedReason::MissingCredentials,
            ))
        })?;

        let principal = state
            .identity
            .authenticate(&credentials)
            .await
            .map_err(|e| state.reject(e))?;

        Ok(Authenticated(principal))
    }
}

/// 선택적 인증 추출기.
///
/// 헤더가 없으면 `None`, 헤더가 있으면 반드시 유효해야 합니다.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Ok(MaybeAuthenticated(None));
        }
        let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;
        Ok(MaybeAuthenticated(Some(principal)))
    }
}

/// 허용 역할 집합으로 인증된 주체를 확인합니다.
async fn authorized(
    parts: &mut Parts,
    state: &Arc<AppState>,
    allowed: &RoleSet,
) -> Result<Principal, ApiError> {
    let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;
    state
        .identity
        .authorize(&principal, allowed)
        .map_err(|e| state.reject(e))?;
    Ok(principal)
}

/// Admin 권한을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub Principal);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authorized(parts, state, &RoleSet::admin()).await.map(AdminAuth)
    }
}

/// Admin 또는 Customer 권한을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct MemberAuth(pub Principal);

impl FromRequestParts<Arc<AppState>> for MemberAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authorized(parts, state, &RoleSet::members()).await.map(MemberAuth)
    }
}
