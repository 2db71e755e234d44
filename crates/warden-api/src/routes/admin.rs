//! 관리자 전용 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AdminAuth;
use crate::error::ApiResult;
use crate::state::AppState;

/// 사용자 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersListResponse {
    pub users: Vec<String>,
    pub total: usize,
}

/// 등록된 사용자 이름 목록.
///
/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminAuth(admin): AdminAuth,
) -> ApiResult<Json<UsersListResponse>> {
    let users: Vec<String> = state
        .identity
        .list_usernames()
        .await
        .map_err(|e| state.reject(e))?
        .into_iter()
        .map(|u| u.to_string())
        .collect();

    tracing::debug!(admin = %admin.username, total = users.len(), "Listed users");
    Ok(Json(UsersListResponse {
        total: users.len(),
        users,
    }))
}

/// 관리자 라우터 생성.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(list_users))
}
