//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use warden_core::{AuthError, AuthScheme, IdentityService};

use crate::error::ApiError;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 `Arc<AppState>`로 핸들러에 주입됩니다.
#[derive(Debug, Clone)]
pub struct AppState {
    /// 인증/인가 서비스
    pub identity: Arc<IdentityService>,
    /// 요청 인증 방식 (Basic 또는 Bearer)
    pub scheme: AuthScheme,
    /// API 버전
    pub version: String,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(identity: Arc<IdentityService>, scheme: AuthScheme) -> Self {
        Self {
            identity,
            scheme,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 코어 에러를 이 서비스의 인증 방식에 맞는 HTTP 에러로 변환합니다.
    pub fn reject(&self, err: AuthError) -> ApiError {
        ApiError::from_auth(err, self.scheme)
    }
}
