//! API 에러 응답.
//!
//! 모든 엔드포인트에서 같은 JSON 형식을 사용합니다:
//!
//! ```json
//! {
//!   "code": "UNAUTHORIZED",
//!   "message": "인증 정보가 올바르지 않습니다",
//!   "timestamp": 1738300800
//! }
//! ```
//!
//! 인증 실패의 내부 원인(만료, 위조, 없는 사용자 등)은 응답에 드러나지 않고 로그에만 남습니다.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use warden_core::{AuthError, AuthScheme, ErrorKind};

/// 인증 challenge에 사용하는 realm
pub const AUTH_REALM: &str = "warden";

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "UNAUTHORIZED", "USERNAME_TAKEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// HTTP 에러.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
    /// 401 응답에 붙일 challenge
    pub challenge: Option<AuthScheme>,
}

impl ApiError {
    /// 코어 에러를 HTTP 에러로 변환합니다.
    ///
    /// 저장소/내부 에러는 상세 내용을 기록한 뒤 일반 메시지만 반환합니다.
    pub fn from_auth(err: AuthError, scheme: AuthScheme) -> Self {
        let (status, code) = match err.kind() {
            ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::UsernameTaken => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ErrorKind::StoreUnavailable | ErrorKind::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if !err.is_client_error() {
            tracing::error!(error = %err, kind = ?err.kind(), "Request failed");
        }

        Self {
            status,
            body: ApiErrorResponse::new(code, err.public_message()),
            challenge: (status == StatusCode::UNAUTHORIZED).then_some(scheme),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(scheme) = self.challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, challenge_header(scheme));
        }
        response
    }
}

fn challenge_header(scheme: AuthScheme) -> HeaderValue {
    let value = match scheme {
        AuthScheme::Basic => format!("Basic realm=\"{}\"", AUTH_REALM),
        AuthScheme::Bearer => format!("Bearer realm=\"{}\"", AUTH_REALM),
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("Bearer"))
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;
