//! 인증/인가 코어의 에러 타입.
//!
//! 외부 호출자에게는 [`ErrorKind`] 수준의 구분만 노출하고,
//! 세부 원인([`UnauthorizedReason`], 저장소 에러 상세)은 로그로만 남깁니다.

use thiserror::Error;

use crate::domain::Role;
use crate::store::StoreError;

/// 인증 실패의 내부 원인.
///
/// 관측용으로만 사용되며 외부 응답 메시지에는 드러나지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// 사용자 이름 또는 비밀번호 불일치 (둘 중 어느 쪽인지 구분하지 않음)
    BadCredentials,
    /// 서명은 유효하나 만료된 토큰
    TokenExpired,
    /// 서명 검증 실패 또는 형식이 잘못된 토큰
    TokenInvalid,
    /// 토큰 발급 이후 사용자 레코드가 사라짐
    SubjectVanished,
    /// 자격증명이 제시되지 않음
    MissingCredentials,
}

impl UnauthorizedReason {
    /// 로그 필드용 짧은 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnauthorizedReason::BadCredentials => "bad_credentials",
            UnauthorizedReason::TokenExpired => "token_expired",
            UnauthorizedReason::TokenInvalid => "token_invalid",
            UnauthorizedReason::SubjectVanished => "subject_vanished",
            UnauthorizedReason::MissingCredentials => "missing_credentials",
        }
    }
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 외부로 노출 가능한 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    UsernameTaken,
    InvalidInput,
    StoreUnavailable,
    Internal,
}

/// 인증/인가 코어 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 신원을 확인할 수 없음
    #[error("인증 정보가 올바르지 않습니다")]
    Unauthorized(UnauthorizedReason),

    /// 신원은 확인되었으나 역할이 부족함
    #[error("권한이 부족합니다 (현재 역할: {actual})")]
    Forbidden { actual: Role },

    /// 이미 존재하는 사용자 이름
    #[error("이미 존재하는 사용자 이름입니다")]
    UsernameTaken,

    /// 잘못된 입력 (사용자 이름 형식, 비밀번호 정책 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 저장소 I/O 실패
    #[error("저장소 에러: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// 내부 에러 (해싱 실패, 토큰 인코딩 실패 등)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 인증/인가 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// 에러 분류를 반환합니다.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
            AuthError::UsernameTaken => ErrorKind::UsernameTaken,
            AuthError::InvalidInput(_) => ErrorKind::InvalidInput,
            AuthError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 인증 실패의 내부 원인 (인증 실패가 아니면 `None`).
    pub fn unauthorized_reason(&self) -> Option<UnauthorizedReason> {
        match self {
            AuthError::Unauthorized(reason) => Some(*reason),
            _ => None,
        }
    }

    /// 외부 호출자에게 보여줄 수 있는 메시지.
    ///
    /// 저장소/내부 에러는 상세 내용을 숨기고 일반 메시지를 반환합니다.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::StoreUnavailable(_) | AuthError::Internal(_) => {
                "요청을 처리하는 중 내부 에러가 발생했습니다".to_string()
            }
            other => other.to_string(),
        }
    }

    /// 클라이언트 측 에러인지 확인합니다 (4xx 계열).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::StoreUnavailable(_) | AuthError::Internal(_)
        )
    }
}
