//! 인증/인가 HTTP 서버.
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: `Authorization` 헤더 파싱 및 인증 추출기
//! - [`error`]: 에러 응답 형식

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{AdminAuth, Authenticated, MaybeAuthenticated, MemberAuth};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use routes::create_api_router;
pub use state::AppState;
