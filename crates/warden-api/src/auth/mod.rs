//! 요청 인증.
//!
//! - [`header`]: `Authorization` 헤더 파싱 (Basic, Bearer)
//! - [`middleware`]: Axum 추출기 (`Authenticated`, `AdminAuth`, `MemberAuth`)

pub mod header;
pub mod middleware;

pub use header::{basic_header_value, credentials_from_headers, parse_authorization};
pub use middleware::{AdminAuth, Authenticated, MaybeAuthenticated, MemberAuth};
