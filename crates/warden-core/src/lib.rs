//! # Warden Core
//!
//! 신원 확인과 접근 제어의 핵심 로직을 제공합니다.
//!
//! 이 크레이트는 요청 처리 계층이 사용하는 두 가지 호출을 중심으로 구성됩니다:
//! - `authenticate(credentials) -> Principal`
//! - `authorize(principal, allowed_roles) -> ()`
//!
//! 구성 요소:
//! - 자격증명 저장소 (메모리, JSON 파일)
//! - Argon2id 비밀번호 해싱
//! - HS256 세션 토큰
//! - 역할 기반 권한 확인
//! - 사용자 등록
//! - 설정 관리
//! - 로깅 인프라

pub mod authorize;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod password;
pub mod registration;
pub mod service;
pub mod store;
pub mod token;
pub mod verifier;

pub use authorize::{authorize, require_admin, require_member, AuthorizationGate};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use password::{validate_password_strength, PasswordHasher};
pub use registration::{RegistrationFlow, RegistrationPolicy};
pub use service::IdentityService;
pub use store::{
    CredentialStore, FileCredentialStore, InsertOutcome, MemoryCredentialStore, StoreError,
    StoreResult,
};
pub use token::{IssuedToken, SessionClaims, TokenError, TokenService, TokenSubject};
pub use verifier::{Credentials, IdentityVerifier};
