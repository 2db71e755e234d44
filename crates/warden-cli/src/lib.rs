//! 운영자 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 사용자 등록 및 목록 조회
//! - 토큰 발급 및 검사
//! - 적용된 설정 확인

pub mod commands;
