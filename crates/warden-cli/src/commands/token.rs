//! 토큰 발급/검사.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use warden_core::{IdentityService, IssuedToken, TokenError, TokenService, TokenSubject};

/// 비밀번호를 확인하고 토큰을 발급합니다.
pub async fn issue_token(
    identity: &IdentityService,
    username: &str,
    password: &str,
) -> Result<IssuedToken> {
    identity
        .login(username, password)
        .await
        .context("로그인 실패")
}

/// 토큰 검사 결과.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenReport {
    Valid(TokenSubject),
    Expired,
    Invalid(String),
}

impl TokenReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenReport::Valid(_))
    }
}

impl std::fmt::Display for TokenReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenReport::Valid(subject) => write!(
                f,
                "Valid\n  subject:    {}\n  issued_at:  {}\n  expires_at: {}",
                subject.username,
                subject.issued_at.to_rfc3339(),
                subject.expires_at.to_rfc3339()
            ),
            TokenReport::Expired => write!(f, "Expired"),
            TokenReport::Invalid(reason) => write!(f, "Invalid ({})", reason),
        }
    }
}

/// 토큰의 서명과 만료를 확인합니다.
pub fn inspect_token(tokens: &TokenService, token: &str, now: DateTime<Utc>) -> TokenReport {
    match tokens.verify_at(token.trim(), now) {
        Ok(subject) => TokenReport::Valid(subject),
        Err(TokenError::Expired) => TokenReport::Expired,
        Err(TokenError::Invalid(reason)) => TokenReport::Invalid(reason),
    }
}
