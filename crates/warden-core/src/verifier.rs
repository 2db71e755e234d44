//! 신원 확인.
//!
//! 두 가지 방식을 지원합니다:
//!
//! - 요청마다 사용자 이름/비밀번호 제시 ([`IdentityVerifier::verify_password`])
//! - 로그인으로 받은 토큰 제시 ([`IdentityVerifier::verify_token`])
//!
//! 어느 쪽이든 "없는 사용자"와 "틀린 비밀번호"는 같은 에러, 같은 비용으로 거부됩니다.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::{Principal, Username};
use crate::error::{AuthError, AuthResult, UnauthorizedReason};
use crate::password::PasswordHasher;
use crate::store::CredentialStore;
use crate::token::{TokenError, TokenService};

/// 요청에 제시된 자격증명.
#[derive(Clone)]
pub enum Credentials {
    /// 사용자 이름 + 비밀번호
    Basic { username: String, password: String },
    /// 토큰 문자열
    Bearer(String),
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// 신원 확인기.
pub struct IdentityVerifier {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl IdentityVerifier {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// 제시된 자격증명으로 주체를 확인합니다.
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Principal> {
        match credentials {
            Credentials::Basic { username, password } => {
                self.verify_password(username, password).await
            }
            Credentials::Bearer(token) => self.verify_token(token).await,
        }
    }

    /// 사용자 이름과 비밀번호를 확인합니다.
    ///
    /// 형식이 잘못된 이름도 존재하지 않는 이름과 똑같이 취급합니다.
    /// 이 경우에도 저장소를 한 번 읽어 조회 비용과 저장소 에러를 맞춥니다.
    pub async fn verify_password(&self, username: &str, password: &str) -> AuthResult<Principal> {
        let lookup = match Username::parse(username) {
            Ok(name) => self.store.get(&name).await,
            Err(_) => self.store.len().await.map(|_| None),
        };
        let record = lookup.map_err(|e| {
            error!(store = self.store.name(), error = %e, "Credential lookup failed");
            AuthError::StoreUnavailable(e)
        })?;

        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let (record, matched) = tokio::task::spawn_blocking(move || match record {
            Some(record) => {
                let matched = hasher.verify(&password, &record.password_hash);
                (Some(record), matched)
            }
            None => (None, hasher.verify_dummy(&password)),
        })
        .await
        .map_err(|e| AuthError::Internal(format!("비밀번호 검증 작업 실패: {}", e)))?;

        match record {
            Some(record) if matched => {
                debug!(username = %record.username, role = %record.role, "Password verified");
                Ok(record.principal())
            }
            _ => {
                warn!(
                    username = ?username,
                    reason = %UnauthorizedReason::BadCredentials,
                    "Authentication rejected"
                );
                Err(AuthError::Unauthorized(UnauthorizedReason::BadCredentials))
            }
        }
    }

    /// 토큰을 확인하고 주체를 저장소에서 다시 조회합니다.
    ///
    /// 토큰 발급 이후 레코드가 사라졌으면 인증 실패로 처리합니다.
    /// 역할은 항상 저장소의 현재 값을 사용합니다.
    pub async fn verify_token(&self, token: &str) -> AuthResult<Principal> {
        let subject = self.tokens.verify(token).map_err(|e| {
            let reason = match e {
                TokenError::Expired => UnauthorizedReason::TokenExpired,
                TokenError::Invalid(_) => UnauthorizedReason::TokenInvalid,
            };
            warn!(reason = %reason, error = %e, "Token rejected");
            AuthError::Unauthorized(reason)
        })?;

        let record = self.store.get(&subject.username).await.map_err(|e| {
            error!(store = self.store.name(), error = %e, "Credential lookup failed");
            AuthError::StoreUnavailable(e)
        })?;

        match record {
            Some(record) => Ok(record.principal()),
            None => {
                warn!(
                    username = %subject.username,
                    reason = %UnauthorizedReason::SubjectVanished,
                    "Token subject no longer exists"
                );
                Err(AuthError::Unauthorized(UnauthorizedReason::SubjectVanished))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::domain::{CredentialRecord, Role};
    use crate::password::fast_hasher;
    use crate::store::{InsertOutcome, MemoryCredentialStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use chrono::Duration;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    struct Fixture {
        store: Arc<MemoryCredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
        verifier: IdentityVerifier,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryCredentialStore::new());
        let hasher = Arc::new(fast_hasher());
        let tokens = Arc::new(TokenService::new(&TokenConfig::new(
            TEST_SECRET,
            Duration::minutes(30),
        )));

        let digest = hasher.hash("pw1").unwrap();
        store
            .put(CredentialRecord::new(
                Username::parse("bob").unwrap(),
                digest,
                Role::Customer,
            ))
            .await
            .unwrap();

        let verifier = IdentityVerifier::new(store.clone(), hasher.clone(), tokens.clone());
        Fixture {
            store,
            hasher,
            tokens,
            verifier,
        }
    }

    #[tokio::test]
    async fn test_correct_password() {
        let fx = fixture().await;
        let principal = fx.verifier.verify_password("bob", "pw1").await.unwrap();
        assert_eq!(principal.username.as_str(), "bob");
        assert_eq!(principal.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let fx = fixture().await;

        let wrong = fx.verifier.verify_password("bob", "nope").await.unwrap_err();
        let unknown = fx.verifier.verify_password("mallory", "pw1").await.unwrap_err();
        let malformed = fx.verifier.verify_password("", "pw1").await.unwrap_err();

        for err in [&wrong, &unknown, &malformed] {
            assert_eq!(
                err.unauthorized_reason(),
                Some(UnauthorizedReason::BadCredentials)
            );
        }
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_token_path_uses_current_role() {
        let fx = fixture().await;
        let bob = fx.verifier.verify_password("bob", "pw1").await.unwrap();
        let issued = fx.tokens.issue(&bob).unwrap();

        // 토큰 발급 후 역할 변경 → 저장소 값이 우선
        let digest = fx.hasher.hash("pw1").unwrap();
        fx.store
            .put(CredentialRecord::new(bob.username.clone(), digest, Role::Admin))
            .await
            .unwrap();

        let principal = fx.verifier.verify_token(&issued.access_token).await.unwrap();
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_vanished_subject_fails_closed() {
        let fx = fixture().await;
        let ghost = Principal::new(Username::parse("ghost").unwrap(), Role::Admin);
        let issued = fx.tokens.issue(&ghost).unwrap();

        let err = fx.verifier.verify_token(&issued.access_token).await.unwrap_err();
        assert_eq!(
            err.unauthorized_reason(),
            Some(UnauthorizedReason::SubjectVanished)
        );
    }

    #[tokio::test]
    async fn test_invalid_token_reason() {
        let fx = fixture().await;
        let err = fx
            .verifier
            .authenticate(&Credentials::bearer("not-a-token"))
            .await
            .unwrap_err();
        assert_eq!(err.unauthorized_reason(), Some(UnauthorizedReason::TokenInvalid));
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn get(&self, _username: &Username) -> StoreResult<Option<CredentialRecord>> {
            Err(StoreError::Io("disk unavailable".to_string()))
        }

        async fn insert_new(&self, _record: CredentialRecord) -> StoreResult<InsertOutcome> {
            Err(StoreError::Io("disk unavailable".to_string()))
        }

        async fn put(&self, _record: CredentialRecord) -> StoreResult<()> {
            Err(StoreError::Io("disk unavailable".to_string()))
        }

        async fn list_usernames(&self) -> StoreResult<Vec<Username>> {
            Err(StoreError::Io("disk unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_unauthorized() {
        let fx = fixture().await;
        let verifier = IdentityVerifier::new(Arc::new(BrokenStore), fx.hasher, fx.tokens.clone());

        let err = verifier.verify_password("bob", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));

        // 형식이 잘못된 이름도 저장소를 읽으므로 같은 에러
        let err = verifier.verify_password(" bob\n", "pw1").await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));

        let bob = Principal::new(Username::parse("bob").unwrap(), Role::Customer);
        let issued = fx.tokens.issue(&bob).unwrap();
        let err = verifier.verify_token(&issued.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let basic = format!("{:?}", Credentials::basic("bob", "pw1-secret"));
        let bearer = format!("{:?}", Credentials::bearer("eyJ.secret.token"));
        assert!(basic.contains("bob"));
        assert!(!basic.contains("pw1-secret"));
        assert!(!bearer.contains("secret"));
    }
}
