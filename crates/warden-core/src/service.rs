//! 인증/인가 서비스.
//!
//! 요청 처리 계층이 사용하는 단일 진입점입니다. 저장소, 해셔, 토큰 서비스를
//! 한 번 구성한 뒤 여러 요청이 공유합니다.

use std::sync::Arc;

use tracing::info;

use crate::authorize::AuthorizationGate;
use crate::config::{SeedUser, StoreBackend, WardenConfig};
use crate::domain::{Principal, Role, RoleSet, Username};
use crate::error::{AuthError, AuthResult};
use crate::password::PasswordHasher;
use crate::registration::{RegistrationFlow, RegistrationPolicy};
use crate::store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::token::{IssuedToken, TokenService};
use crate::verifier::{Credentials, IdentityVerifier};

/// 인증/인가 서비스.
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    verifier: IdentityVerifier,
    registration: RegistrationFlow,
    gate: AuthorizationGate,
}

impl IdentityService {
    /// 기본 정책(RBAC 사용, 기본 역할 Customer)으로 서비스를 구성합니다.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self::with_policy(store, hasher, tokens, RegistrationPolicy::default(), true)
    }

    pub fn with_policy(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
        policy: RegistrationPolicy,
        rbac_enabled: bool,
    ) -> Self {
        Self {
            verifier: IdentityVerifier::new(store.clone(), hasher.clone(), tokens.clone()),
            registration: RegistrationFlow::new(store.clone(), hasher, policy),
            gate: AuthorizationGate::new(rbac_enabled),
            store,
            tokens,
        }
    }

    /// 설정에서 서비스를 구성합니다.
    pub fn from_config(config: &WardenConfig) -> AuthResult<Self> {
        let token_config = config
            .auth
            .token_config()
            .map_err(|e| AuthError::Internal(format!("설정 오류: {}", e)))?;

        let store: Arc<dyn CredentialStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryCredentialStore::new()),
            StoreBackend::File => Arc::new(FileCredentialStore::new(&config.store.path)),
        };

        info!(
            store = store.name(),
            rbac = config.auth.rbac,
            scheme = ?config.auth.scheme,
            ttl_minutes = config.auth.token_ttl_minutes,
            "Identity service configured"
        );

        Ok(Self::with_policy(
            store,
            Arc::new(PasswordHasher::new()?),
            Arc::new(TokenService::new(&token_config)),
            RegistrationPolicy::from_auth_config(&config.auth),
            config.auth.rbac,
        ))
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn registration(&self) -> &RegistrationFlow {
        &self.registration
    }

    /// 새 사용자를 등록합니다.
    pub async fn register(
        &self,
        username: &str,
        secret: &str,
        requested_role: Option<Role>,
    ) -> AuthResult<Principal> {
        self.registration
            .register(username, secret, requested_role)
            .await
    }

    /// 인증된 주체가 새 사용자를 등록합니다.
    pub async fn register_by(
        &self,
        actor: &Principal,
        username: &str,
        secret: &str,
        requested_role: Option<Role>,
    ) -> AuthResult<Principal> {
        self.registration
            .register_by(actor, username, secret, requested_role)
            .await
    }

    /// 초기 사용자를 생성합니다 (저장소가 비어 있을 때만).
    pub async fn seed_if_empty(&self, seeds: &[SeedUser]) -> AuthResult<usize> {
        self.registration.seed_if_empty(seeds).await
    }

    /// 비밀번호를 확인하고 세션 토큰을 발급합니다.
    pub async fn login(&self, username: &str, secret: &str) -> AuthResult<IssuedToken> {
        let principal = self.verifier.verify_password(username, secret).await?;
        let issued = self.tokens.issue(&principal)?;
        info!(
            username = %principal.username,
            expires_at = %issued.expires_at,
            "Login succeeded"
        );
        Ok(issued)
    }

    /// 제시된 자격증명으로 주체를 확인합니다.
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Principal> {
        self.verifier.authenticate(credentials).await
    }

    /// 주체의 역할을 확인합니다.
    pub fn authorize(&self, principal: &Principal, allowed: &RoleSet) -> AuthResult<()> {
        self.gate.authorize(principal, allowed)
    }

    /// 인증 후 권한까지 확인합니다. 인증 실패가 권한 확인보다 먼저 보고됩니다.
    pub async fn authenticate_and_authorize(
        &self,
        credentials: &Credentials,
        allowed: &RoleSet,
    ) -> AuthResult<Principal> {
        let principal = self.authenticate(credentials).await?;
        self.authorize(&principal, allowed)?;
        Ok(principal)
    }

    /// 등록된 사용자 이름 목록 (정렬됨).
    pub async fn list_usernames(&self) -> AuthResult<Vec<Username>> {
        Ok(self.store.list_usernames().await?)
    }
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("store", &self.store.name())
            .field("tokens", &self.tokens)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
