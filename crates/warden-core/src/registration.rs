//! 사용자 등록.
//!
//! 사용자 이름 중복 검사와 삽입은 저장소의 `insert_new` 한 번으로 처리되어
//! 동시에 같은 이름을 등록해도 하나만 성공합니다.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{AuthConfig, SeedUser};
use crate::domain::{CredentialRecord, Principal, Role, Username};
use crate::error::{AuthError, AuthResult};
use crate::password::{validate_password_strength, PasswordHasher};
use crate::store::{CredentialStore, InsertOutcome};

/// 등록 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPolicy {
    /// 역할을 지정하지 않았을 때 부여할 역할
    pub default_role: Role,
    /// 인증되지 않은 요청의 Admin 역할 요청 허용 (끄면 Admin은 Admin만 부여 가능)
    pub allow_admin_self_registration: bool,
    /// 비밀번호 강도 정책 적용
    pub enforce_password_policy: bool,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            default_role: Role::Customer,
            allow_admin_self_registration: true,
            enforce_password_policy: false,
        }
    }
}

impl RegistrationPolicy {
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self {
            default_role: auth.effective_default_role(),
            allow_admin_self_registration: auth.allow_admin_self_registration,
            enforce_password_policy: auth.enforce_password_policy,
        }
    }

    /// 인증되지 않은 호출자의 Admin 역할 요청을 거부하는 정책.
    pub fn restricted() -> Self {
        Self {
            allow_admin_self_registration: false,
            ..Self::default()
        }
    }
}

/// 등록 흐름.
pub struct RegistrationFlow {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    policy: RegistrationPolicy,
}

impl RegistrationFlow {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        policy: RegistrationPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            policy,
        }
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.policy
    }

    /// 인증되지 않은 호출자의 등록.
    ///
    /// 요청한 역할을 그대로 부여합니다. 정책이 Admin 자가 등록을 막으면
    /// Admin 요청은 `InvalidInput`으로 거부됩니다.
    pub async fn register(
        &self,
        username: &str,
        secret: &str,
        requested_role: Option<Role>,
    ) -> AuthResult<Principal> {
        let role = requested_role.unwrap_or(self.policy.default_role);
        if role == Role::Admin && !self.policy.allow_admin_self_registration {
            return Err(AuthError::InvalidInput(
                "Admin 역할은 자가 등록할 수 없습니다".to_string(),
            ));
        }

        self.create(username, secret, role, self.policy.enforce_password_policy)
            .await
    }

    /// 인증된 주체가 다른 사용자를 등록합니다.
    ///
    /// Admin 자가 등록이 막혀 있으면 Admin만 Admin 역할을 부여할 수 있습니다.
    pub async fn register_by(
        &self,
        actor: &Principal,
        username: &str,
        secret: &str,
        requested_role: Option<Role>,
    ) -> AuthResult<Principal> {
        let role = requested_role.unwrap_or(self.policy.default_role);
        if role == Role::Admin
            && !self.policy.allow_admin_self_registration
            && actor.role != Role::Admin
        {
            return Err(AuthError::Forbidden { actual: actor.role });
        }

        self.create(username, secret, role, self.policy.enforce_password_policy)
            .await
    }

    /// 저장소가 비어 있을 때만 초기 사용자를 생성합니다.
    ///
    /// 초기 사용자에는 Admin 제한과 비밀번호 정책을 적용하지 않습니다.
    /// 생성된 사용자 수를 반환합니다.
    pub async fn seed_if_empty(&self, seeds: &[SeedUser]) -> AuthResult<usize> {
        if seeds.is_empty() || !self.store.is_empty().await? {
            return Ok(0);
        }

        let mut created = 0;
        for seed in seeds {
            let role = seed.role.unwrap_or(self.policy.default_role);
            match self.create(&seed.username, &seed.password, role, false).await {
                Ok(principal) => {
                    info!(username = %principal.username, role = %principal.role, "Seed user created");
                    created += 1;
                }
                Err(AuthError::UsernameTaken) => {
                    warn!(username = %seed.username, "Duplicate seed user skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    async fn create(
        &self,
        username: &str,
        secret: &str,
        role: Role,
        enforce_policy: bool,
    ) -> AuthResult<Principal> {
        let username = Username::parse(username)?;

        if secret.is_empty() {
            return Err(AuthError::InvalidInput("비밀번호가 비어 있습니다".to_string()));
        }
        if enforce_policy {
            validate_password_strength(secret)
                .map_err(|msg| AuthError::InvalidInput(msg.to_string()))?;
        }

        let hasher = Arc::clone(&self.hasher);
        let secret = secret.to_string();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::Internal(format!("비밀번호 해싱 작업 실패: {}", e)))??;

        let record = CredentialRecord::new(username, digest, role);
        let principal = record.principal();

        match self.store.insert_new(record).await {
            Ok(InsertOutcome::Inserted) => {
                info!(username = %principal.username, role = %principal.role, "User registered");
                Ok(principal)
            }
            Ok(InsertOutcome::AlreadyExists) => {
                warn!(username = %principal.username, "Registration rejected: username taken");
                Err(AuthError::UsernameTaken)
            }
            Err(e) => {
                error!(store = self.store.name(), error = %e, "Credential insert failed");
                Err(AuthError::StoreUnavailable(e))
            }
        }
    }
}
