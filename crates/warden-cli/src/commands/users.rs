//! 사용자 등록 및 목록 조회.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use warden_core::{
    AuthConfig, CredentialStore, PasswordHasher, Principal, RegistrationFlow, RegistrationPolicy,
    Role, Username,
};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 운영자 등록 요청.
#[derive(Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
    /// 비밀번호 강도 정책 적용
    pub enforce_policy: bool,
}

/// 사용자를 등록합니다.
///
/// 기본 역할과 비밀번호 정책은 서버와 같은 `AuthConfig`를 따릅니다.
/// 운영자 도구이므로 Admin 역할 부여 제한만 해제합니다.
pub async fn register_user(
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    auth: &AuthConfig,
    request: RegisterRequest,
) -> Result<Principal> {
    let policy = RegistrationPolicy {
        allow_admin_self_registration: true,
        enforce_password_policy: request.enforce_policy || auth.enforce_password_policy,
        ..RegistrationPolicy::from_auth_config(auth)
    };
    let flow = RegistrationFlow::new(store, hasher, policy);

    let principal = flow
        .register(&request.username, &request.password, request.role)
        .await
        .with_context(|| format!("사용자 등록 실패: {}", request.username))?;

    info!(username = %principal.username, role = %principal.role, "User registered from CLI");
    Ok(principal)
}

#[derive(Serialize)]
struct UsersOutput<'a> {
    users: Vec<&'a str>,
    total: usize,
}

/// 등록된 사용자 이름 목록을 조회합니다.
pub async fn list_users(store: &dyn CredentialStore) -> Result<Vec<Username>> {
    store
        .list_usernames()
        .await
        .context("저장소에서 사용자 목록을 읽을 수 없습니다")
}

/// 사용자 목록을 지정한 형식의 문자열로 만듭니다.
pub fn render_users(users: &[Username], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let output = UsersOutput {
                users: users.iter().map(Username::as_str).collect(),
                total: users.len(),
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Table => {
            let mut out = String::new();
            for user in users {
                out.push_str(user.as_str());
                out.push('\n');
            }
            out.push_str(&format!("\n총 {}명", users.len()));
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Algorithm, Argon2, Params, Version};
    use warden_core::{AuthScheme, FileCredentialStore};

    fn cheap_hasher() -> Arc<PasswordHasher> {
        let params = Params::new(8, 1, 1, None).unwrap();
        Arc::new(
            PasswordHasher::with_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
                .unwrap(),
        )
    }

    fn auth_config(rbac: bool, allow_admin_self_registration: bool) -> AuthConfig {
        AuthConfig {
            signing_key: String::new(),
            token_ttl_minutes: 60,
            scheme: AuthScheme::Bearer,
            rbac,
            default_role: None,
            allow_admin_self_registration,
            enforce_password_policy: false,
            seed_users: Vec::new(),
        }
    }

    fn request(username: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "pw1".to_string(),
            role,
            enforce_policy: false,
        }
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(dir.path().join("users.json")));

        let auth = auth_config(true, false);

        let admin = register_user(
            store.clone(),
            cheap_hasher(),
            &auth,
            request("root", Some(Role::Admin)),
        )
        .await
        .unwrap();
        assert_eq!(admin.role, Role::Admin);
        let bob = register_user(store.clone(), cheap_hasher(), &auth, request("bob", None))
            .await
            .unwrap();
        assert_eq!(bob.role, Role::Customer);

        let users = list_users(store.as_ref()).await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.as_str()).collect();
        assert_eq!(names, vec!["bob", "root"]);
    }

    #[tokio::test]
    async fn test_duplicate_register_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(dir.path().join("users.json")));

        let auth = auth_config(true, true);

        register_user(store.clone(), cheap_hasher(), &auth, request("bob", None))
            .await
            .unwrap();
        let err = register_user(store, cheap_hasher(), &auth, request("bob", None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bob"));
    }

    #[tokio::test]
    async fn test_register_without_rbac_assigns_default_role() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(dir.path().join("users.json")));

        let principal = register_user(
            store.clone(),
            cheap_hasher(),
            &auth_config(false, true),
            request("dave", None),
        )
        .await
        .unwrap();

        assert_eq!(principal.role, Role::Default);
        let stored = store
            .get(&Username::parse("dave").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::Default);
    }

    #[tokio::test]
    async fn test_register_applies_configured_password_policy() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(dir.path().join("users.json")));
        let auth = AuthConfig {
            enforce_password_policy: true,
            ..auth_config(true, true)
        };

        let result = register_user(store.clone(), cheap_hasher(), &auth, request("erin", None)).await;

        assert!(result.is_err());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[test]
    fn test_render_users() {
        let users = vec![Username::parse("alice").unwrap(), Username::parse("bob").unwrap()];

        let json = render_users(&users, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 2);

        let table = render_users(&users, OutputFormat::Table).unwrap();
        assert!(table.starts_with("alice\nbob\n"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("csv").is_err());
    }
}
