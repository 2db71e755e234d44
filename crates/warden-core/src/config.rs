//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → 환경 변수(`WARDEN__` 접두사, `__` 구분자) 순으로 로드합니다.
//! 설정은 프로세스 시작 시 한 번 로드되며 이후 변경되지 않습니다.

use std::path::Path;

use chrono::Duration;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// 서명 키 최소 길이 (바이트)
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// 기본 토큰 TTL (분)
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// 설정 에러.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    #[error("잘못된 설정: {0}")]
    Invalid(String),
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WardenConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// 요청마다 사용할 인증 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// 요청마다 사용자 이름/비밀번호 (HTTP Basic)
    Basic,
    /// 로그인으로 받은 토큰 (HTTP Bearer)
    #[default]
    Bearer,
}

impl std::str::FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "bearer" => Ok(Self::Bearer),
            _ => Err(format!("Unknown auth scheme: {}", s)),
        }
    }
}

/// 시작 시 저장소가 비어 있으면 생성할 사용자.
#[derive(Clone, Deserialize, Serialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// 인증 설정.
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// 토큰 서명 키 (최소 32바이트)
    #[serde(default)]
    pub signing_key: String,
    /// 토큰 TTL (분)
    #[serde(default = "default_ttl_minutes")]
    pub token_ttl_minutes: i64,
    /// 인증 방식
    #[serde(default)]
    pub scheme: AuthScheme,
    /// 역할 기반 접근 제어 사용 여부
    #[serde(default = "default_true")]
    pub rbac: bool,
    /// 등록 시 역할을 지정하지 않았을 때의 기본 역할
    #[serde(default)]
    pub default_role: Option<Role>,
    /// 자가 등록 시 Admin 역할 요청 허용 여부. `false`면 관리자만 Admin 계정을 만들 수 있음
    #[serde(default = "default_true")]
    pub allow_admin_self_registration: bool,
    /// 비밀번호 강도 정책 적용 여부
    #[serde(default)]
    pub enforce_password_policy: bool,
    /// 초기 사용자
    #[serde(default)]
    pub seed_users: Vec<SeedUser>,
}

fn default_ttl_minutes() -> i64 {
    DEFAULT_TOKEN_TTL_MINUTES
}

fn default_true() -> bool {
    true
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"[REDACTED]")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("scheme", &self.scheme)
            .field("rbac", &self.rbac)
            .field("default_role", &self.default_role)
            .field("allow_admin_self_registration", &self.allow_admin_self_registration)
            .field("enforce_password_policy", &self.enforce_password_policy)
            .field("seed_users", &self.seed_users)
            .finish()
    }
}

impl AuthConfig {
    /// 역할을 지정하지 않은 등록에 부여할 역할.
    ///
    /// RBAC가 꺼져 있으면 항상 [`Role::Default`]입니다.
    pub fn effective_default_role(&self) -> Role {
        if !self.rbac {
            return Role::Default;
        }
        self.default_role.unwrap_or(Role::Customer)
    }

    /// 토큰 서비스 설정을 생성합니다.
    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        if self.signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.signing_key는 최소 {}바이트여야 합니다",
                MIN_SIGNING_KEY_LEN
            )));
        }
        if self.token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_minutes는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(TokenConfig::new(
            self.signing_key.clone(),
            Duration::minutes(self.token_ttl_minutes),
        ))
    }
}

/// 토큰 서비스 설정.
///
/// 알고리즘은 HS256으로 고정됩니다.
#[derive(Clone)]
pub struct TokenConfig {
    pub signing_key: SecretString,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(signing_key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            signing_key: SecretString::new(signing_key.into().into()),
            ttl,
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

/// 저장소 백엔드 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
}

/// 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// 백엔드 종류
    #[serde(default)]
    pub backend: StoreBackend,
    /// 파일 백엔드 경로
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "users.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl WardenConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드하고 전체 검증을 수행합니다.
    ///
    /// `.env` 파일이 있으면 먼저 읽어 환경 변수로 반영합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load_settings(path)?;
        config.validate()?;
        Ok(config)
    }

    /// 서명 키 검사 없이 설정을 로드합니다.
    ///
    /// 토큰을 다루지 않는 운영 도구(사용자 등록 등)에서 사용합니다.
    /// 역할/저장소 설정의 일관성은 검사합니다.
    pub fn load_settings(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(path, environment())
    }

    fn load_from(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("auth.token_ttl_minutes", DEFAULT_TOKEN_TTL_MINUTES)?
            .set_default("store.backend", "file")?
            .set_default("store.path", "users.json")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        // 환경 변수로 오버라이드
        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate_settings()?;
        Ok(config)
    }

    /// 기본 경로(`config/warden.toml`)에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Some(Path::new("config/warden.toml")))
    }

    /// 서명 키와 TTL을 포함한 전체 설정을 검사합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.token_config()?;
        self.validate_settings()
    }

    fn validate_settings(&self) -> Result<(), ConfigError> {
        if !self.auth.rbac && matches!(self.auth.default_role, Some(r) if r != Role::Default) {
            return Err(ConfigError::Invalid(
                "RBAC가 꺼져 있으면 auth.default_role을 지정할 수 없습니다".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::File && self.store.path.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path가 비어 있습니다".to_string()));
        }
        Ok(())
    }
}

/// `WARDEN__<SECTION>__<KEY>` 환경 변수 소스.
///
/// 값은 문자열 그대로 읽고 타입 변환은 역직렬화 단계에 맡깁니다.
/// 숫자로만 된 서명 키가 정수/실수로 바뀌지 않습니다.
fn environment() -> config::Environment {
    config::Environment::with_prefix("WARDEN")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(false)
}

#[cfg(test)]
pub(crate) fn test_auth_config() -> AuthConfig {
    AuthConfig {
        signing_key: "test-secret-key-for-jwt-testing-minimum-32-chars".to_string(),
        token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        scheme: AuthScheme::Bearer,
        rbac: true,
        default_role: None,
        allow_admin_self_registration: true,
        enforce_password_policy: false,
        seed_users: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_short_signing_key_rejected() {
        let mut auth = test_auth_config();
        auth.signing_key = "short".to_string();
        assert!(matches!(auth.token_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut auth = test_auth_config();
        auth.token_ttl_minutes = 0;
        assert!(auth.token_config().is_err());
    }

    #[test]
    fn test_token_config_from_auth() {
        let token = test_auth_config().token_config().unwrap();
        assert_eq!(token.ttl, Duration::minutes(30));
        assert_eq!(token.signing_key.expose_secret().len(), 48);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut auth = test_auth_config();
        auth.seed_users.push(SeedUser {
            username: "admin".to_string(),
            password: "hunter2-hunter2".to_string(),
            role: Some(Role::Admin),
        });

        let rendered = format!("{:?} {:?}", auth, auth.token_config().unwrap());
        assert!(!rendered.contains("test-secret-key"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("admin"));
    }

    #[test]
    fn test_default_role_follows_rbac() {
        let mut auth = test_auth_config();
        assert_eq!(auth.effective_default_role(), Role::Customer);

        auth.default_role = Some(Role::Admin);
        assert_eq!(auth.effective_default_role(), Role::Admin);

        auth.rbac = false;
        assert_eq!(auth.effective_default_role(), Role::Default);
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("basic".parse::<AuthScheme>().unwrap(), AuthScheme::Basic);
        assert_eq!("BEARER".parse::<AuthScheme>().unwrap(), AuthScheme::Bearer);
        assert!("digest".parse::<AuthScheme>().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(
            &path,
            r#"
[auth]
signing_key = "file-secret-key-for-jwt-testing-minimum-32-chars"
token_ttl_minutes = 15
scheme = "basic"
rbac = false

[store]
backend = "memory"
"#,
        )
        .unwrap();

        let config = WardenConfig::load(Some(&path)).unwrap();
        assert_eq!(config.auth.token_ttl_minutes, 15);
        assert_eq!(config.auth.scheme, AuthScheme::Basic);
        assert!(!config.auth.rbac);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.server.port, 8000);
    }

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_numeric_signing_key_kept_as_string() {
        let digits = "1234567890123456789012345678901234567890";
        let config = WardenConfig::load_from(
            None,
            env_source(&[
                ("WARDEN__AUTH__SIGNING_KEY", digits),
                ("WARDEN__SERVER__PORT", "9000"),
                ("WARDEN__AUTH__RBAC", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(config.auth.signing_key, digits);
        assert_eq!(config.server.port, 9000);
        assert!(!config.auth.rbac);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_load_without_signing_key() {
        let config = WardenConfig::load_from(None, env_source(&[])).unwrap();
        assert!(config.auth.signing_key.is_empty());
        assert!(config.auth.allow_admin_self_registration);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rbac_off_with_explicit_role_rejected() {
        let result = WardenConfig::load_from(
            None,
            env_source(&[
                ("WARDEN__AUTH__RBAC", "false"),
                ("WARDEN__AUTH__DEFAULT_ROLE", "customer"),
            ]),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
