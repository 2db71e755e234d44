//! 도메인 타입.
//!
//! - [`Username`]: 검증된 사용자 이름 (대소문자 구분)
//! - [`Role`]: 사용자 역할 (Admin, Customer, Default)
//! - [`RoleSet`]: 작업에 허용되는 역할 집합
//! - [`Principal`]: 인증된 신원 (비밀 정보 없음)
//! - [`CredentialRecord`]: 저장소에 보관되는 자격증명 레코드

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// 사용자 이름 최대 길이 (문자 수)
pub const MAX_USERNAME_LEN: usize = 64;

/// 검증된 사용자 이름.
///
/// 대소문자를 구분하며, 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// 사용자 이름을 검증하여 생성합니다.
    ///
    /// # 규칙
    ///
    /// - 1자 이상 64자 이하
    /// - 앞뒤 공백 없음
    /// - 제어 문자 없음
    pub fn parse(raw: impl Into<String>) -> Result<Self, AuthError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(AuthError::InvalidInput(
                "사용자 이름은 비어 있을 수 없습니다".to_string(),
            ));
        }
        if raw.chars().count() > MAX_USERNAME_LEN {
            return Err(AuthError::InvalidInput(format!(
                "사용자 이름은 최대 {}자입니다",
                MAX_USERNAME_LEN
            )));
        }
        if raw.trim() != raw {
            return Err(AuthError::InvalidInput(
                "사용자 이름 앞뒤에 공백을 둘 수 없습니다".to_string(),
            ));
        }
        if raw.chars().any(char::is_control) {
            return Err(AuthError::InvalidInput(
                "사용자 이름에 제어 문자를 포함할 수 없습니다".to_string(),
            ));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 사용자 역할.
///
/// RBAC를 사용하지 않는 서비스에서는 모든 사용자가 [`Role::Default`]를 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자
    Admin,
    /// 일반 고객
    Customer,
    /// RBAC가 없는 서비스의 단일 암묵적 역할
    Default,
}

impl Role {
    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "customer" => Some(Role::Customer),
            "default" => Some(Role::Default),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Default => "default",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// 작업에 허용되는 역할 집합.
///
/// 역할이 세 가지뿐이므로 비트 집합으로 표현합니다.
/// [`RoleSet::any`]는 역할과 무관하게 항상 참인 조건입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleSet {
    bits: u8,
    any: bool,
}

impl RoleSet {
    const fn bit(role: Role) -> u8 {
        match role {
            Role::Admin => 0b001,
            Role::Customer => 0b010,
            Role::Default => 0b100,
        }
    }

    /// 빈 집합 (어떤 역할도 허용하지 않음).
    pub const fn empty() -> Self {
        Self { bits: 0, any: false }
    }

    /// 모든 인증된 주체를 허용.
    pub const fn any() -> Self {
        Self { bits: 0, any: true }
    }

    /// 단일 역할만 허용.
    pub const fn only(role: Role) -> Self {
        Self {
            bits: Self::bit(role),
            any: false,
        }
    }

    /// Admin 전용.
    pub const fn admin() -> Self {
        Self::only(Role::Admin)
    }

    /// Admin 또는 Customer (알려진 모든 회원 역할).
    pub const fn members() -> Self {
        Self::only(Role::Admin).with(Role::Customer)
    }

    /// 역할을 추가한 집합을 반환합니다.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self {
            bits: self.bits | Self::bit(role),
            any: self.any,
        }
    }

    /// 역할이 집합에 포함되는지 확인.
    pub fn contains(&self, role: Role) -> bool {
        self.any || self.bits & Self::bit(role) != 0
    }

    /// 항상 참인 조건인지 확인.
    pub fn is_any(&self) -> bool {
        self.any
    }

    /// 명시적으로 포함된 역할 목록.
    pub fn roles(&self) -> Vec<Role> {
        [Role::Admin, Role::Customer, Role::Default]
            .into_iter()
            .filter(|r| self.bits & Self::bit(*r) != 0)
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.any {
            return f.write_str("*");
        }
        let names: Vec<&str> = self.roles().iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// 인증된 주체.
///
/// 비밀 정보(비밀번호 해시)를 포함하지 않으므로 응답에 그대로 직렬화해도 안전합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: Username,
    pub role: Role,
}

impl Principal {
    pub fn new(username: Username, role: Role) -> Self {
        Self { username, role }
    }
}

/// PHC 형식의 비밀번호 다이제스트 (솔트 포함).
///
/// 예: `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// PHC 문자열을 검증하여 다이제스트를 생성합니다.
    pub fn parse(phc: impl Into<String>) -> Result<Self, AuthError> {
        let phc = phc.into();
        argon2::PasswordHash::new(&phc)
            .map_err(|_| AuthError::InvalidInput("잘못된 해시 형식".to_string()))?;
        Ok(Self(phc))
    }

    pub(crate) fn from_phc_unchecked(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// 저장소에 보관되는 자격증명 레코드.
///
/// 사용자당 하나만 존재하며, 등록 시 생성된 뒤 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: Username,
    pub password_hash: PasswordDigest,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(username: Username, password_hash: PasswordDigest, role: Role) -> Self {
        Self {
            username,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    /// 비밀 정보를 제외한 주체 뷰.
    pub fn principal(&self) -> Principal {
        Principal::new(self.username.clone(), self.role)
    }
}
