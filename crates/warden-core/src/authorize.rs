//! 역할 기반 권한 확인.
//!
//! 인증된 주체의 역할이 허용 집합에 속하는지만 확인하는 순수 함수입니다.
//! `Forbidden`은 신원이 확인된 뒤의 거부이며, 신원 확인 실패(`Unauthorized`)와 구분됩니다.

use crate::domain::{Principal, RoleSet};
use crate::error::{AuthError, AuthResult};

/// 주체의 역할이 허용 집합에 속하는지 확인합니다.
///
/// - No IO
/// - No panics
pub fn authorize(principal: &Principal, allowed: &RoleSet) -> AuthResult<()> {
    if allowed.contains(principal.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            actual: principal.role,
        })
    }
}

/// Admin 역할을 요구합니다.
pub fn require_admin(principal: &Principal) -> AuthResult<()> {
    authorize(principal, &RoleSet::admin())
}

/// Admin 또는 Customer 역할을 요구합니다.
pub fn require_member(principal: &Principal) -> AuthResult<()> {
    authorize(principal, &RoleSet::members())
}

/// 서비스 단위 권한 게이트.
///
/// RBAC가 꺼진 서비스에서는 모든 인증된 주체가 통과합니다.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGate {
    rbac_enabled: bool,
}

impl AuthorizationGate {
    pub fn new(rbac_enabled: bool) -> Self {
        Self { rbac_enabled }
    }

    pub fn rbac_enabled(&self) -> bool {
        self.rbac_enabled
    }

    /// 이 게이트가 실제로 적용할 역할 집합.
    pub fn effective(&self, allowed: &RoleSet) -> RoleSet {
        if self.rbac_enabled {
            *allowed
        } else {
            RoleSet::any()
        }
    }

    pub fn authorize(&self, principal: &Principal, allowed: &RoleSet) -> AuthResult<()> {
        let result = authorize(principal, &self.effective(allowed));
        if result.is_err() {
            tracing::debug!(
                username = %principal.username,
                role = %principal.role,
                required = %allowed,
                "Authorization denied"
            );
        }
        result
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(true)
    }
}
