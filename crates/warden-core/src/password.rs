//! 비밀번호 해싱.
//!
//! Argon2id 기반 해싱 및 검증. 솔트는 자격증명마다 새로 생성되어
//! PHC 문자열 안에 다이제스트와 함께 저장됩니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

use crate::domain::PasswordDigest;
use crate::error::{AuthError, AuthResult};

/// 비밀번호 최소 길이 (정책 검사가 켜진 경우)
pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id 비밀번호 해셔.
///
/// 존재하지 않는 사용자에 대한 검증도 같은 비용이 들도록
/// 생성 시 더미 다이제스트를 하나 만들어 둡니다.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy: PasswordDigest,
}

impl PasswordHasher {
    /// 기본 Argon2id 파라미터로 해셔를 생성합니다.
    pub fn new() -> AuthResult<Self> {
        Self::with_argon2(Argon2::default())
    }

    /// 지정한 Argon2 인스턴스로 해셔를 생성합니다.
    ///
    /// 테스트에서는 낮은 비용의 파라미터를 주입할 수 있습니다.
    pub fn with_argon2(argon2: Argon2<'static>) -> AuthResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let dummy = argon2
            .hash_password(b"warden-timing-equalizer", &salt)
            .map_err(|e| AuthError::Internal(format!("더미 해시 생성 실패: {}", e)))?
            .to_string();

        Ok(Self {
            argon2,
            dummy: PasswordDigest::from_phc_unchecked(dummy),
        })
    }

    /// 비밀번호를 해싱하여 PHC 다이제스트를 반환합니다.
    pub fn hash(&self, password: &str) -> AuthResult<PasswordDigest> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("비밀번호 해싱 실패: {}", e)))?;

        Ok(PasswordDigest::from_phc_unchecked(hash.to_string()))
    }

    /// 저장된 다이제스트와 비밀번호를 비교합니다.
    ///
    /// 다이제스트의 파라미터(솔트, 비용)는 PHC 문자열에서 읽습니다.
    /// 비교는 argon2 크레이트의 상수 시간 비교를 사용합니다.
    pub fn verify(&self, password: &str, digest: &PasswordDigest) -> bool {
        let Ok(parsed) = PasswordHash::new(digest.as_str()) else {
            tracing::warn!("Stored password digest failed to parse");
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// 더미 다이제스트로 검증을 수행하고 항상 `false`를 반환합니다.
    ///
    /// 존재하지 않는 사용자 이름과 틀린 비밀번호의 응답 시간을 맞추기 위해 사용합니다.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy);
        false
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("비밀번호는 최소 8자 이상이어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("비밀번호에 최소 1개의 숫자가 포함되어야 합니다");
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("비밀번호에 최소 1개의 영문자가 포함되어야 합니다");
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    // 테스트 속도를 위해 최소 비용 파라미터 사용
    let params = argon2::Params::new(8, 1, 1, None).expect("valid argon2 params");
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    PasswordHasher::with_argon2(argon2).expect("hasher")
}
