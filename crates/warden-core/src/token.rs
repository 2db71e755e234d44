//! 세션 토큰 처리.
//!
//! HS256으로 서명된 JWT를 발급하고 검증합니다. 토큰은 서버에 저장되지 않으며
//! 서명과 만료 시각만으로 검증됩니다. 서명 키가 바뀌면 이전에 발급된 모든 토큰이
//! 무효가 됩니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::domain::{Principal, Username};
use crate::error::{AuthError, AuthResult};

/// 토큰 서명 알고리즘 (고정)
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// 세션 토큰 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - 사용자 이름
    pub sub: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
}

impl SessionClaims {
    fn new(subject: &Username, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 발급된 토큰.
///
/// 로그인 응답으로 그대로 직렬화됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// 서명된 토큰 문자열
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 검증을 통과한 토큰의 주체 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub username: Username,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// 토큰 검증 에러.
///
/// 외부에는 둘 다 인증 실패로 보이지만, 내부적으로는 구분하여 기록합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 서명은 유효하지만 만료됨 (재로그인 필요)
    #[error("토큰이 만료되었습니다")]
    Expired,
    /// 서명 불일치, 형식 오류 등 (위조/손상으로 간주, 재시도 금지)
    #[error("유효하지 않은 토큰: {0}")]
    Invalid(String),
}

/// 세션 토큰 발급/검증 서비스.
///
/// 서명 키와 TTL은 생성 시 주입되며 이후 변경되지 않습니다.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.signing_key.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: config.ttl,
        }
    }

    /// 기본 TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 시각 기준으로 기본 TTL의 토큰을 발급합니다.
    pub fn issue(&self, principal: &Principal) -> AuthResult<IssuedToken> {
        self.issue_at(principal, self.ttl, Utc::now())
    }

    /// 지정한 시각과 TTL로 토큰을 발급합니다.
    pub fn issue_at(
        &self,
        principal: &Principal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<IssuedToken> {
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidInput("토큰 TTL은 0보다 커야 합니다".to_string()));
        }

        let claims = SessionClaims::new(&principal.username, now, ttl);
        let access_token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("토큰 인코딩 실패: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
            expires_at: timestamp(claims.exp)
                .ok_or_else(|| AuthError::Internal("만료 시각 범위 초과".to_string()))?,
        })
    }

    /// 현재 시각 기준으로 토큰을 검증합니다.
    pub fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰을 검증합니다.
    ///
    /// 서명을 먼저 확인한 뒤에만 클레임을 신뢰하며, 만료는 `now < exp`일 때만 유효합니다.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenSubject, TokenError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // 만료는 주입된 시각으로 직접 검사
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        let claims = data.claims;

        let issued_at =
            timestamp(claims.iat).ok_or_else(|| TokenError::Invalid("iat 범위 초과".to_string()))?;
        let expires_at =
            timestamp(claims.exp).ok_or_else(|| TokenError::Invalid("exp 범위 초과".to_string()))?;
        if expires_at <= issued_at {
            return Err(TokenError::Invalid("exp가 iat보다 이르거나 같습니다".to_string()));
        }

        let username = Username::parse(claims.sub)
            .map_err(|_| TokenError::Invalid("sub 형식 오류".to_string()))?;

        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(TokenSubject {
            username,
            issued_at,
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &TOKEN_ALGORITHM)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn service(secret: &str) -> TokenService {
        TokenService::new(&TokenConfig::new(secret, Duration::minutes(30)))
    }

    fn principal(name: &str) -> Principal {
        Principal::new(Username::parse(name).unwrap(), Role::Customer)
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service(TEST_SECRET);
        let issued = tokens.issue(&principal("alice")).unwrap();

        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 30 * 60);

        let subject = tokens.verify(&issued.access_token).unwrap();
        assert_eq!(subject.username.as_str(), "alice");
        assert_eq!(subject.expires_at, issued.expires_at);
    }

    #[test]
    fn test_valid_until_strictly_before_expiry() {
        let tokens = service(TEST_SECRET);
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ttl = Duration::minutes(10);
        let issued = tokens.issue_at(&principal("alice"), ttl, now).unwrap();

        let just_before = now + ttl - Duration::seconds(1);
        assert!(tokens.verify_at(&issued.access_token, just_before).is_ok());

        assert_eq!(
            tokens.verify_at(&issued.access_token, now + ttl),
            Err(TokenError::Expired)
        );
        assert_eq!(
            tokens.verify_at(&issued.access_token, now + ttl + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_invalid_even_when_expired() {
        let issuer = service(TEST_SECRET);
        let verifier = service("wrong-secret-key-for-testing-minimum-32-chars");
        let now = Utc::now();
        let issued = issuer
            .issue_at(&principal("alice"), Duration::minutes(1), now)
            .unwrap();

        let fresh = verifier.verify_at(&issued.access_token, now);
        assert!(matches!(fresh, Err(TokenError::Invalid(_))));

        let stale = verifier.verify_at(&issued.access_token, now + Duration::hours(1));
        assert!(matches!(stale, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_flipped_bytes_are_invalid() {
        let tokens = service(TEST_SECRET);
        let issued = tokens.issue(&principal("alice")).unwrap();
        let original = issued.access_token.as_bytes();

        for index in 0..original.len() {
            let mut tampered = original.to_vec();
            tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
            let Ok(tampered) = String::from_utf8(tampered) else {
                continue;
            };
            if tampered == issued.access_token {
                continue;
            }

            match tokens.verify(&tampered) {
                Err(TokenError::Invalid(_)) => {}
                // base64 끝 비트만 바뀌어 같은 바이트로 디코딩되는 경우
                Ok(subject) => assert_eq!(subject.username.as_str(), "alice"),
                Err(TokenError::Expired) => panic!("tampered token reported as expired at {}", index),
            }
        }
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = service(TEST_SECRET);
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid(_))));
        assert!(matches!(
            tokens.verify("invalid.token.here"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_other_algorithm_is_invalid() {
        let claims = SessionClaims::new(
            &Username::parse("alice").unwrap(),
            Utc::now(),
            Duration::minutes(5),
        );
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service(TEST_SECRET).verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_subject_is_invalid() {
        #[derive(Serialize)]
        struct NoSubject {
            iat: i64,
            exp: i64,
        }
        let now = Utc::now();
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &NoSubject {
                iat: now.timestamp(),
                exp: (now + Duration::minutes(5)).timestamp(),
            },
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service(TEST_SECRET).verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let tokens = service(TEST_SECRET);
        let result = tokens.issue_at(&principal("alice"), Duration::zero(), Utc::now());
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }
}
