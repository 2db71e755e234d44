//! `Authorization` 헤더 파싱.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use warden_core::{AuthScheme, Credentials};

/// 헤더에서 설정된 방식의 자격증명을 추출합니다.
///
/// 헤더가 없거나, 방식이 다르거나, 형식이 잘못되었으면 `None`을 반환합니다.
pub fn credentials_from_headers(headers: &HeaderMap, scheme: AuthScheme) -> Option<Credentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    parse_authorization(value, scheme)
}

/// `Authorization` 헤더 값을 파싱합니다. 방식 이름은 대소문자를 구분하지 않습니다.
pub fn parse_authorization(value: &str, scheme: AuthScheme) -> Option<Credentials> {
    let (name, rest) = value.trim().split_once(' ')?;
    let rest = rest.trim();

    match scheme {
        AuthScheme::Bearer if name.eq_ignore_ascii_case("bearer") => {
            if rest.is_empty() {
                None
            } else {
                Some(Credentials::bearer(rest))
            }
        }
        AuthScheme::Basic if name.eq_ignore_ascii_case("basic") => decode_basic(rest),
        _ => None,
    }
}

/// `base64(username:password)`를 디코딩합니다. 비밀번호에는 `:`가 포함될 수 있습니다.
fn decode_basic(encoded: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::basic(username, password))
}

/// Basic 헤더 값 생성 (클라이언트/테스트용).
pub fn basic_header_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}
