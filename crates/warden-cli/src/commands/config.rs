//! 적용된 설정 출력.

use anyhow::Result;
use warden_core::WardenConfig;

const REDACTED: &str = "[REDACTED]";

/// 비밀 값을 가린 설정을 TOML로 렌더링합니다.
pub fn render_config(config: &WardenConfig) -> Result<String> {
    let mut redacted = config.clone();
    redacted.auth.signing_key = REDACTED.to_string();
    for seed in &mut redacted.auth.seed_users {
        seed.password = REDACTED.to_string();
    }
    Ok(toml::to_string_pretty(&redacted)?)
}
