//! 인증 저장소 운영자 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 관리자 등록 (저장소 경로와 등록 정책은 설정 파일에서 읽음)
//! warden register -u admin -p 's3cret' --role admin
//!
//! # 사용자 목록
//! warden users --store users.json
//!
//! # 토큰 발급 (WARDEN__AUTH__SIGNING_KEY 필요)
//! warden token issue -u admin -p 's3cret'
//!
//! # 토큰 검사
//! warden token inspect eyJhbGciOi...
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;
use warden_core::{
    init_logging, FileCredentialStore, IdentityService, LogConfig, LogFormat, PasswordHasher,
    Role, TokenService, WardenConfig,
};

use warden_cli::commands::config::render_config;
use warden_cli::commands::token::{inspect_token, issue_token};
use warden_cli::commands::users::{list_users, register_user, render_users, OutputFormat, RegisterRequest};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Warden CLI - 자격증명 저장소 및 토큰 관리 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(short, long, global = true, default_value = "config/warden.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 사용자 등록
    Register {
        /// 자격증명 파일 경로. 생략 시 설정의 store.path
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// 사용자 이름
        #[arg(short, long)]
        username: String,

        /// 비밀번호
        #[arg(short, long)]
        password: String,

        /// 역할 (admin, customer, default). 생략 시 설정의 기본 역할
        #[arg(short, long)]
        role: Option<String>,

        /// 비밀번호 강도 정책 적용
        #[arg(long, default_value = "false")]
        enforce_policy: bool,
    },

    /// 등록된 사용자 목록
    Users {
        /// 자격증명 파일 경로. 생략 시 설정의 store.path
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 토큰 발급/검사
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// 적용된 설정 출력 (비밀 값은 가려짐)
    Config,
}

#[derive(Subcommand)]
enum TokenAction {
    /// 비밀번호 확인 후 토큰 발급
    Issue {
        /// 사용자 이름
        #[arg(short, long)]
        username: String,

        /// 비밀번호
        #[arg(short, long)]
        password: String,
    },

    /// 토큰 서명과 만료 확인
    Inspect {
        /// 검사할 토큰
        token: String,
    },
}

fn load_config(path: &Path) -> anyhow::Result<WardenConfig> {
    WardenConfig::load(Some(path))
        .with_context(|| format!("설정 로드 실패: {}", path.display()))
}

/// 서명 키 없이 읽을 수 있는 설정. 저장소 명령에서 사용
fn load_settings(path: &Path) -> anyhow::Result<WardenConfig> {
    WardenConfig::load_settings(Some(path))
        .with_context(|| format!("설정 로드 실패: {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // CLI 출력과 섞이지 않도록 기본 레벨은 warn
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let log_config = LogConfig::new(level).with_format(LogFormat::Compact);
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Register {
            store,
            username,
            password,
            role,
            enforce_policy,
        } => {
            let role = role
                .map(|r| {
                    Role::parse(&r).ok_or_else(|| {
                        anyhow::anyhow!("Invalid role: {}. Supported: admin, customer, default", r)
                    })
                })
                .transpose()?;

            let config = load_settings(&cli.config)?;
            let store = store.unwrap_or_else(|| PathBuf::from(&config.store.path));

            let principal = register_user(
                Arc::new(FileCredentialStore::new(&store)),
                Arc::new(PasswordHasher::new()?),
                &config.auth,
                RegisterRequest {
                    username,
                    password,
                    role,
                    enforce_policy,
                },
            )
            .await?;

            println!("등록 완료: {} ({})", principal.username, principal.role);
            println!("저장 위치: {}", store.display());
        }

        Commands::Users { store, format } => {
            let format = OutputFormat::parse(&format)?;
            let store = match store {
                Some(path) => path,
                None => PathBuf::from(load_settings(&cli.config)?.store.path),
            };
            let store = FileCredentialStore::new(&store);
            let users = list_users(&store).await?;
            println!("{}", render_users(&users, format)?);
        }

        Commands::Token { action } => match action {
            TokenAction::Issue { username, password } => {
                let config = load_config(&cli.config)?;
                let identity = IdentityService::from_config(&config)?;
                let issued = issue_token(&identity, &username, &password).await?;
                println!("{}", serde_json::to_string_pretty(&issued)?);
            }
            TokenAction::Inspect { token } => {
                let config = load_config(&cli.config)?;
                let tokens = TokenService::new(&config.auth.token_config()?);
                let report = inspect_token(&tokens, &token, chrono::Utc::now());
                println!("{}", report);
                if !report.is_valid() {
                    error!("Token rejected");
                    std::process::exit(1);
                }
            }
        },

        Commands::Config => {
            let config = load_config(&cli.config)?;
            println!("{}", render_config(&config)?);
        }
    }

    Ok(())
}
