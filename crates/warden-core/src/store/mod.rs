//! 자격증명 저장소.
//!
//! 사용자 이름 → {비밀번호 다이제스트, 역할} 매핑을 보관합니다.
//! 코어는 저장 방식에 의존하지 않으며 [`CredentialStore`] trait만 사용합니다.
//!
//! # 구현체
//!
//! - [`MemoryCredentialStore`]: 프로세스 메모리 (테스트, 단일 프로세스)
//! - [`FileCredentialStore`]: JSON 파일 (원자적 교체 쓰기)

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CredentialRecord, Username};

/// 저장소 에러.
///
/// 읽기/쓰기 실패는 절대 "사용자 없음"으로 취급하지 않고 호출자에게 전파합니다.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// 파일/네트워크 I/O 실패
    #[error("I/O 실패: {0}")]
    Io(String),

    /// 저장된 데이터가 손상되었거나 검증에 실패함
    #[error("손상된 레코드: {0}")]
    Corrupt(String),

    /// 직렬화/역직렬화 실패
    #[error("직렬화 실패: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 원자적 삽입 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 새 레코드가 저장됨
    Inserted,
    /// 같은 사용자 이름이 이미 존재하여 아무것도 쓰지 않음
    AlreadyExists,
}

/// 자격증명 저장소 trait.
///
/// 모든 읽기는 가장 최근에 성공한 쓰기를 반영해야 합니다.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자 이름으로 레코드를 조회합니다.
    async fn get(&self, username: &Username) -> StoreResult<Option<CredentialRecord>>;

    /// 사용자 이름이 존재하는지 확인합니다.
    async fn exists(&self, username: &Username) -> StoreResult<bool> {
        Ok(self.get(username).await?.is_some())
    }

    /// 같은 키가 없을 때만 레코드를 저장합니다.
    ///
    /// 존재 확인과 삽입은 키 단위로 직렬화되어야 합니다.
    /// 동시에 같은 이름으로 호출되면 정확히 하나만 [`InsertOutcome::Inserted`]를 받습니다.
    async fn insert_new(&self, record: CredentialRecord) -> StoreResult<InsertOutcome>;

    /// 레코드를 저장합니다 (존재하면 덮어씀).
    async fn put(&self, record: CredentialRecord) -> StoreResult<()>;

    /// 저장된 사용자 이름 목록 (정렬됨).
    async fn list_usernames(&self) -> StoreResult<Vec<Username>>;

    /// 저장된 레코드 수.
    async fn len(&self) -> StoreResult<usize> {
        Ok(self.list_usernames().await?.len())
    }

    /// 저장소가 비어 있는지 확인합니다.
    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// 저장소 이름 (로그용).
    fn name(&self) -> &str;
}
