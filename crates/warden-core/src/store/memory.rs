//! 메모리 기반 자격증명 저장소.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, InsertOutcome, StoreResult};
use crate::domain::{CredentialRecord, Username};

/// 프로세스 메모리에 레코드를 보관하는 저장소.
///
/// `insert_new`는 하나의 쓰기 잠금 안에서 확인과 삽입을 수행합니다.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<Username, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, username: &Username) -> StoreResult<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(username).cloned())
    }

    async fn exists(&self, username: &Username) -> StoreResult<bool> {
        Ok(self.records.read().await.contains_key(username))
    }

    async fn insert_new(&self, record: CredentialRecord) -> StoreResult<InsertOutcome> {
        let mut records = self.records.write().await;
        match records.entry(record.username.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn put(&self, record: CredentialRecord) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(record.username.clone(), record);
        Ok(())
    }

    async fn list_usernames(&self) -> StoreResult<Vec<Username>> {
        let mut names: Vec<Username> = self.records.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.records.read().await.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
