//! JSON 파일 기반 자격증명 저장소.
//!
//! 파일 형식:
//!
//! ```json
//! {
//!   "alice": { "password": "$argon2id$v=19$...", "role": "customer", "created_at": "2024-01-01T00:00:00Z" }
//! }
//! ```
//!
//! 모든 읽기-수정-쓰기는 옆에 둔 잠금 파일(`<file>.lock`)의 OS 배타 잠금 안에서 수행됩니다.
//! 같은 파일을 여는 다른 핸들이나 다른 프로세스(API 서버, CLI)도 같은 잠금을 사용합니다.
//! 쓰기는 같은 디렉터리의 고유한 임시 파일에 기록한 뒤 `rename`으로 교체하므로,
//! 읽는 쪽은 항상 이전 또는 새 문서 전체만 보게 됩니다.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CredentialStore, InsertOutcome, StoreError, StoreResult};
use crate::domain::{CredentialRecord, PasswordDigest, Role, Username};

/// 파일에 저장되는 레코드 형태.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    password: String,
    /// 역할 필드가 없는 파일은 RBAC 없는 서비스의 데이터로 간주
    #[serde(default = "default_role")]
    role: Role,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn default_role() -> Role {
    Role::Default
}

type Document = BTreeMap<String, StoredRecord>;

/// JSON 파일 저장소.
///
/// 프로세스 안에서는 `Mutex`로, 프로세스 사이에서는 잠금 파일로 쓰기를 직렬화합니다.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// 저장소를 엽니다. 파일이 없으면 첫 쓰기 때 생성됩니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 쓰기 잠금에 사용하는 파일 경로.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credentials.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> StoreResult<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse_document(&self.path, &bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(StoreError::Io(format!("{}: {}", self.path.display(), e))),
        }
    }

    /// 배타 잠금 안에서 문서를 읽고 수정합니다.
    ///
    /// `apply`가 `true`를 함께 돌려주면 문서를 다시 씁니다.
    async fn modify<T, F>(&self, apply: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Document) -> (T, bool) + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path();

        tokio::task::spawn_blocking(move || {
            let lock = lock_file(&lock_path)?;
            let mut document = read_document(&path)?;
            let (output, dirty) = apply(&mut document);
            if dirty {
                write_document(&path, &document)?;
            }
            drop(lock);
            Ok(output)
        })
        .await
        .map_err(|e| StoreError::Io(format!("file store task failed: {}", e)))?
    }

    fn decode(name: &str, stored: &StoredRecord) -> StoreResult<CredentialRecord> {
        let username = Username::parse(name)
            .map_err(|e| StoreError::Corrupt(format!("username '{}': {}", name, e)))?;
        let password_hash = PasswordDigest::parse(stored.password.clone())
            .map_err(|_| StoreError::Corrupt(format!("password digest of '{}'", name)))?;

        Ok(CredentialRecord {
            username,
            password_hash,
            role: stored.role,
            created_at: stored.created_at.unwrap_or_default(),
        })
    }

    fn encode(record: &CredentialRecord) -> StoredRecord {
        StoredRecord {
            password: record.password_hash.as_str().to_string(),
            role: record.role,
            created_at: Some(record.created_at),
        }
    }
}

fn parse_document(path: &Path, bytes: &[u8]) -> StoreResult<Document> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))
}

fn read_document(path: &Path) -> StoreResult<Document> {
    match std::fs::read(path) {
        Ok(bytes) => parse_document(path, &bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
        Err(e) => Err(StoreError::Io(format!("{}: {}", path.display(), e))),
    }
}

/// 잠금 파일을 열고 배타 잠금을 얻습니다. 반환된 파일을 닫으면 잠금이 풀립니다.
fn lock_file(lock_path: &Path) -> StoreResult<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
        .map_err(|e| StoreError::Io(format!("{}: {}", lock_path.display(), e)))?;
    FileExt::lock_exclusive(&file)
        .map_err(|e| StoreError::Io(format!("lock {}: {}", lock_path.display(), e)))?;
    Ok(file)
}

fn write_document(path: &Path, document: &Document) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(document)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(&bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StoreError::Io(e.error.to_string()))?;

    debug!(path = %path.display(), records = document.len(), "Credential file written");
    Ok(())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, username: &Username) -> StoreResult<Option<CredentialRecord>> {
        let document = self.load().await?;
        document
            .get(username.as_str())
            .map(|stored| Self::decode(username.as_str(), stored))
            .transpose()
    }

    async fn insert_new(&self, record: CredentialRecord) -> StoreResult<InsertOutcome> {
        let key = record.username.to_string();
        let stored = Self::encode(&record);

        self.modify(move |document| {
            if document.contains_key(&key) {
                return (InsertOutcome::AlreadyExists, false);
            }
            document.insert(key, stored);
            (InsertOutcome::Inserted, true)
        })
        .await
    }

    async fn put(&self, record: CredentialRecord) -> StoreResult<()> {
        let key = record.username.to_string();
        let stored = Self::encode(&record);

        self.modify(move |document| {
            document.insert(key, stored);
            ((), true)
        })
        .await
    }

    async fn list_usernames(&self) -> StoreResult<Vec<Username>> {
        let document = self.load().await?;
        document
            .keys()
            .map(|name| {
                Username::parse(name.as_str())
                    .map_err(|e| StoreError::Corrupt(format!("username '{}': {}", name, e)))
            })
            .collect()
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.load().await?.len())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const DIGEST: &str = "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";

    fn record(name: &str, role: Role) -> CredentialRecord {
        CredentialRecord::new(
            Username::parse(name).unwrap(),
            PasswordDigest::parse(DIGEST).unwrap(),
            role,
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("users.json"));

        assert!(store.is_empty().await.unwrap());
        let alice = Username::parse("alice").unwrap();
        assert!(store.get(&alice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = FileCredentialStore::new(&path);
        assert_eq!(
            store.insert_new(record("alice", Role::Admin)).await.unwrap(),
            InsertOutcome::Inserted
        );

        let reopened = FileCredentialStore::new(&path);
        let alice = Username::parse("alice").unwrap();
        let found = reopened.get(&alice).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
        assert_eq!(found.password_hash.as_str(), DIGEST);

        let mut leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        leftovers.sort();
        assert_eq!(leftovers, vec!["users.json", "users.json.lock"]);
    }

    #[tokio::test]
    async fn test_insert_new_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("users.json"));

        store.insert_new(record("alice", Role::Customer)).await.unwrap();
        assert_eq!(
            store.insert_new(record("alice", Role::Admin)).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_not_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = FileCredentialStore::new(&path);
        let alice = Username::parse("alice").unwrap();
        assert!(matches!(store.get(&alice).await, Err(StoreError::Corrupt(_))));
        assert!(store.insert_new(record("alice", Role::Customer)).await.is_err());
    }

    #[tokio::test]
    async fn test_unsalted_legacy_digest_is_rejected_at_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(
            &path,
            br#"{"bob": {"password": "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"}}"#,
        )
        .await
        .unwrap();

        let store = FileCredentialStore::new(&path);
        let bob = Username::parse("bob").unwrap();
        assert!(matches!(store.get(&bob).await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_missing_role_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let body = format!(r#"{{"bob": {{"password": "{}"}}}}"#, DIGEST);
        tokio::fs::write(&path, body).await.unwrap();

        let store = FileCredentialStore::new(&path);
        let bob = Username::parse("bob").unwrap();
        assert_eq!(store.get(&bob).await.unwrap().unwrap().role, Role::Default);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_new_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("users.json")));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_new(record("alice", Role::Customer)).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_separate_handles_share_the_file_lock() {
        for _ in 0..10 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("users.json");
            let handles = [
                Arc::new(FileCredentialStore::new(&path)),
                Arc::new(FileCredentialStore::new(&path)),
            ];

            let mut tasks = Vec::new();
            for i in 0..8 {
                let store = Arc::clone(&handles[i % 2]);
                let name = format!("user{}", i);
                tasks.push(tokio::spawn(async move {
                    store.insert_new(record(&name, Role::Customer)).await
                }));
            }
            let mut alice_tasks = Vec::new();
            for i in 0..4 {
                let store = Arc::clone(&handles[i % 2]);
                alice_tasks.push(tokio::spawn(async move {
                    store.insert_new(record("alice", Role::Customer)).await
                }));
            }

            for task in tasks {
                assert_eq!(task.await.unwrap().unwrap(), InsertOutcome::Inserted);
            }
            let mut alice_inserted = 0;
            for task in alice_tasks {
                if task.await.unwrap().unwrap() == InsertOutcome::Inserted {
                    alice_inserted += 1;
                }
            }

            assert_eq!(alice_inserted, 1);
            let reopened = FileCredentialStore::new(&path);
            assert_eq!(reopened.len().await.unwrap(), 9);
        }
    }
}
