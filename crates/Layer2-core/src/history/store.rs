//! Version Store - 스냅샷 저장소
//!
//! ## 저장 구조
//!
//! ```text
//! <root>/
//!   20250101T120000.000001_000001_admin/
//!     content      # 원본 bytes
//!     meta.json    # VersionRecord
//! ```
//!
//! 버전 디렉토리는 배타적으로 생성되고, 한 번 쓰인 뒤에는 바뀌지 않는다.

use super::lock::PathLocks;
use super::types::{VersionDiff, VersionRecord};
use chrono::Utc;
use similar::{ChangeTag, TextDiff};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::OwnedMutexGuard;
use toolgate_foundation::{Error, HistoryConfig, Result};
use tracing::{debug, info, warn};

const CONTENT_FILE: &str = "content";
const META_FILE: &str = "meta.json";

/// 프로세스 전역 스냅샷 순번
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 배타 생성 재시도 한도
const MAX_CREATE_ATTEMPTS: usize = 64;

/// rollback 직전 스냅샷의 principal
const ROLLBACK_PRINCIPAL: &str = "rollback";

/// 파일 스냅샷 저장소
///
/// ## 사용법
///
/// ```ignore
/// let store = VersionStore::new(history_dir);
/// let _guard = store.lock_path(&path).await;
/// let id = store.snapshot(&path, &old_bytes, "admin", "before edit").await?;
/// store.rollback(&id, &path).await?;
/// ```
#[derive(Debug)]
pub struct VersionStore {
    root: PathBuf,
    locks: PathLocks,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: PathLocks::new(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.resolved_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 경로별 잠금
    pub async fn lock_path(&self, path: &Path) -> OwnedMutexGuard<()> {
        self.locks.lock(path).await
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// 스냅샷 저장 후 version_id 반환
    pub async fn snapshot(
        &self,
        file_path: &Path,
        content: &[u8],
        principal: &str,
        message: &str,
    ) -> Result<String> {
        fs::create_dir_all(&self.root).await?;

        let slug = principal_slug(principal);
        let (version_id, dir) = self.create_version_dir(&slug).await?;

        let content_ref = dir.join(CONTENT_FILE);
        fs::write(&content_ref, content).await?;

        let record = VersionRecord {
            version_id: version_id.clone(),
            file_path: file_path.to_path_buf(),
            principal: principal.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            size: content.len() as u64,
            content_ref,
        };

        // meta.json이 보이면 스냅샷이 완성된 것
        let meta = serde_json::to_vec_pretty(&record)?;
        let tmp = dir.join(".meta.json.tmp");
        fs::write(&tmp, meta).await?;
        fs::rename(&tmp, dir.join(META_FILE)).await?;

        info!(
            version_id = %version_id,
            file = %file_path.display(),
            principal = %principal,
            size = record.size,
            "Snapshot created"
        );

        Ok(version_id)
    }

    async fn create_version_dir(&self, slug: &str) -> Result<(String, PathBuf)> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let seq = SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1;
            let version_id = format!(
                "{}_{:06}_{}",
                Utc::now().format("%Y%m%dT%H%M%S%.6f"),
                seq,
                slug
            );
            let dir = self.root.join(&version_id);

            match fs::create_dir(&dir).await {
                Ok(()) => return Ok((version_id, dir)),
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                    debug!(version_id = %version_id, "Version id collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Storage(
            "Could not allocate a unique version id".to_string(),
        ))
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// 버전 메타데이터 조회
    pub async fn get(&self, version_id: &str) -> Option<VersionRecord> {
        if !is_valid_version_id(version_id) {
            return None;
        }
        self.read_record(&self.root.join(version_id)).await
    }

    /// 저장된 내용
    pub async fn read_content(&self, version_id: &str) -> Option<Vec<u8>> {
        let record = self.get(version_id).await?;
        fs::read(&record.content_ref).await.ok()
    }

    async fn read_record(&self, dir: &Path) -> Option<VersionRecord> {
        let bytes = fs::read(dir.join(META_FILE)).await.ok()?;
        match serde_json::from_slice::<VersionRecord>(&bytes) {
            Ok(mut record) => {
                record.content_ref = dir.join(CONTENT_FILE);
                Some(record)
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Malformed version metadata");
                None
            }
        }
    }

    /// 버전 목록 (최신순, `limit == 0`이면 전체)
    pub async fn list_versions(
        &self,
        file_path: Option<&Path>,
        limit: usize,
    ) -> Result<Vec<VersionRecord>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(record) = self.read_record(&entry.path()).await {
                if file_path.map_or(true, |p| record.file_path == p) {
                    records.push(record);
                }
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.version_id.cmp(&a.version_id))
        });
        if limit > 0 {
            records.truncate(limit);
        }
        Ok(records)
    }

    // ========================================================================
    // Rollback / Diff
    // ========================================================================

    /// 스냅샷 내용으로 대상 파일 복원
    ///
    /// 스냅샷이나 메타데이터가 없으면 `Ok(false)`.
    /// 대상 경로 잠금을 잡은 채로 현재 내용을 먼저 스냅샷하므로 rollback도 되돌릴 수 있다.
    pub async fn rollback(&self, version_id: &str, target: &Path) -> Result<bool> {
        let Some(record) = self.get(version_id).await else {
            return Ok(false);
        };
        let content = match fs::read(&record.content_ref).await {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let _guard = self.locks.lock(target).await;

        match fs::read(target).await {
            Ok(current) => {
                let message = format!("Before rollback to {}", version_id);
                self.snapshot(target, &current, ROLLBACK_PRINCIPAL, &message)
                    .await?;
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).await?;

        let file_name = target
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("Invalid target: {}", target.display())))?
            .to_string_lossy();
        let tmp = parent.join(format!(
            ".{}.{}.rollback.tmp",
            file_name,
            SEQUENCE.fetch_add(1, Ordering::SeqCst)
        ));

        fs::write(&tmp, &content).await?;
        if let Err(e) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(version_id = %version_id, target = %target.display(), "Rolled back");
        Ok(true)
    }

    /// 두 버전 비교 (없는 버전은 빈 내용)
    pub async fn diff(&self, version_a: &str, version_b: &str) -> VersionDiff {
        let old = self.read_content(version_a).await.unwrap_or_default();
        let new = self.read_content(version_b).await.unwrap_or_default();
        let old = String::from_utf8_lossy(&old);
        let new = String::from_utf8_lossy(&new);

        let text_diff = TextDiff::from_lines(old.as_ref(), new.as_ref());
        let has_changes = text_diff
            .iter_all_changes()
            .any(|change| change.tag() != ChangeTag::Equal);
        let diff = text_diff
            .unified_diff()
            .context_radius(3)
            .header(version_a, version_b)
            .to_string();

        VersionDiff {
            from: version_a.to_string(),
            to: version_b.to_string(),
            diff,
            has_changes,
        }
    }
}

/// 파일시스템에 안전한 principal 표현
fn principal_slug(principal: &str) -> String {
    let slug: String = principal
        .chars()
        .take(64)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "anonymous".to_string()
    } else {
        slug
    }
}

/// 저장소 밖을 가리킬 수 없는 id인지 확인
fn is_valid_version_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\'])
        && !id.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> VersionStore {
        VersionStore::new(dir.path().join("history"))
    }

    #[tokio::test]
    async fn test_snapshot_and_get() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = dir.path().join("a.txt");

        let id = store.snapshot(&file, b"hello", "admin", "first").await.unwrap();
        assert!(id.ends_with("_admin"));

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.file_path, file);
        assert_eq!(record.size, 5);
        assert_eq!(record.message, "first");
        assert_eq!(store.read_content(&id).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_identical_snapshots_are_distinct() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = dir.path().join("a.txt");

        let a = store.snapshot(&file, b"same", "user", "").await.unwrap();
        let b = store.snapshot(&file, b"same", "user", "").await.unwrap();
        assert_ne!(a, b);

        let versions = store.list_versions(Some(file.as_path()), 0).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version_id, b);
    }

    #[tokio::test]
    async fn test_list_filters_and_limits() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");

        store.snapshot(&a, b"1", "p", "").await.unwrap();
        store.snapshot(&b, b"2", "p", "").await.unwrap();
        store.snapshot(&a, b"3", "p", "").await.unwrap();

        assert_eq!(store.list_versions(None, 0).await.unwrap().len(), 3);
        assert_eq!(store.list_versions(Some(a.as_path()), 0).await.unwrap().len(), 2);
        assert_eq!(store.list_versions(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).list_versions(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = dir.path().join("nested").join("a.txt");

        let id = store.snapshot(&file, b"original", "admin", "").await.unwrap();
        assert!(store.rollback(&id, &file).await.unwrap());
        assert_eq!(std::fs::read(&file).unwrap(), b"original");

        assert!(!store.rollback("missing", &file).await.unwrap());
        assert!(!store.rollback("../escape", &file).await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_snapshots_current_content() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = dir.path().join("a.txt");

        let id = store.snapshot(&file, b"original", "admin", "").await.unwrap();
        std::fs::write(&file, b"current").unwrap();
        assert!(store.rollback(&id, &file).await.unwrap());
        assert_eq!(std::fs::read(&file).unwrap(), b"original");

        let versions = store.list_versions(Some(file.as_path()), 0).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].principal, ROLLBACK_PRINCIPAL);
        let undo = versions[0].version_id.clone();
        assert_eq!(store.read_content(&undo).await.unwrap(), b"current");

        // rollback 자체도 되돌릴 수 있음
        assert!(store.rollback(&undo, &file).await.unwrap());
        assert_eq!(std::fs::read(&file).unwrap(), b"current");
    }

    #[tokio::test]
    async fn test_rollback_waits_for_path_lock() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store(&dir));
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"current").unwrap();
        let id = store.snapshot(&file, b"original", "admin", "").await.unwrap();

        let guard = store.lock_path(&file).await;
        let task = {
            let store = std::sync::Arc::clone(&store);
            let file = file.clone();
            tokio::spawn(async move { store.rollback(&id, &file).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(std::fs::read(&file).unwrap(), b"current");
        assert!(!task.is_finished());

        drop(guard);
        assert!(task.await.unwrap().unwrap());
        assert_eq!(std::fs::read(&file).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_diff() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let file = dir.path().join("a.txt");

        let a = store.snapshot(&file, b"one\ntwo\n", "p", "").await.unwrap();
        let b = store.snapshot(&file, b"one\nthree\n", "p", "").await.unwrap();

        let diff = store.diff(&a, &b).await;
        assert!(diff.has_changes);
        assert!(diff.diff.contains("-two"));
        assert!(diff.diff.contains("+three"));

        let same = store.diff(&a, &a).await;
        assert!(!same.has_changes);

        // 없는 버전은 빈 내용
        let from_nothing = store.diff("missing", &a).await;
        assert!(from_nothing.has_changes);
        assert!(from_nothing.diff.contains("+one"));
    }

    #[test]
    fn test_principal_slug() {
        assert_eq!(principal_slug("admin"), "admin");
        assert_eq!(principal_slug("a/b c"), "a_b_c");
        assert_eq!(principal_slug(""), "anonymous");
    }
}
