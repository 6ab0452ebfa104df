//! Per-path async lock
//!
//! 같은 경로에 대한 snapshot → write/delete를 직렬화한다.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// 이 개수를 넘으면 쓰이지 않는 엔트리를 정리
const PRUNE_THRESHOLD: usize = 1024;

/// 경로별 비동기 뮤텍스 테이블
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 경로 잠금 (guard가 drop될 때 해제)
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock();
            if locks.len() > PRUNE_THRESHOLD {
                // 테이블만 참조하는 엔트리는 아무도 기다리지 않음
                locks.retain(|_, m| Arc::strong_count(m) > 1);
            }
            locks
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        mutex.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_path_serialized() {
        let locks = Arc::new(PathLocks::new());
        let guard = locks.lock(Path::new("/tmp/a")).await;

        let locks2 = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock(Path::new("/tmp/a")).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_paths_independent() {
        let locks = PathLocks::new();
        let _a = locks.lock(Path::new("/tmp/a")).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(Path::new("/tmp/b")))
            .await
            .expect("different path must not block");
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_prune_unused_entries() {
        let locks = PathLocks::new();
        tokio_test::block_on(async {
            for i in 0..=PRUNE_THRESHOLD {
                let _g = locks.lock(Path::new(&format!("/tmp/{}", i))).await;
            }
            let _held = locks.lock(Path::new("/tmp/held")).await;
            assert_eq!(locks.len(), 1);
        });
    }
}
