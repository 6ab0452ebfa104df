//! Version types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Version Record
// ============================================================================

/// 스냅샷 하나의 메타데이터
///
/// 생성 후 변경되지 않으며 코어가 삭제하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// `{timestamp}_{seq}_{principal}`
    pub version_id: String,

    /// 스냅샷 대상 파일 (canonical)
    pub file_path: PathBuf,

    /// 스냅샷을 만든 principal
    pub principal: String,

    /// 사용자 메시지
    pub message: String,

    pub created_at: DateTime<Utc>,

    /// 내용 크기 (bytes)
    pub size: u64,

    /// 저장소 내부 content 파일 경로
    #[serde(skip)]
    pub content_ref: PathBuf,
}

// ============================================================================
// Version Diff
// ============================================================================

/// 두 버전 사이의 unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from: String,
    pub to: String,
    pub diff: String,
    pub has_changes: bool,
}
