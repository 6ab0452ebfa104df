//! Permission 테이블 저장/로드
//!
//! principal → capability 집합을 JSON으로 관리

use super::capability::Capability;
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 설정 파일명
pub const PERMISSIONS_FILE: &str = "permissions.json";

/// principal → capability 테이블
///
/// 직렬화 형식:
/// ```json
/// { "admin": ["read:file", "write:file"], "readonly": ["read:file"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable(pub BTreeMap<String, BTreeSet<Capability>>);

impl PermissionTable {
    /// 빈 테이블
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// 프로세스 시작 시 기본 테이블
    ///
    /// - `admin`: 전체
    /// - `user`: read / write / execute
    /// - `readonly`: read
    pub fn defaults() -> Self {
        let mut table = BTreeMap::new();
        table.insert("admin".to_string(), Capability::ALL.into_iter().collect());
        table.insert(
            "user".to_string(),
            [
                Capability::ReadFile,
                Capability::WriteFile,
                Capability::ExecuteCommand,
            ]
            .into_iter()
            .collect(),
        );
        table.insert(
            "readonly".to_string(),
            [Capability::ReadFile].into_iter().collect(),
        );
        Self(table)
    }

    pub fn get(&self, principal: &str) -> Option<&BTreeSet<Capability>> {
        self.0.get(principal)
    }

    pub fn insert(&mut self, principal: impl Into<String>, caps: BTreeSet<Capability>) {
        self.0.insert(principal.into(), caps);
    }

    pub fn principals(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }

    /// 다른 테이블의 항목으로 덮어쓰기 (principal 단위)
    pub fn merge(&mut self, other: PermissionTable) {
        self.0.extend(other.0);
    }

    /// 저장소에서 로드 (없으면 None)
    pub fn load(store: &JsonStore) -> Result<Option<Self>> {
        store.load_optional(PERMISSIONS_FILE)
    }

    /// 저장소에 저장
    pub fn save(&self, store: &JsonStore) -> Result<()> {
        store.save(PERMISSIONS_FILE, self)
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_table() {
        let table = PermissionTable::defaults();
        assert_eq!(table.get("admin").unwrap().len(), 5);
        assert!(table.get("user").unwrap().contains(&Capability::ExecuteCommand));
        assert!(!table.get("user").unwrap().contains(&Capability::DeleteFile));
        assert_eq!(
            table.get("readonly").unwrap().iter().collect::<Vec<_>>(),
            vec![&Capability::ReadFile]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(PermissionTable::load(&store).unwrap().is_none());

        let mut table = PermissionTable::empty();
        table.insert("ci", [Capability::ExecuteCommand].into_iter().collect());
        table.save(&store).unwrap();

        let loaded = PermissionTable::load(&store).unwrap().unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_unknown_capability_rejected_on_load() {
        let parsed: std::result::Result<PermissionTable, _> =
            serde_json::from_str(r#"{"x": ["read:*"]}"#);
        assert!(parsed.is_err());
    }
}
