//! Permission Manager - 런타임 권한 관리
//!
//! principal → capability 집합을 프로세스 수명 동안 보관한다.
//! 읽기는 공유 락, grant/revoke는 배타 락으로 직렬화된다.

use super::capability::Capability;
use super::settings::PermissionTable;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// 권한 관리자
pub struct PermissionManager {
    table: RwLock<HashMap<String, HashSet<Capability>>>,
}

impl PermissionManager {
    /// 기본 테이블(admin/user/readonly)로 생성
    pub fn new() -> Self {
        Self::from_table(PermissionTable::defaults())
    }

    /// 빈 테이블로 생성
    pub fn empty() -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
        }
    }

    /// 설정/저장소에서 읽은 테이블로 생성
    pub fn from_table(table: PermissionTable) -> Self {
        let map = table
            .0
            .into_iter()
            .map(|(principal, caps)| (principal, caps.into_iter().collect()))
            .collect();
        Self {
            table: RwLock::new(map),
        }
    }

    /// 권한 확인
    ///
    /// 에러를 반환하지 않는다. 모르는 principal은 빈 집합이므로 false.
    pub fn check(&self, principal: &str, capability: Capability) -> bool {
        self.table
            .read()
            .get(principal)
            .map(|caps| caps.contains(&capability))
            .unwrap_or(false)
    }

    /// 권한 부여
    pub fn grant(&self, principal: &str, capability: Capability) {
        let added = self
            .table
            .write()
            .entry(principal.to_string())
            .or_default()
            .insert(capability);

        if added {
            info!(principal = %principal, capability = %capability, "Capability granted");
        }
    }

    /// 권한 회수
    pub fn revoke(&self, principal: &str, capability: Capability) {
        let removed = self
            .table
            .write()
            .get_mut(principal)
            .map(|caps| caps.remove(&capability))
            .unwrap_or(false);

        if removed {
            info!(principal = %principal, capability = %capability, "Capability revoked");
        }
    }

    /// principal의 권한 집합 교체
    pub fn set_capabilities(&self, principal: &str, capabilities: impl IntoIterator<Item = Capability>) {
        let caps: HashSet<Capability> = capabilities.into_iter().collect();
        info!(principal = %principal, count = caps.len(), "Capabilities replaced");
        self.table.write().insert(principal.to_string(), caps);
    }

    /// principal의 권한 집합 (정렬됨)
    pub fn capabilities_of(&self, principal: &str) -> BTreeSet<Capability> {
        self.table
            .read()
            .get(principal)
            .map(|caps| caps.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 등록된 principal 목록 (정렬됨)
    pub fn principals(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 현재 테이블 스냅샷 (영속화용)
    pub fn snapshot(&self) -> PermissionTable {
        PermissionTable(
            self.table
                .read()
                .iter()
                .map(|(p, caps)| (p.clone(), caps.iter().copied().collect()))
                .collect(),
        )
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================
