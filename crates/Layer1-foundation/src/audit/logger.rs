//! Audit Log - 감사 로그 기록 및 조회
//!
//! 메모리 링 버퍼를 기본으로 두고, `db_path`가 설정되면 SQLite에도 영구 기록한다.
//! 링은 `max_entries`를 넘으면 최신 `retain_entries`개만 남긴다.

use super::types::{AuditEntry, AuditId, AuditQuery, AuditResult, DispatchStage};
use crate::config::AuditConfig;
use crate::error::ErrorKind;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct AuditState {
    ring: VecDeque<AuditEntry>,
    db: Option<Connection>,
}

/// 감사 로그
///
/// ## 사용법
///
/// ```ignore
/// use toolgate_foundation::audit::{AuditLog, AuditEntry, AuditQuery};
///
/// let log = AuditLog::in_memory();
/// log.record(AuditEntry::new("admin", "FileRead")).await?;
///
/// let entries = log.query(&AuditQuery::new().with_principal("admin")).await?;
/// ```
pub struct AuditLog {
    state: Mutex<AuditState>,
    max_entries: usize,
    retain_entries: usize,
}

impl AuditLog {
    /// 메모리 전용 로그
    pub fn in_memory() -> Self {
        Self::build(None, &AuditConfig::default())
    }

    /// 설정으로 생성 (`db_path`가 있으면 SQLite 연결)
    pub fn new(config: &AuditConfig) -> crate::Result<Self> {
        let db = match &config.db_path {
            Some(path) => Some(open_db(path)?),
            None => None,
        };
        Ok(Self::build(db, config))
    }

    /// SQLite 인메모리 DB 사용 (테스트용)
    pub fn with_sqlite_in_memory(config: &AuditConfig) -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_tables(&conn)?;
        Ok(Self::build(Some(conn), config))
    }

    fn build(db: Option<Connection>, config: &AuditConfig) -> Self {
        let max_entries = config.max_entries.max(1);
        Self {
            state: Mutex::new(AuditState {
                ring: VecDeque::new(),
                db,
            }),
            max_entries,
            retain_entries: config.retain_entries.clamp(1, max_entries),
        }
    }

    /// 엔트리 추가
    ///
    /// 링에는 항상 먼저 들어간다. SQLite 기록이 실패하면 에러를 반환하지만
    /// 엔트리는 링에 남아 조회할 수 있다.
    pub async fn record(&self, entry: AuditEntry) -> crate::Result<AuditId> {
        let mut state = self.state.lock().await;
        let id = entry.id.clone();

        debug!(
            audit_id = %id,
            principal = %entry.principal,
            tool = %entry.tool,
            result = entry.result.as_str(),
            "Audit entry recorded"
        );

        let persisted = match &state.db {
            Some(db) => insert_entry(db, &entry),
            None => Ok(()),
        };

        state.ring.push_back(entry);
        if state.ring.len() > self.max_entries {
            let excess = state.ring.len() - self.retain_entries;
            state.ring.drain(..excess);
        }

        persisted.map(|_| id)
    }

    /// 조건으로 조회 (최신순)
    ///
    /// SQLite 조회가 실패하면 메모리 링으로 대신한다.
    pub async fn query(&self, query: &AuditQuery) -> crate::Result<Vec<AuditEntry>> {
        let state = self.state.lock().await;

        if let Some(db) = &state.db {
            match query_db(db, query) {
                Ok(entries) => return Ok(entries),
                Err(e) => warn!(error = %e, "Audit database query failed, using in-memory entries"),
            }
        }

        let iter = state.ring.iter().rev().filter(|e| query.matches(e)).cloned();
        Ok(if query.limit == 0 {
            iter.collect()
        } else {
            iter.take(query.limit).collect()
        })
    }

    /// 최근 엔트리
    pub async fn recent(&self, limit: usize) -> crate::Result<Vec<AuditEntry>> {
        self.query(&AuditQuery::new().with_limit(limit)).await
    }

    /// 메모리 링의 엔트리 수
    pub async fn len(&self) -> usize {
        self.state.lock().await.ring.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 전체 삭제
    pub async fn clear(&self) -> crate::Result<()> {
        let mut state = self.state.lock().await;
        state.ring.clear();
        if let Some(db) = &state.db {
            db.execute("DELETE FROM audit_log", [])?;
        }
        info!("Audit log cleared");
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

fn open_db(path: &Path) -> crate::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    init_tables(&conn)?;
    info!(db_path = %path.display(), "Audit database opened");
    Ok(conn)
}

fn init_tables(db: &Connection) -> crate::Result<()> {
    db.execute(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            timestamp TEXT NOT NULL,
            principal TEXT NOT NULL,
            tool TEXT NOT NULL,
            args TEXT NOT NULL,
            result TEXT NOT NULL,
            stage TEXT NOT NULL,
            error_code TEXT,
            message TEXT,
            duration_ms INTEGER NOT NULL
        )
        "#,
        [],
    )?;
    db.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_principal ON audit_log(principal)",
        [],
    )?;
    db.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_tool ON audit_log(tool)",
        [],
    )?;
    Ok(())
}

fn insert_entry(db: &Connection, entry: &AuditEntry) -> crate::Result<()> {
    db.execute(
        r#"
        INSERT INTO audit_log (
            id, timestamp, principal, tool, args, result, stage, error_code, message, duration_ms
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            entry.id.0,
            entry.timestamp.to_rfc3339(),
            entry.principal,
            entry.tool,
            serde_json::to_string(&entry.args)?,
            entry.result.as_str(),
            entry.stage.as_str(),
            entry.error_code.map(|c| c.as_str()),
            entry.message,
            entry.duration_ms as i64,
        ],
    )?;
    Ok(())
}

fn query_db(db: &Connection, query: &AuditQuery) -> crate::Result<Vec<AuditEntry>> {
    let mut sql = String::from("SELECT * FROM audit_log WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref principal) = query.principal {
        sql.push_str(" AND principal = ?");
        params_vec.push(Box::new(principal.clone()));
    }
    if let Some(ref tool) = query.tool {
        sql.push_str(" AND tool = ?");
        params_vec.push(Box::new(tool.clone()));
    }

    sql.push_str(" ORDER BY seq DESC");
    if query.limit > 0 {
        sql.push_str(&format!(" LIMIT {}", query.limit));
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = db.prepare(&sql)?;
    let entries = stmt
        .query_map(params_refs.as_slice(), row_to_entry)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<AuditEntry> {
    let timestamp: String = row.get("timestamp")?;
    let args: String = row.get("args")?;
    let result: String = row.get("result")?;
    let stage: String = row.get("stage")?;
    let error_code: Option<String> = row.get("error_code")?;
    let duration_ms: i64 = row.get("duration_ms")?;

    Ok(AuditEntry {
        id: AuditId(row.get("id")?),
        timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now()),
        principal: row.get("principal")?,
        tool: row.get("tool")?,
        args: serde_json::from_str(&args).unwrap_or(Value::Null),
        result: AuditResult::parse(&result),
        stage: DispatchStage::parse(&stage).unwrap_or(DispatchStage::Failed),
        error_code: error_code.as_deref().and_then(ErrorKind::parse),
        message: row.get("message")?,
        duration_ms: duration_ms.max(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(principal: &str, tool: &str) -> AuditEntry {
        AuditEntry::new(principal, tool)
    }

    #[tokio::test]
    async fn test_record_and_query_filters() {
        let log = AuditLog::in_memory();
        log.record(entry("admin", "FileRead")).await.unwrap();
        log.record(entry("user", "FileRead")).await.unwrap();
        log.record(entry("admin", "ExecuteCommand")).await.unwrap();

        let admin = log
            .query(&AuditQuery::new().with_principal("admin"))
            .await
            .unwrap();
        assert_eq!(admin.len(), 2);
        // 최신순
        assert_eq!(admin[0].tool, "ExecuteCommand");

        let reads = log
            .query(&AuditQuery::new().with_tool("FileRead").with_limit(1))
            .await
            .unwrap();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].principal, "user");
    }

    #[tokio::test]
    async fn test_ring_trim() {
        let config = AuditConfig {
            db_path: None,
            max_entries: 10,
            retain_entries: 5,
        };
        let log = AuditLog::new(&config).unwrap();
        for i in 0..11 {
            log.record(entry("p", &format!("t{}", i))).await.unwrap();
        }
        assert_eq!(log.len().await, 5);
        let newest = log.recent(1).await.unwrap();
        assert_eq!(newest[0].tool, "t10");
    }

    #[tokio::test]
    async fn test_sqlite_roundtrip() {
        let log = AuditLog::with_sqlite_in_memory(&AuditConfig::default()).unwrap();
        let failed = entry("readonly", "FileWrite")
            .with_args(json!({ "path": "x", "content": "hidden" }).as_object().unwrap())
            .with_failure(
                AuditResult::Denied,
                DispatchStage::Validated,
                ErrorKind::PermissionDenied,
                "nope",
            );
        log.record(failed).await.unwrap();
        log.record(entry("admin", "FileRead")).await.unwrap();

        let rows = log
            .query(&AuditQuery::new().with_principal("readonly"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result, AuditResult::Denied);
        assert_eq!(rows[0].error_code, Some(ErrorKind::PermissionDenied));
        assert_eq!(rows[0].args["content"], "***");

        log.clear().await.unwrap();
        assert!(log.recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_database_failure_keeps_entry() {
        let log = AuditLog::with_sqlite_in_memory(&AuditConfig::default()).unwrap();
        {
            let state = log.state.lock().await;
            state
                .db
                .as_ref()
                .unwrap()
                .execute("DROP TABLE audit_log", [])
                .unwrap();
        }

        assert!(log.record(entry("admin", "FileRead")).await.is_err());
        assert_eq!(log.len().await, 1);

        let rows = log.recent(0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tool, "FileRead");
    }
}
