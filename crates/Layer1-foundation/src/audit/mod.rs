//! Audit - 감사 로깅
//!
//! - `types`: AuditEntry, AuditQuery, DispatchStage
//! - `logger`: AuditLog (메모리 링 + 선택적 SQLite)
//! - `redact`: 민감 인자 마스킹

mod logger;
pub mod redact;
mod types;

pub use logger::AuditLog;
pub use redact::{redact_args, REDACTED};
pub use types::{AuditEntry, AuditId, AuditQuery, AuditResult, DispatchStage};
