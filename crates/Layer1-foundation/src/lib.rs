//! # toolgate-foundation
//!
//! Foundation layer for toolgate:
//! - Error: 에러 타입과 외부 에러 코드 (ErrorKind)
//! - Permission: principal → capability 관리 + 명령어 안전 정책
//! - Audit: dispatch 감사 로그 (메모리 + SQLite)
//! - Config: 통합 설정 (GatewayConfig) 및 레이어 로더
//! - Storage: JsonStore (범용)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  ToolRunner (toolgate-core)                             │
//! │     │                                                   │
//! │     ├── PermissionManager.check(principal, capability)  │
//! │     ├── Tool handler (path sandbox, version store)      │
//! │     └── AuditLog.record(entry)                          │
//! │                                                         │
//! │  GatewayConfig ← ConfigLoader (global/project/local)    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ErrorKind, Result};

// ============================================================================
// Permission (권한 시스템)
// ============================================================================
pub use permission::{
    Capability, CommandPolicy, ForbiddenPattern, PermissionManager, PermissionTable,
    PERMISSIONS_FILE,
};

// ============================================================================
// Audit (감사 로깅)
// ============================================================================
pub use audit::{AuditEntry, AuditId, AuditLog, AuditQuery, AuditResult, DispatchStage};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    AuditConfig, CommandConfig, ConfigLoader, GatewayConfig, HistoryConfig, HttpConfig,
    SandboxConfig,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;
