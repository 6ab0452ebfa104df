//! toolgate-core: Core Runtime for toolgate
//!
//! Layer2 - 도구 실행 레이어
//!
//! # 주요 모듈
//!
//! - `tool`: Tool trait, 인자 스키마, 레지스트리, 경로 보안, Builtin 도구 6종
//! - `history`: 파일 스냅샷 저장소 (diff / rollback)
//! - `runner`: ToolRunner - 검증, 권한 확인, 실행, 감사 기록
//!
//! # 사용 예시
//!
//! ```ignore
//! use toolgate_core::{ToolRequest, ToolRunner};
//! use toolgate_foundation::GatewayConfig;
//!
//! let runner = ToolRunner::from_config(GatewayConfig::load(&cwd)?)?;
//!
//! // 외부 형식 요청
//! let result = runner.dispatch_value(&json!({
//!     "tool": "FileRead",
//!     "args": { "user_id": "admin", "path": "src/main.rs" }
//! })).await;
//!
//! // 도구 목록
//! for tool in runner.list_available_tools() {
//!     println!("{} ({})", tool.name, tool.capability);
//! }
//! ```

// Core modules
pub mod history;
pub mod runner;
pub mod tool;

// Re-exports: Tool System
pub use tool::{
    ArgKind, ParamSpec, PathGuard, PathIntent, PathViolation, Tool, ToolArgs, ToolContext,
    ToolInfo, ToolRegistry, ToolResult, ToolSchema,
};

// Re-exports: History
pub use history::{VersionDiff, VersionRecord, VersionStore};

// Re-exports: Runner
pub use runner::{ToolRequest, ToolRunner};

// Re-exports: Layer1 types most callers need
pub use toolgate_foundation::{Capability, Error, ErrorKind, GatewayConfig, Result};
