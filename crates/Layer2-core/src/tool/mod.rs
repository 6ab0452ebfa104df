//! Tool System - 도구 정의, 검증, 등록
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolRegistry                                                │
//! │  ├── register(tool) - 도구 등록                              │
//! │  ├── get(name) - 도구 조회                                   │
//! │  └── schemas() - JSON Schema 목록                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolSchema / ToolArgs                                       │
//! │  └── validate(args) - 필수/타입/알 수 없는 필드 검사          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ToolContext                                                 │
//! │  ├── PathGuard - 경로 검증 (security)                        │
//! │  ├── VersionStore - 스냅샷                                   │
//! │  └── CancellationToken - 호출자 취소                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools (Tool trait 구현)                             │
//! │  ├── FileRead / FileWrite / FileDelete / ListDirectory       │
//! │  ├── ExecuteCommand                                          │
//! │  └── HttpRequest                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod args;
pub mod builtin;
mod context;
mod registry;
mod result;
pub mod security;
mod traits;

// Re-exports: core types
pub use args::{ArgKind, ParamSpec, ToolArgs, ToolSchema, ToolSchemaBuilder};
pub use context::ToolContext;
pub use result::ToolResult;
pub use traits::Tool;

// Re-exports: Tools
pub use builtin::{all_tools, DeleteTool, ExecTool, HttpTool, ListTool, ReadTool, WriteTool};

// Re-exports: Registry
pub use registry::{ToolInfo, ToolRegistry};

// Re-exports: Security
pub use security::{PathGuard, PathIntent, PathViolation};
