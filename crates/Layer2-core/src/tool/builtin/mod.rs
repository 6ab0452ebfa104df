//! Builtin Tools - 내장 도구들
//!
//! ## 도구 목록
//!
//! ### 파일시스템 (Filesystem)
//! - `FileRead` - 파일 읽기 (read:file)
//! - `FileWrite` - 파일 쓰기, 덮어쓰기 전 스냅샷 (write:file)
//! - `FileDelete` - 파일/디렉토리 삭제, 삭제 전 스냅샷 (delete:file)
//! - `ListDirectory` - 디렉토리 목록 (read:file)
//!
//! ### 실행 (Execute)
//! - `ExecuteCommand` - 프로세스 실행 (execute:command)
//!
//! ### 네트워크 (Network)
//! - `HttpRequest` - 외부 HTTP 요청 (network:outbound)

mod encoding;

// Filesystem tools
pub mod delete;
pub mod list;
pub mod read;
pub mod write;

// Execute tools
pub mod exec;

// Network tools
pub mod http;

// Re-exports
pub use delete::DeleteTool;
pub use encoding::TextEncoding;
pub use exec::ExecTool;
pub use http::HttpTool;
pub use list::ListTool;
pub use read::ReadTool;
pub use write::WriteTool;

use super::traits::Tool;
use std::sync::Arc;
use toolgate_foundation::GatewayConfig;

/// 모든 builtin 도구 인스턴스 생성
pub fn all_tools(config: &GatewayConfig) -> Vec<Arc<dyn Tool>> {
    vec![
        // Filesystem
        Arc::new(ReadTool::new()) as Arc<dyn Tool>,
        Arc::new(WriteTool::new()),
        Arc::new(DeleteTool::new()),
        Arc::new(ListTool::new()),
        // Execute
        Arc::new(ExecTool::new(config.command.policy())),
        // Network
        Arc::new(HttpTool::new()),
    ]
}
