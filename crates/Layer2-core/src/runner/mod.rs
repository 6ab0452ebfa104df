//! Runner - 도구 호출 dispatch
//!
//! - `request`: ToolRequest (외부 JSON 형식 파싱 포함)
//! - `dispatch`: ToolRunner (검증 → 권한 → 실행 → 감사)

mod dispatch;
mod request;

pub use dispatch::ToolRunner;
pub use request::{ToolRequest, PRINCIPAL_ARG};
