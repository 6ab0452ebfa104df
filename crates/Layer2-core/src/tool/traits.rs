//! Tool trait

use super::args::{ToolArgs, ToolSchema};
use super::context::ToolContext;
use super::result::ToolResult;
use async_trait::async_trait;
use toolgate_foundation::{Capability, Result};

/// 모든 도구가 구현하는 trait
///
/// Runner는 `capability()` 검사와 `schema()` 검증을 마친 뒤에만
/// `execute`를 호출한다. handler는 예상된 실패를 `ToolResult::Failure`로,
/// 그 외 에러를 `Err`로 돌려준다 (Runner가 `Error::kind()`로 변환).
#[async_trait]
pub trait Tool: Send + Sync {
    /// 외부에 노출되는 이름 (예: "FileRead")
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// 실행에 필요한 capability (정확히 하나)
    fn capability(&self) -> Capability;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult>;
}
