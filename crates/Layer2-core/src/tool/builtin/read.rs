//! FileRead - 파일 읽기 도구
//!
//! 파일 전체 내용을 지정한 인코딩으로 디코딩해서 반환합니다.

use async_trait::async_trait;
use serde_json::json;
use tokio::fs;
use toolgate_foundation::{Capability, ErrorKind, Result};
use tracing::debug;

use super::encoding::TextEncoding;
use crate::tool::{PathIntent, Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// FileRead 도구
#[derive(Debug, Default)]
pub struct ReadTool;

impl ReadTool {
    pub const NAME: &'static str = "FileRead";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Read the full contents of a text file"
    }

    fn capability(&self) -> Capability {
        Capability::ReadFile
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("path", "Path of the file to read", true)
            .string_param("encoding", "utf-8 (default), ascii or latin-1", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let encoding = TextEncoding::parse(args.opt_str("encoding"))?;
        let path = ctx.resolve_path(args.str("path")?, PathIntent::Read)?;

        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ToolResult::failure(
                    ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            return Ok(ToolResult::failure(
                ErrorKind::InvalidInput,
                format!("Path is a directory: {}", path.display()),
            ));
        }

        let bytes = fs::read(&path).await?;
        let size = bytes.len();
        let content = encoding.decode(bytes)?;

        debug!(path = %path.display(), size, "File read");

        Ok(ToolResult::success(json!({
            "path": path.display().to_string(),
            "content": content,
            "size": size,
        })))
    }
}
