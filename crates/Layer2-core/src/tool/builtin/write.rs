//! FileWrite - 파일 쓰기 도구
//!
//! 새 파일을 만들거나 기존 파일을 덮어씁니다.
//! 덮어쓰기 전 기존 내용은 VersionStore에 스냅샷으로 남습니다.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::fs;
use toolgate_foundation::{Capability, ErrorKind, Result};
use tracing::debug;

use super::encoding::TextEncoding;
use crate::tool::{PathIntent, Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// FileWrite 도구
#[derive(Debug, Default)]
pub struct WriteTool;

impl WriteTool {
    pub const NAME: &'static str = "FileWrite";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Write text to a file, snapshotting any previous content"
    }

    fn capability(&self) -> Capability {
        Capability::WriteFile
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("path", "Path of the file to write", true)
            .string_param("content", "Text content to write", true)
            .boolean_param("overwrite", "Replace an existing file (default: false)", false)
            .string_param("encoding", "utf-8 (default), ascii or latin-1", false)
            .string_param("message", "Note stored with the snapshot", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let encoding = TextEncoding::parse(args.opt_str("encoding"))?;
        let content = args.str("content")?;
        let overwrite = args.bool_or("overwrite", false);
        let message = args.opt_str("message").unwrap_or_default();
        let path = ctx.resolve_path(args.str("path")?, PathIntent::Write)?;

        // 인코딩 실패는 파일을 건드리기 전에
        let bytes = encoding.encode(content)?;

        let _guard = ctx.history.lock_path(&path).await;

        let existing = match fs::metadata(&path).await {
            Ok(m) => Some(m),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut version_id = None;
        if let Some(metadata) = existing {
            if metadata.is_dir() {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!("Path is a directory: {}", path.display()),
                ));
            }
            if !overwrite {
                return Ok(ToolResult::failure(
                    ErrorKind::AlreadyExists,
                    format!(
                        "File already exists: {} (set overwrite=true to replace)",
                        path.display()
                    ),
                ));
            }
            let previous = fs::read(&path).await?;
            version_id = Some(
                ctx.history
                    .snapshot(&path, &previous, &ctx.principal, message)
                    .await?,
            );
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "File written");

        let mut output = Map::new();
        output.insert("path".into(), json!(path.display().to_string()));
        output.insert("bytes_written".into(), json!(bytes.len()));
        if let Some(id) = version_id {
            output.insert("version_id".into(), Value::String(id));
        }
        Ok(ToolResult::success(Value::Object(output)))
    }
}
