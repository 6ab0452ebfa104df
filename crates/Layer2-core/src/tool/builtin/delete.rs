//! FileDelete - 파일/디렉토리 삭제 도구
//!
//! 일반 파일은 지우기 전에 스냅샷을 남깁니다.
//! 심볼릭 링크는 링크 자체만 지웁니다.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::fs;
use toolgate_foundation::{Capability, ErrorKind, Result};
use tracing::info;

use crate::tool::{PathIntent, Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// FileDelete 도구
#[derive(Debug, Default)]
pub struct DeleteTool;

impl DeleteTool {
    pub const NAME: &'static str = "FileDelete";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Delete a file, symlink or (with recursive=true) a directory"
    }

    fn capability(&self) -> Capability {
        Capability::DeleteFile
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("path", "Path to delete", true)
            .boolean_param("recursive", "Allow deleting a directory tree (default: false)", false)
            .string_param("message", "Note stored with the snapshot", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let recursive = args.bool_or("recursive", false);
        let message = args.opt_str("message").unwrap_or_default();
        let path = ctx.resolve_path(args.str("path")?, PathIntent::Delete)?;

        let _guard = ctx.history.lock_path(&path).await;

        let metadata = match fs::symlink_metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ToolResult::failure(
                    ErrorKind::NotFound,
                    format!("Path not found: {}", path.display()),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let file_type = metadata.file_type();
        let mut version_id = None;

        let kind = if file_type.is_dir() {
            if !recursive {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!(
                        "Path is a directory: {} (set recursive=true to delete it)",
                        path.display()
                    ),
                ));
            }
            fs::remove_dir_all(&path).await?;
            "directory"
        } else if file_type.is_symlink() {
            fs::remove_file(&path).await?;
            "symlink"
        } else {
            let previous = fs::read(&path).await?;
            version_id = Some(
                ctx.history
                    .snapshot(&path, &previous, &ctx.principal, message)
                    .await?,
            );
            fs::remove_file(&path).await?;
            "file"
        };

        info!(path = %path.display(), kind, principal = %ctx.principal, "Deleted");

        let mut output = Map::new();
        output.insert("path".into(), json!(path.display().to_string()));
        output.insert("kind".into(), json!(kind));
        if let Some(id) = version_id {
            output.insert("version_id".into(), Value::String(id));
        }
        Ok(ToolResult::success(Value::Object(output)))
    }
}
