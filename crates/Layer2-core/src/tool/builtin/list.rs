//! ListDirectory - 디렉토리 목록 도구
//!
//! 한 단계 아래 항목만 나열합니다 (재귀 없음).
//! `.`으로 시작하는 이름은 숨김으로 취급합니다.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::fs;
use toolgate_foundation::{Capability, ErrorKind, Result};
use tracing::debug;

use crate::tool::{PathIntent, Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// 목록 항목
#[derive(Debug, Clone, Serialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub size: u64,
    pub last_modified: Option<String>,
}

/// ListDirectory 도구
#[derive(Debug, Default)]
pub struct ListTool;

impl ListTool {
    pub const NAME: &'static str = "ListDirectory";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "List the entries of a directory"
    }

    fn capability(&self) -> Capability {
        Capability::ReadFile
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("path", "Directory to list", true)
            .boolean_param("include_hidden", "Include dot-files (default: false)", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let include_hidden = args.bool_or("include_hidden", false);
        let path = ctx.resolve_path(args.str("path")?, PathIntent::List)?;

        match fs::metadata(&path).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!("Not a directory: {}", path.display()),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ToolResult::failure(
                    ErrorKind::NotFound,
                    format!("Directory not found: {}", path.display()),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !include_hidden && name.starts_with('.') {
                continue;
            }

            // 링크는 대상 기준, 끊어진 링크는 링크 자체 기준
            let metadata = match fs::metadata(entry.path()).await {
                Ok(m) => m,
                Err(_) => entry.metadata().await?,
            };
            let entry_type = if metadata.is_file() {
                "file"
            } else if metadata.is_dir() {
                "directory"
            } else {
                "other"
            };
            let last_modified = metadata.modified().ok().map(|t| {
                DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true)
            });

            entries.push(DirEntry {
                name,
                entry_type,
                size: metadata.len(),
                last_modified,
            });
        }

        entries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(path = %path.display(), count = entries.len(), "Directory listed");

        Ok(ToolResult::success(json!({
            "path": path.display().to_string(),
            "count": entries.len(),
            "entries": entries,
        })))
    }
}
