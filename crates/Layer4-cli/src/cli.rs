//! Non-interactive commands: call, tools, perms, audit

use anyhow::{bail, Context};
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use toolgate_core::{ToolRequest, ToolResult, ToolRunner};
use toolgate_foundation::{AuditQuery, Capability, JsonStore};

/// 도구 호출 후 결과 JSON 출력 (실패 시 exit code 1)
pub async fn run_call(
    runner: &ToolRunner,
    tool: &str,
    user: Option<String>,
    args: Option<String>,
) -> anyhow::Result<()> {
    let result = if tool == "-" {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("Failed to read request from stdin")?;
        let value: Value =
            serde_json::from_str(&input).context("Request on stdin is not valid JSON")?;

        match ToolRequest::from_value(&value) {
            Ok(request) => dispatch(runner, request).await,
            // 잘못된 요청도 감사 로그에 남도록 runner에 넘김
            Err(_) => runner.dispatch_value(&value).await,
        }
    } else {
        let Some(principal) = user else {
            bail!("--user is required when calling a tool by name");
        };
        let args = match args {
            Some(raw) => match serde_json::from_str(&raw).context("--args is not valid JSON")? {
                Value::Object(map) => map,
                _ => bail!("--args must be a JSON object"),
            },
            None => Map::new(),
        };
        dispatch(runner, ToolRequest::new(tool, args, principal)).await
    };

    println!("{}", serde_json::to_string_pretty(&result.to_value())?);
    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Ctrl-C를 호출자 취소로 전달
async fn dispatch(runner: &ToolRunner, request: ToolRequest) -> ToolResult {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling tool call");
            on_signal.cancel();
        }
    });

    let result = runner.dispatch_with_cancel(request, cancel).await;
    watcher.abort();
    result
}

/// 등록된 도구 목록
pub fn list_tools(runner: &ToolRunner, schema: bool) -> anyhow::Result<()> {
    if schema {
        let schemas = Value::Array(runner.tool_schemas());
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    println!("{:<16} {:<16} {}", "Tool", "Capability", "Description");
    println!("{}", "-".repeat(80));
    for tool in runner.list_available_tools() {
        println!(
            "{:<16} {:<16} {}",
            tool.name,
            tool.capability.as_str(),
            tool.description
        );
    }
    Ok(())
}

/// 권한 조회 / 변경
pub fn permissions(
    runner: &ToolRunner,
    store: &JsonStore,
    principal: Option<String>,
    grant: Option<String>,
    revoke: Option<String>,
) -> anyhow::Result<()> {
    let manager = runner.permissions();

    if let Some(principal) = principal.as_deref() {
        let mut changed = false;
        if let Some(cap) = grant {
            manager.grant(principal, cap.parse::<Capability>()?);
            changed = true;
        }
        if let Some(cap) = revoke {
            manager.revoke(principal, cap.parse::<Capability>()?);
            changed = true;
        }
        if changed {
            manager.snapshot().save(store)?;
            println!(
                "Saved to {}",
                store.file_path(toolgate_foundation::PERMISSIONS_FILE).display()
            );
        }
    }

    let principals = match principal {
        Some(p) => vec![p],
        None => manager.principals(),
    };

    for principal in principals {
        let caps: Vec<&str> = manager
            .capabilities_of(&principal)
            .into_iter()
            .map(|c| c.as_str())
            .collect();
        let caps = if caps.is_empty() {
            "(none)".to_string()
        } else {
            caps.join(", ")
        };
        println!("{:<16} {}", principal, caps);
    }
    Ok(())
}

/// 감사 로그 조회 (최신순)
pub async fn audit(
    runner: &ToolRunner,
    user: Option<String>,
    tool: Option<String>,
    limit: usize,
) -> anyhow::Result<()> {
    let mut query = AuditQuery::new().with_limit(limit);
    if let Some(user) = user {
        query = query.with_principal(user);
    }
    if let Some(tool) = tool {
        query = query.with_tool(tool);
    }

    let entries = runner.call_history(&query).await?;
    if entries.is_empty() {
        if runner.config().audit.db_path.is_none() {
            println!("No entries. Set audit.dbPath to keep call history across runs.");
        } else {
            println!("No entries.");
        }
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:<16} {:<9} {:<11} {:<18} {:>8}",
        "Time", "Principal", "Tool", "Result", "Stage", "Error", "ms"
    );
    println!("{}", "-".repeat(100));
    for entry in entries {
        println!(
            "{:<20} {:<12} {:<16} {:<9} {:<11} {:<18} {:>8}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.principal,
            entry.tool,
            entry.result.as_str(),
            entry.stage.as_str(),
            entry.error_code.map(|k| k.as_str()).unwrap_or("-"),
            entry.duration_ms
        );
    }
    Ok(())
}
