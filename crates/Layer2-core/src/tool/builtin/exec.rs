//! ExecuteCommand - 프로세스 실행 도구
//!
//! 명령어를 shell 없이 직접 실행합니다.
//! - POSIX shell-word 규칙으로 argv 분리 (shlex)
//! - CommandPolicy로 위험 명령어 차단
//! - 타임아웃 / 호출자 취소 시 프로세스 그룹 전체를 kill 후 reap
//! - stdout/stderr 크기 제한

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use toolgate_foundation::{Capability, CommandPolicy, ErrorKind, Result};
use tracing::{debug, warn};

use crate::tool::{PathIntent, Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// 종료 후 reader가 남은 출력을 비울 때까지 기다리는 시간
const READER_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8 * 1024;

/// ExecuteCommand 도구
#[derive(Debug)]
pub struct ExecTool {
    policy: CommandPolicy,
}

impl ExecTool {
    pub const NAME: &'static str = "ExecuteCommand";

    pub fn new(policy: CommandPolicy) -> Self {
        Self { policy }
    }
}

impl Default for ExecTool {
    fn default() -> Self {
        Self::new(CommandPolicy::new())
    }
}

#[async_trait]
impl Tool for ExecTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Run a program directly (no shell) with a timeout"
    }

    fn capability(&self) -> Capability {
        Capability::ExecuteCommand
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("cmd", "Command line, split with POSIX shell-word rules", true)
            .string_param("cwd", "Working directory (default: gateway working directory)", false)
            .integer_param("timeout", "Timeout in seconds (default: 60)", false)
            .string_map_param("env", "Extra environment variables", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let command_line = args.str("cmd")?;
        let argv = match shlex::split(command_line) {
            Some(argv) if !argv.is_empty() => argv,
            Some(_) => {
                return Ok(ToolResult::failure(ErrorKind::InvalidInput, "Command is empty"));
            }
            None => {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    "Command could not be parsed (unbalanced quotes?)",
                ));
            }
        };

        if let Err(reason) = self.policy.check(command_line, &argv) {
            warn!(principal = %ctx.principal, program = %argv[0], %reason, "Command blocked");
            return Ok(ToolResult::failure(
                ErrorKind::InvalidInput,
                format!("Command blocked: {}", reason),
            ));
        }

        let cwd = match args.opt_str("cwd") {
            Some(raw) => ctx.resolve_path(raw, PathIntent::List)?,
            None => ctx.paths.working_dir().to_path_buf(),
        };
        if !tokio::fs::metadata(&cwd).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(ToolResult::failure(
                ErrorKind::InvalidInput,
                format!("Working directory does not exist: {}", cwd.display()),
            ));
        }

        let settings = &ctx.config.command;
        let timeout = match args.opt_positive("timeout")? {
            Some(secs) => settings.clamp_timeout(secs),
            None => settings.clamp_timeout(settings.default_timeout_secs),
        };

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .current_dir(&cwd)
            .envs(args.string_map("env"))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // 손자 프로세스까지 한 번에 kill 하도록 새 프로세스 그룹으로 실행
        #[cfg(unix)]
        cmd.process_group(0);

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Ok(ToolResult::failure(
                    ErrorKind::ExecutionError,
                    format!("Failed to spawn '{}': {}", argv[0], e),
                ));
            }
        };

        debug!(program = %argv[0], pid = ?child.id(), timeout_secs = timeout.as_secs(), "Process spawned");
        let mut group = ProcessGroup::new(child.id());

        let max_output = settings.max_output_bytes;
        let stdout = CapturedReader::spawn(child.stdout.take(), max_output);
        let stderr = CapturedReader::spawn(child.stderr.take(), max_output);

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(timeout) => None,
            _ = ctx.cancel.cancelled() => None,
        };

        let status = match outcome {
            Some(status) => status?,
            None => {
                let cancelled = ctx.cancel.is_cancelled();
                group.kill();
                let _ = child.start_kill();
                let _ = child.wait().await;
                stdout.abort();
                stderr.abort();

                warn!(
                    program = %argv[0],
                    timeout_secs = timeout.as_secs(),
                    cancelled,
                    "Process killed"
                );
                let message = if cancelled {
                    "Command cancelled by caller".to_string()
                } else {
                    format!("Command timed out after {} s", timeout.as_secs())
                };
                return Ok(ToolResult::failure(ErrorKind::Timeout, message).with_details(json!({
                    "timeout_secs": timeout.as_secs(),
                    "cancelled": cancelled,
                })));
            }
        };

        group.disarm();
        let (stdout, stdout_truncated) = stdout.finish().await;
        let (stderr, stderr_truncated) = stderr.finish().await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let exit_code = status.code().unwrap_or(-1);

        debug!(program = %argv[0], exit_code, duration_ms, "Process exited");

        Ok(ToolResult::success(json!({
            "stdout": String::from_utf8_lossy(&stdout),
            "stderr": String::from_utf8_lossy(&stderr),
            "exit_code": exit_code,
            "duration_ms": duration_ms,
            "truncated": stdout_truncated || stderr_truncated,
        })))
    }
}

// ============================================================================
// Process group
// ============================================================================

/// child가 리더인 프로세스 그룹
///
/// drop 되면 (타임아웃, 취소, future drop) 그룹 전체에 SIGKILL.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        #[cfg(unix)]
        {
            // 그룹이 이미 비었으면 ESRCH
            let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                debug!(pgid, error = %std::io::Error::last_os_error(), "killpg failed");
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }

    /// 정상 종료: 그룹은 그대로 둔다
    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

// ============================================================================
// Output capture
// ============================================================================

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// child 파이프 하나를 읽는 task
///
/// 제한을 넘은 뒤에도 파이프는 계속 비워서 child가 막히지 않게 한다.
struct CapturedReader {
    buffer: Arc<Mutex<Captured>>,
    handle: Option<JoinHandle<()>>,
}

impl CapturedReader {
    fn spawn<R>(reader: Option<R>, cap: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Captured::default()));
        let handle = reader.map(|reader| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(read_capped(reader, cap, buffer))
        });
        Self { buffer, handle }
    }

    fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// reader 종료를 잠시 기다린 뒤 모인 출력 반환
    async fn finish(mut self) -> (Vec<u8>, bool) {
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(READER_GRACE, &mut handle).await.is_err() {
                // 자식 프로세스가 파이프를 물고 있음
                handle.abort();
            }
        }
        let mut captured = self.buffer.lock();
        (std::mem::take(&mut captured.bytes), captured.truncated)
    }
}

async fn read_capped<R>(mut reader: R, cap: usize, buffer: Arc<Mutex<Captured>>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let mut captured = buffer.lock();
        let room = cap.saturating_sub(captured.bytes.len());
        if n > room {
            captured.truncated = true;
        }
        captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::{Map, Value};
    use tempfile::TempDir;
    use toolgate_foundation::GatewayConfig;

    fn args(tool: &ExecTool, v: Value) -> ToolArgs {
        let map: Map<String, Value> = v.as_object().cloned().unwrap();
        tool.schema().validate(map).unwrap()
    }

    #[tokio::test]
    async fn test_echo() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let tool = ExecTool::default();

        let result = tool
            .execute(args(&tool, json!({ "cmd": "echo 'hello world'" })), &ctx)
            .await
            .unwrap();
        let output = result.output().unwrap();
        assert_eq!(output["stdout"], "hello world\n");
        assert_eq!(output["exit_code"], 0);
        assert_eq!(output["truncated"], false);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_success() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let tool = ExecTool::default();

        let result = tool
            .execute(args(&tool, json!({ "cmd": "sh -c 'echo oops >&2; exit 3'" })), &ctx)
            .await
            .unwrap();
        let output = result.output().unwrap();
        assert_eq!(output["exit_code"], 3);
        assert_eq!(output["stderr"], "oops\n");
    }

    #[tokio::test]
    async fn test_env_and_cwd() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        std::fs::create_dir(ctx.paths.working_dir().join("sub")).unwrap();
        let tool = ExecTool::default();

        let result = tool
            .execute(
                args(
                    &tool,
                    json!({ "cmd": "sh -c 'echo $GREETING; pwd'", "cwd": "sub", "env": { "GREETING": "hi" } }),
                ),
                &ctx,
            )
            .await
            .unwrap();
        let stdout = result.output().unwrap()["stdout"].as_str().unwrap().to_string();
        assert!(stdout.starts_with("hi\n"));
        assert!(stdout.trim_end().ends_with("sub"));
    }

    #[tokio::test]
    async fn test_output_truncated() {
        let dir = TempDir::new().unwrap();
        let mut config = GatewayConfig::default();
        config.command.max_output_bytes = 10;
        let ctx = ToolContext::for_test(dir.path(), config);
        let tool = ExecTool::default();

        let result = tool
            .execute(args(&tool, json!({ "cmd": "echo 0123456789abcdef" })), &ctx)
            .await
            .unwrap();
        let output = result.output().unwrap();
        assert_eq!(output["stdout"], "0123456789");
        assert_eq!(output["truncated"], true);
    }

    #[tokio::test]
    async fn test_rejections() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let tool = ExecTool::default();

        for cmd in ["   ", "echo 'unterminated", "shutdown -h now"] {
            let result = tool.execute(args(&tool, json!({ "cmd": cmd })), &ctx).await.unwrap();
            assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput), "{}", cmd);
        }

        let err = tool
            .execute(args(&tool, json!({ "cmd": "true", "timeout": 0 })), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let tool = ExecTool::default();

        let result = tool
            .execute(args(&tool, json!({ "cmd": "definitely-not-a-real-program-xyz" })), &ctx)
            .await
            .unwrap();
        assert_eq!(result.error_kind(), Some(ErrorKind::ExecutionError));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let tool = ExecTool::default();

        let started = Instant::now();
        let result = tool
            .execute(args(&tool, json!({ "cmd": "sleep 5", "timeout": 1 })), &ctx)
            .await
            .unwrap();
        assert!(started.elapsed() <= Duration::from_millis(1500));
        assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(result.details().unwrap()["cancelled"], false);
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let marker = ctx.paths.working_dir().join("survived");
        let tool = ExecTool::default();

        let result = tool
            .execute(
                args(&tool, json!({ "cmd": "sh -c '(sleep 2; touch survived) & wait'", "timeout": 1 })),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists(), "background subshell outlived the timeout");
    }

    #[tokio::test]
    async fn test_cancel_kills_grandchildren() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let marker = ctx.paths.working_dir().join("survived");
        let cancel = ctx.cancel.clone();
        let tool = ExecTool::default();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });
        let result = tool
            .execute(args(&tool, json!({ "cmd": "sh -c '(sleep 1; touch survived) & wait'" })), &ctx)
            .await
            .unwrap();
        assert_eq!(result.details().unwrap()["cancelled"], true);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "background subshell outlived the cancel");
    }

    #[tokio::test]
    async fn test_cancel() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::for_test(dir.path(), GatewayConfig::default());
        let cancel = ctx.cancel.clone();
        let tool = ExecTool::default();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
        let result = tool
            .execute(args(&tool, json!({ "cmd": "sleep 5" })), &ctx)
            .await
            .unwrap();
        assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
        assert_eq!(result.details().unwrap()["cancelled"], true);
    }
}
