//! ToolRunner - 단일 진입점
//!
//! ```text
//! Received ──(tool 존재, principal 비어있지 않음)──▶ Validated
//! Validated ──(PermissionManager.check)──────────▶ Authorized
//! Authorized ──(ToolSchema.validate)─────────────▶ Executing
//! Executing ──(handler, catch_unwind)────────────▶ Completed | Failed
//! ```
//!
//! 어느 단계에서 끝나든 감사 로그에는 정확히 한 건이 남는다.

use super::request::{ToolRequest, PRINCIPAL_ARG};
use crate::history::VersionStore;
use crate::tool::{PathGuard, ToolContext, ToolInfo, ToolRegistry, ToolResult};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use toolgate_foundation::{
    AuditEntry, AuditLog, AuditQuery, AuditResult, DispatchStage, ErrorKind, GatewayConfig,
    PermissionManager, Result,
};
use tracing::{debug, info, warn};

/// 한 번의 dispatch 결과
struct Outcome {
    result: ToolResult,
    stage: DispatchStage,
    audit: AuditResult,
}

impl Outcome {
    fn rejected(stage: DispatchStage, result: ToolResult) -> Self {
        Self {
            result,
            stage,
            audit: AuditResult::Rejected,
        }
    }

    fn executed(result: ToolResult) -> Self {
        let (stage, audit) = if result.is_success() {
            (DispatchStage::Completed, AuditResult::Success)
        } else {
            (DispatchStage::Failed, AuditResult::Failure)
        };
        Self {
            result,
            stage,
            audit,
        }
    }
}

/// 도구 실행기
///
/// ## 사용법
///
/// ```ignore
/// let runner = ToolRunner::from_config(GatewayConfig::load(&cwd)?)?;
///
/// let result = runner
///     .dispatch(ToolRequest::new("FileRead", args, "admin"))
///     .await;
/// println!("{}", result.to_value());
/// ```
pub struct ToolRunner {
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionManager>,
    audit: Arc<AuditLog>,
    paths: Arc<PathGuard>,
    history: Arc<VersionStore>,
    config: Arc<GatewayConfig>,
}

impl ToolRunner {
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionManager>,
        audit: Arc<AuditLog>,
        paths: Arc<PathGuard>,
        history: Arc<VersionStore>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            registry,
            permissions,
            audit,
            paths,
            history,
            config,
        }
    }

    /// 설정으로 모든 저장소를 만들어 생성
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let registry = ToolRegistry::with_builtins(&config);
        let permissions = PermissionManager::from_table(config.permissions.clone());
        let audit = AuditLog::new(&config.audit)?;
        let paths = PathGuard::from_config(&config.sandbox);
        let history = VersionStore::from_config(&config.history);

        info!(
            tools = registry.len(),
            working_dir = %paths.working_dir().display(),
            history_dir = %history.root().display(),
            "Tool runner initialized"
        );

        Ok(Self::new(
            Arc::new(registry),
            Arc::new(permissions),
            Arc::new(audit),
            Arc::new(paths),
            Arc::new(history),
            Arc::new(config),
        ))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn paths(&self) -> &Arc<PathGuard> {
        &self.paths
    }

    pub fn history(&self) -> &Arc<VersionStore> {
        &self.history
    }

    pub fn config(&self) -> &Arc<GatewayConfig> {
        &self.config
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub async fn dispatch(&self, request: ToolRequest) -> ToolResult {
        self.dispatch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// 취소 토큰과 함께 실행
    pub async fn dispatch_with_cancel(
        &self,
        request: ToolRequest,
        cancel: CancellationToken,
    ) -> ToolResult {
        let started = Instant::now();
        let ToolRequest {
            tool,
            args,
            principal,
        } = request;

        debug!(tool = %tool, principal = %principal, "Dispatch received");

        let entry = AuditEntry::new(&principal, &tool).with_args(&args);
        let outcome = self.run(&tool, &principal, args, cancel).await;

        self.finish(entry, outcome, started).await
    }

    /// 외부 형식(JSON) 요청 실행
    ///
    /// 요청 자체가 잘못된 경우에도 감사 로그를 남긴다.
    pub async fn dispatch_value(&self, value: &Value) -> ToolResult {
        match ToolRequest::from_value(value) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                let started = Instant::now();
                let tool = value.get("tool").and_then(Value::as_str).unwrap_or_default();
                let mut args = value
                    .get("args")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                let principal = match args.remove(PRINCIPAL_ARG) {
                    Some(Value::String(p)) => p,
                    _ => String::new(),
                };

                let entry = AuditEntry::new(principal, tool).with_args(&args);
                let outcome = Outcome::rejected(DispatchStage::Received, e.into());
                self.finish(entry, outcome, started).await
            }
        }
    }

    async fn run(
        &self,
        tool_name: &str,
        principal: &str,
        args: Map<String, Value>,
        cancel: CancellationToken,
    ) -> Outcome {
        // Received → Validated
        if principal.trim().is_empty() {
            return Outcome::rejected(
                DispatchStage::Received,
                ToolResult::failure(ErrorKind::InvalidInput, "Principal must not be empty"),
            );
        }
        let Some(tool) = self.registry.get(tool_name) else {
            return Outcome::rejected(
                DispatchStage::Received,
                ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!("Unknown tool: {}", tool_name),
                ),
            );
        };
        debug!(tool = %tool_name, stage = DispatchStage::Validated.as_str(), "Stage");

        // Validated → Authorized
        let capability = tool.capability();
        if !self.permissions.check(principal, capability) {
            warn!(
                tool = %tool_name,
                principal = %principal,
                capability = %capability,
                "Permission denied"
            );
            return Outcome {
                result: ToolResult::failure(
                    ErrorKind::PermissionDenied,
                    format!(
                        "Principal '{}' lacks capability '{}' required by {}",
                        principal, capability, tool_name
                    ),
                ),
                stage: DispatchStage::Validated,
                audit: AuditResult::Denied,
            };
        }
        debug!(tool = %tool_name, stage = DispatchStage::Authorized.as_str(), "Stage");

        let args = match tool.schema().validate(args) {
            Ok(args) => args,
            Err(e) => return Outcome::rejected(DispatchStage::Authorized, e.into()),
        };

        // Authorized → Executing
        debug!(tool = %tool_name, stage = DispatchStage::Executing.as_str(), "Stage");
        let ctx = ToolContext::new(
            principal,
            Arc::clone(&self.paths),
            Arc::clone(&self.history),
            Arc::clone(&self.config),
        )
        .with_cancel(cancel);

        match AssertUnwindSafe(tool.execute(args, &ctx)).catch_unwind().await {
            Ok(Ok(result)) => Outcome::executed(result),
            Ok(Err(e)) => Outcome::executed(e.into()),
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                warn!(tool = %tool_name, panic = %detail, "Tool panicked");
                Outcome::executed(ToolResult::failure(
                    ErrorKind::ExecutionError,
                    format!("Tool {} panicked: {}", tool_name, detail),
                ))
            }
        }
    }

    /// 감사 기록 후 결과 반환
    async fn finish(&self, entry: AuditEntry, outcome: Outcome, started: Instant) -> ToolResult {
        let duration_ms = started.elapsed().as_millis() as u64;
        let Outcome {
            result,
            stage,
            audit,
        } = outcome;

        let mut entry = entry.with_duration(duration_ms);
        if let (Some(kind), Some(message)) = (result.error_kind(), result.message()) {
            entry = entry.with_failure(audit, stage, kind, message);
        }

        debug!(
            tool = %entry.tool,
            principal = %entry.principal,
            stage = stage.as_str(),
            duration_ms,
            "Dispatch finished"
        );

        if let Err(e) = self.audit.record(entry).await {
            warn!(error = %e, "Failed to record audit entry");
        }
        result
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// 등록된 도구 (이름, 설명, capability)
    pub fn list_available_tools(&self) -> Vec<ToolInfo> {
        self.registry.list()
    }

    pub fn tool_schemas(&self) -> Vec<Value> {
        self.registry.schemas()
    }

    /// 호출 이력 조회 (최신순)
    pub async fn call_history(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        self.audit.query(query).await
    }

    pub async fn clear_call_history(&self) -> Result<()> {
        self.audit.clear().await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
