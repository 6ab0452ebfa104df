//! Audit Log Types - 감사 로그 타입 정의
//!
//! dispatch 한 번마다 정확히 하나의 엔트리가 남는다.

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Audit Entry ID
// ============================================================================

/// 감사 로그 엔트리 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl AuditId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Dispatch Stage
// ============================================================================

/// dispatch 상태 머신
///
/// `Received → Validated → Authorized → Executing → Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStage {
    Received,
    Validated,
    Authorized,
    Executing,
    Completed,
    Failed,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStage::Received => "received",
            DispatchStage::Validated => "validated",
            DispatchStage::Authorized => "authorized",
            DispatchStage::Executing => "executing",
            DispatchStage::Completed => "completed",
            DispatchStage::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            DispatchStage::Received,
            DispatchStage::Validated,
            DispatchStage::Authorized,
            DispatchStage::Executing,
            DispatchStage::Completed,
            DispatchStage::Failed,
        ]
        .into_iter()
        .find(|stage| stage.as_str() == s)
    }
}

// ============================================================================
// Audit Result
// ============================================================================

/// 감사 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    /// 성공
    Success,
    /// 권한 거부
    Denied,
    /// 검증 실패 (알 수 없는 도구, 잘못된 인자)
    Rejected,
    /// 실행 실패
    Failure,
}

impl AuditResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Success => "success",
            AuditResult::Denied => "denied",
            AuditResult::Rejected => "rejected",
            AuditResult::Failure => "failure",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "success" => AuditResult::Success,
            "denied" => AuditResult::Denied,
            "rejected" => AuditResult::Rejected,
            _ => AuditResult::Failure,
        }
    }
}

// ============================================================================
// Audit Entry
// ============================================================================

/// 감사 로그 엔트리
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub timestamp: DateTime<Utc>,
    pub principal: String,
    pub tool: String,
    /// 민감 필드가 가려진 인자
    pub args: Value,
    pub result: AuditResult,
    /// 종료 시점의 상태
    pub stage: DispatchStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl AuditEntry {
    /// 새 엔트리 (성공/완료 상태로 시작)
    pub fn new(principal: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            id: AuditId::new(),
            timestamp: Utc::now(),
            principal: principal.into(),
            tool: tool.into(),
            args: Value::Object(Map::new()),
            result: AuditResult::Success,
            stage: DispatchStage::Completed,
            error_code: None,
            message: None,
            duration_ms: 0,
        }
    }

    /// 인자 설정 (민감 필드는 가려짐)
    pub fn with_args(mut self, args: &Map<String, Value>) -> Self {
        self.args = super::redact::redact_args(args);
        self
    }

    pub fn with_failure(
        mut self,
        result: AuditResult,
        stage: DispatchStage,
        code: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.result = result;
        self.stage = stage;
        self.error_code = Some(code);
        self.message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == AuditResult::Success
    }
}

// ============================================================================
// Audit Query
// ============================================================================

/// 호출 이력 조회 조건
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub principal: Option<String>,
    pub tool: Option<String>,
    /// 0이면 제한 없음
    pub limit: usize,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.principal
            .as_deref()
            .map_or(true, |p| entry.principal == p)
            && self.tool.as_deref().map_or(true, |t| entry.tool == t)
    }
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            principal: None,
            tool: None,
            limit: 50,
        }
    }
}
