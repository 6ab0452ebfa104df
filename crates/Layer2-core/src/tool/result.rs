//! ToolResult - 도구 실행 결과
//!
//! 외부 형식:
//! - 성공: `{ "success": true, "output": { ... } }`
//! - 실패: `{ "success": false, "error": { "error_code", "message", "details"? } }`

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use toolgate_foundation::{Error, ErrorKind};

/// 도구 실행 결과
///
/// `Failure`는 절대로 부분 출력을 담지 않는다.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success {
        output: Map<String, Value>,
    },
    Failure {
        error_kind: ErrorKind,
        message: String,
        details: Option<Map<String, Value>>,
    },
}

impl ToolResult {
    /// 성공 결과 (객체가 아니면 `{"result": value}`로 감쌈)
    pub fn success(output: Value) -> Self {
        let output = match output {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        ToolResult::Success { output }
    }

    /// 실패 결과
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        ToolResult::Failure {
            error_kind: kind,
            message: message.into(),
            details: None,
        }
    }

    /// 실패 상세 추가 (성공 결과에는 영향 없음)
    pub fn with_details(self, details: Value) -> Self {
        match self {
            ToolResult::Failure {
                error_kind,
                message,
                ..
            } => ToolResult::Failure {
                error_kind,
                message,
                details: details.as_object().cloned(),
            },
            success => success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }

    pub fn output(&self) -> Option<&Map<String, Value>> {
        match self {
            ToolResult::Success { output } => Some(output),
            ToolResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { error_kind, .. } => Some(*error_kind),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ToolResult::Success { .. } => None,
            ToolResult::Failure { message, .. } => Some(message),
        }
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        match self {
            ToolResult::Failure { details, .. } => details.as_ref(),
            ToolResult::Success { .. } => None,
        }
    }

    /// 외부 형식 JSON
    pub fn to_value(&self) -> Value {
        match self {
            ToolResult::Success { output } => serde_json::json!({
                "success": true,
                "output": output,
            }),
            ToolResult::Failure {
                error_kind,
                message,
                details,
            } => {
                let mut error = Map::new();
                error.insert("error_code".into(), Value::from(error_kind.as_str()));
                error.insert("message".into(), Value::from(message.as_str()));
                if let Some(details) = details {
                    error.insert("details".into(), Value::Object(details.clone()));
                }
                serde_json::json!({
                    "success": false,
                    "error": error,
                })
            }
        }
    }
}

impl From<Error> for ToolResult {
    fn from(err: Error) -> Self {
        ToolResult::failure(err.kind(), err.to_string())
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let result = ToolResult::success(json!({ "path": "a.txt" }));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "success": true, "output": { "path": "a.txt" } })
        );
    }

    #[test]
    fn test_failure_shape() {
        let result = ToolResult::failure(ErrorKind::Timeout, "too slow")
            .with_details(json!({ "cancelled": false }));
        assert_eq!(
            result.to_value(),
            json!({
                "success": false,
                "error": {
                    "error_code": "TIMEOUT",
                    "message": "too slow",
                    "details": { "cancelled": false }
                }
            })
        );
        assert!(result.output().is_none());
    }

    #[test]
    fn test_from_error() {
        let result: ToolResult = Error::NotFound("x".into()).into();
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
        assert!(result.details().is_none());
    }

    #[test]
    fn test_non_object_output_is_wrapped() {
        let result = ToolResult::success(json!(42));
        assert_eq!(result.output().unwrap()["result"], 42);
    }
}
