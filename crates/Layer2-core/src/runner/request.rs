//! ToolRequest - 호출 요청

use serde_json::{Map, Value};
use toolgate_foundation::{Error, Result};

/// 외부 형식에서 principal을 담는 인자 이름
pub const PRINCIPAL_ARG: &str = "user_id";

/// 도구 호출 요청 (호출마다 생성, 저장되지 않음)
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool: String,
    pub args: Map<String, Value>,
    pub principal: String,
}

impl ToolRequest {
    pub fn new(
        tool: impl Into<String>,
        args: Map<String, Value>,
        principal: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            args,
            principal: principal.into(),
        }
    }

    /// `{ "tool": ..., "args": { "user_id": ..., ... } }` 형식 파싱
    ///
    /// `args.user_id`는 principal로 옮겨지고 args에서 제거된다.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("Request must be a JSON object".into()))?;

        let tool = object
            .get("tool")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("Request field 'tool' must be a string".into()))?;

        let mut args = match object.get("args") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(args)) => args.clone(),
            Some(_) => {
                return Err(Error::InvalidInput(
                    "Request field 'args' must be an object".into(),
                ));
            }
        };

        let principal = match args.remove(PRINCIPAL_ARG) {
            Some(Value::String(p)) if !p.trim().is_empty() => p,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "args.{} is required and must be a non-empty string",
                    PRINCIPAL_ARG
                )));
            }
        };

        Ok(Self::new(tool, args, principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let request = ToolRequest::from_value(&json!({
            "tool": "FileRead",
            "args": { "user_id": "admin", "path": "a.txt" }
        }))
        .unwrap();
        assert_eq!(request.tool, "FileRead");
        assert_eq!(request.principal, "admin");
        assert!(!request.args.contains_key("user_id"));
        assert_eq!(request.args["path"], "a.txt");
    }

    #[test]
    fn test_from_value_errors() {
        assert!(ToolRequest::from_value(&json!([])).is_err());
        assert!(ToolRequest::from_value(&json!({ "args": { "user_id": "a" } })).is_err());
        assert!(ToolRequest::from_value(&json!({ "tool": "FileRead", "args": [] })).is_err());
        assert!(ToolRequest::from_value(&json!({ "tool": "FileRead", "args": {} })).is_err());
        assert!(
            ToolRequest::from_value(&json!({ "tool": "FileRead", "args": { "user_id": 7 } }))
                .is_err()
        );
    }
}
