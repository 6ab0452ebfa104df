//! 도구 인자 스키마와 검증
//!
//! 각 도구는 `ToolSchema`로 필드(필수/선택, 타입)를 선언하고,
//! Runner가 경계에서 한 번 검증한 뒤 `ToolArgs`를 넘긴다.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use toolgate_foundation::{Error, Result};

/// 인자 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Integer,
    Boolean,
    /// 값이 모두 문자열인 객체
    StringMap,
    /// null이 아닌 아무 값
    Any,
}

impl ArgKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Integer => value.is_i64() || value.is_u64(),
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::StringMap => value
                .as_object()
                .map(|m| m.values().all(Value::is_string))
                .unwrap_or(false),
            ArgKind::Any => !value.is_null(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
            ArgKind::Boolean => "boolean",
            ArgKind::StringMap => "object of strings",
            ArgKind::Any => "any",
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ArgKind::String => json!({ "type": "string" }),
            ArgKind::Integer => json!({ "type": "integer" }),
            ArgKind::Boolean => json!({ "type": "boolean" }),
            ArgKind::StringMap => {
                json!({ "type": "object", "additionalProperties": { "type": "string" } })
            }
            ArgKind::Any => json!({}),
        }
    }
}

/// 파라미터 정의
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
    pub description: &'static str,
}

// ============================================================================
// ToolSchema
// ============================================================================

/// 도구 인자 스키마
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn builder() -> ToolSchemaBuilder {
        ToolSchemaBuilder::default()
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// 인자 검증
    ///
    /// - 필수 필드 누락 / 타입 불일치 / 알 수 없는 필드 → `InvalidInput`
    /// - 선택 필드의 `null`은 없는 것으로 취급
    pub fn validate(&self, args: Map<String, Value>) -> Result<ToolArgs> {
        let mut values = Map::new();

        for (name, value) in args {
            let spec = self
                .param(&name)
                .ok_or_else(|| Error::InvalidInput(format!("Unknown argument: {}", name)))?;

            if value.is_null() && !spec.required {
                continue;
            }
            if !spec.kind.accepts(&value) {
                return Err(Error::InvalidInput(format!(
                    "Argument '{}' must be {}",
                    name,
                    spec.kind.name()
                )));
            }
            values.insert(name, value);
        }

        if let Some(missing) = self
            .params
            .iter()
            .find(|p| p.required && !values.contains_key(p.name))
        {
            return Err(Error::InvalidInput(format!(
                "Missing required argument: {}",
                missing.name
            )));
        }

        Ok(ToolArgs { values })
    }

    /// JSON Schema 형식
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = p.kind.json_schema();
            if let Some(obj) = prop.as_object_mut() {
                obj.insert("description".into(), Value::from(p.description));
            }
            properties.insert(p.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// ToolSchema 빌더
#[derive(Debug, Default)]
pub struct ToolSchemaBuilder {
    params: Vec<ParamSpec>,
}

impl ToolSchemaBuilder {
    pub fn param(
        mut self,
        name: &'static str,
        kind: ArgKind,
        description: &'static str,
        required: bool,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            kind,
            required,
            description,
        });
        self
    }

    /// Add a string parameter
    pub fn string_param(self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.param(name, ArgKind::String, description, required)
    }

    /// Add an integer parameter
    pub fn integer_param(self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.param(name, ArgKind::Integer, description, required)
    }

    /// Add a boolean parameter
    pub fn boolean_param(self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.param(name, ArgKind::Boolean, description, required)
    }

    /// Add a string → string map parameter
    pub fn string_map_param(self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.param(name, ArgKind::StringMap, description, required)
    }

    /// Add a parameter accepting any JSON value
    pub fn any_param(self, name: &'static str, description: &'static str, required: bool) -> Self {
        self.param(name, ArgKind::Any, description, required)
    }

    pub fn build(self) -> ToolSchema {
        ToolSchema {
            params: self.params,
        }
    }
}

// ============================================================================
// ToolArgs
// ============================================================================

/// 검증된 인자
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// 필수 문자열
    pub fn str(&self, name: &str) -> Result<&str> {
        self.opt_str(name)
            .ok_or_else(|| Error::InvalidInput(format!("Missing required argument: {}", name)))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// 양의 정수 (0 또는 음수는 `InvalidInput`)
    pub fn opt_positive(&self, name: &str) -> Result<Option<u64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => Ok(Some(n)),
                _ => Err(Error::InvalidInput(format!(
                    "Argument '{}' must be a positive integer",
                    name
                ))),
            },
        }
    }

    pub fn string_map(&self, name: &str) -> HashMap<String, String> {
        self.values
            .get(name)
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ToolSchema {
        ToolSchema::builder()
            .string_param("path", "File path", true)
            .boolean_param("overwrite", "Overwrite", false)
            .integer_param("timeout", "Seconds", false)
            .string_map_param("env", "Environment", false)
            .build()
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_args() {
        let parsed = schema()
            .validate(args(json!({ "path": "a", "overwrite": true, "env": { "A": "1" } })))
            .unwrap();
        assert_eq!(parsed.str("path").unwrap(), "a");
        assert!(parsed.bool_or("overwrite", false));
        assert_eq!(parsed.string_map("env")["A"], "1");
        assert_eq!(parsed.opt_positive("timeout").unwrap(), None);
    }

    #[test]
    fn test_missing_required() {
        let err = schema().validate(args(json!({}))).unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_wrong_type_and_unknown() {
        assert!(schema().validate(args(json!({ "path": 1 }))).is_err());
        assert!(schema()
            .validate(args(json!({ "path": "a", "timeout": 1.5 })))
            .is_err());
        assert!(schema()
            .validate(args(json!({ "path": "a", "env": { "A": 1 } })))
            .is_err());
        let err = schema()
            .validate(args(json!({ "path": "a", "bogus": 1 })))
            .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_null_optional_is_absent() {
        let parsed = schema()
            .validate(args(json!({ "path": "a", "overwrite": null })))
            .unwrap();
        assert!(parsed.get("overwrite").is_none());
        assert!(schema().validate(args(json!({ "path": null }))).is_err());
    }

    #[test]
    fn test_positive_integer() {
        let parsed = schema()
            .validate(args(json!({ "path": "a", "timeout": 0 })))
            .unwrap();
        assert!(parsed.opt_positive("timeout").is_err());
    }

    #[test]
    fn test_json_schema() {
        let s = schema().to_json_schema();
        assert_eq!(s["required"], json!(["path"]));
        assert_eq!(s["properties"]["timeout"]["type"], "integer");
    }
}
