//! Tool Registry - 도구 등록 및 조회
//!
//! Runner는 요청의 `tool` 이름으로 여기서 handler를 찾는다.

use super::builtin;
use super::traits::Tool;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use toolgate_foundation::{Capability, GatewayConfig};
use tracing::debug;

/// 도구 요약 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub capability: Capability,
}

/// 도구 레지스트리
///
/// ## 사용법
/// ```ignore
/// let registry = ToolRegistry::with_builtins(&config);
///
/// if let Some(tool) = registry.get("FileRead") {
///     let result = tool.execute(args, &ctx).await?;
/// }
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Builtin 도구 6종을 포함한 레지스트리 생성
    pub fn with_builtins(config: &GatewayConfig) -> Self {
        let mut registry = Self::new();
        for tool in builtin::all_tools(config) {
            registry.register(tool);
        }
        registry
    }

    /// 도구 등록 (같은 이름은 교체)
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!(tool = %name, "Tool registered");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 모든 도구 이름 (정렬)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 도구 목록 (이름순)
    pub fn list(&self) -> Vec<ToolInfo> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                capability: tool.capability(),
            })
            .collect()
    }

    /// JSON Schema 형식으로 모든 도구 정보 반환 (이름순)
    pub fn schemas(&self) -> Vec<Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "capability": tool.capability().as_str(),
                    "input_schema": tool.schema().to_json_schema(),
                })
            })
            .collect()
    }
}
