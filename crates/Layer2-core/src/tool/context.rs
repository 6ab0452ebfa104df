//! Tool Context - 도구 실행 컨텍스트
//!
//! Runner가 dispatch마다 만들어 handler에 넘긴다.
//! - principal (감사/스냅샷 기록용)
//! - PathGuard (경로 검증)
//! - VersionStore (스냅샷)
//! - GatewayConfig (타임아웃, 출력 제한 등)
//! - CancellationToken (호출자 취소)

use super::security::{PathGuard, PathIntent};
use crate::history::VersionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_foundation::{GatewayConfig, Result};

/// 도구 실행 컨텍스트
#[derive(Clone)]
pub struct ToolContext {
    pub principal: String,
    pub paths: Arc<PathGuard>,
    pub history: Arc<VersionStore>,
    pub config: Arc<GatewayConfig>,
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(
        principal: impl Into<String>,
        paths: Arc<PathGuard>,
        history: Arc<VersionStore>,
        config: Arc<GatewayConfig>,
    ) -> Self {
        Self {
            principal: principal.into(),
            paths,
            history,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 경로 검증 (PathGuard 위임)
    pub fn resolve_path(&self, raw: &str, intent: PathIntent) -> Result<PathBuf> {
        self.paths.validate(raw, intent)
    }

    /// 임시 디렉토리를 작업 디렉토리로 쓰는 테스트용 컨텍스트
    #[cfg(test)]
    pub(crate) fn for_test(dir: &std::path::Path, config: GatewayConfig) -> Self {
        let work = dir.join("work");
        std::fs::create_dir_all(&work).unwrap();
        Self::new(
            "admin",
            Arc::new(PathGuard::new(&work)),
            Arc::new(VersionStore::new(dir.join("history"))),
            Arc::new(config),
        )
    }
}
