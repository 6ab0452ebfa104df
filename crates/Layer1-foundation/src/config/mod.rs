//! Config - 통합 설정 관리
//!
//! - `gateway.rs` - GatewayConfig (sandbox, permissions, command, http, history, audit)
//! - `loader.rs` - global/project/local 레이어 병합

mod gateway;
mod loader;

pub use gateway::{
    default_protected_dirs, AuditConfig, CommandConfig, GatewayConfig, HistoryConfig,
    HttpConfig, SandboxConfig,
};
pub use loader::{load_config_from_file, merge_values, ConfigLoader};

impl GatewayConfig {
    /// 기본 검색 경로에서 로드
    pub fn load(working_dir: &std::path::Path) -> crate::Result<Self> {
        ConfigLoader::new(working_dir).load_all()
    }

    /// 지정 파일에서 로드
    pub fn load_from(path: &std::path::Path) -> crate::Result<Self> {
        load_config_from_file(path)
    }
}
