//! GatewayConfig - 통합 설정
//!
//! 모든 섹션과 필드는 기본값을 가지므로 부분 설정 파일로도 로드된다.

use crate::permission::{security, CommandPolicy, PermissionTable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub sandbox: SandboxConfig,
    pub permissions: PermissionTable,
    pub command: CommandConfig,
    pub http: HttpConfig,
    pub history: HistoryConfig,
    pub audit: AuditConfig,
}

// ============================================================================
// Sandbox
// ============================================================================

/// 경로 샌드박스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    /// 상대 경로 기준 디렉토리 (None이면 프로세스 cwd)
    pub working_dir: Option<PathBuf>,

    /// 보호 디렉토리 (deny-list)
    pub protected_dirs: Vec<PathBuf>,

    /// 허용 루트 (비어있으면 제한 없음)
    pub jail_roots: Vec<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            protected_dirs: default_protected_dirs(),
            jail_roots: Vec::new(),
        }
    }
}

impl SandboxConfig {
    /// 실제 작업 디렉토리
    pub fn resolved_working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// 기본 보호 디렉토리
pub fn default_protected_dirs() -> Vec<PathBuf> {
    #[cfg(not(windows))]
    let dirs: &[&str] = &["/etc", "/usr", "/bin", "/sbin", "/System"];
    #[cfg(windows)]
    let dirs: &[&str] = &[
        "/etc",
        "/usr",
        "/bin",
        "/sbin",
        "/System",
        "C:\\Windows",
        "C:\\Program Files",
        "C:\\Program Files (x86)",
    ];

    dirs.iter().map(PathBuf::from).collect()
}

// ============================================================================
// Command
// ============================================================================

/// ExecuteCommand 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandConfig {
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
    /// stdout/stderr 각각의 최대 바이트
    pub max_output_bytes: usize,
    pub blocked_programs: Vec<String>,
    pub enforce_forbidden_patterns: bool,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 60,
            max_timeout_secs: 600,
            max_output_bytes: 1024 * 1024,
            blocked_programs: security::blocked_programs(),
            enforce_forbidden_patterns: true,
        }
    }
}

impl CommandConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// 요청된 타임아웃을 최대값으로 제한
    pub fn clamp_timeout(&self, secs: u64) -> Duration {
        Duration::from_secs(secs.min(self.max_timeout_secs))
    }

    pub fn policy(&self) -> CommandPolicy {
        CommandPolicy::from_settings(
            self.enforce_forbidden_patterns,
            self.blocked_programs.clone(),
        )
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// HttpRequest 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpConfig {
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
    pub max_body_bytes: usize,
    /// true면 anti-SSRF 검사를 끈다 (로컬 테스트용)
    pub allow_private_networks: bool,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            max_timeout_secs: 300,
            max_body_bytes: 10 * 1024 * 1024,
            allow_private_networks: false,
            user_agent: format!("toolgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn clamp_timeout(&self, secs: u64) -> Duration {
        Duration::from_secs(secs.min(self.max_timeout_secs))
    }
}

// ============================================================================
// History / Audit
// ============================================================================

/// 버전 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// 스냅샷 루트 (None이면 `<data_local_dir>/toolgate/history`)
    pub dir: Option<PathBuf>,
}

impl HistoryConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("toolgate")
                .join("history")
        })
    }
}

/// 감사 로그 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditConfig {
    /// SQLite 경로 (None이면 메모리만 사용)
    pub db_path: Option<PathBuf>,
    /// 메모리 링 최대 크기
    pub max_entries: usize,
    /// 최대 크기 초과 시 남길 개수
    pub retain_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            max_entries: 1000,
            retain_entries: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Capability;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config
            .sandbox
            .protected_dirs
            .contains(&PathBuf::from("/etc")));
        assert!(config.sandbox.jail_roots.is_empty());
        assert_eq!(config.command.default_timeout(), Duration::from_secs(60));
        assert_eq!(config.http.default_timeout(), Duration::from_secs(30));
        assert_eq!(config.audit.max_entries, 1000);
        assert!(config
            .permissions
            .get("admin")
            .unwrap()
            .contains(&Capability::NetworkOutbound));
    }

    #[test]
    fn test_partial_json() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{ "command": { "maxTimeoutSecs": 5 }, "permissions": { "bot": ["read:file"] } }"#,
        )
        .unwrap();

        assert_eq!(config.command.max_timeout_secs, 5);
        assert_eq!(config.command.default_timeout_secs, 60);
        assert_eq!(config.command.clamp_timeout(100), Duration::from_secs(5));
        // permissions 섹션은 통째로 교체된다
        assert!(config.permissions.get("admin").is_none());
        assert!(config.permissions.get("bot").is_some());
    }
}
