//! Configuration Loader
//!
//! ## 검색 우선순위
//!
//! 1. 내장 기본값
//! 2. Global: `<config_dir>/toolgate/config.{toml,json}`
//! 3. Project: `<working_dir>/.toolgate/config.{toml,json}`
//! 4. Local (gitignored): `<working_dir>/.toolgate/config.local.{toml,json}`
//!
//! 각 레벨은 이전 레벨을 섹션/필드 단위로 오버라이드한다.
//! 잘못된 파일은 조용히 건너뛰지 않고 `Error::Config`로 실패한다.

use super::gateway::GatewayConfig;
use crate::storage::json::{APP_DIR, PROJECT_DIR};
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EXTENSIONS: [&str; 2] = ["toml", "json"];

// ============================================================================
// ConfigLoader
// ============================================================================

/// 설정 파일 경로 정보
#[derive(Debug, Clone)]
struct ConfigPath {
    /// 확장자 없는 경로 (`.../config`)
    stem: PathBuf,
    /// 우선순위 (높을수록 우선)
    priority: u8,
    description: &'static str,
}

impl ConfigPath {
    /// `stem` 뒤에 확장자를 붙인 경로 (`config.local` → `config.local.toml`)
    fn file(&self, ext: &str) -> PathBuf {
        let mut name = self.stem.clone().into_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}

/// 설정 로더
pub struct ConfigLoader {
    search_paths: Vec<ConfigPath>,
}

impl ConfigLoader {
    /// 기본 검색 경로로 생성
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(ConfigPath {
                stem: config_dir.join(APP_DIR).join("config"),
                priority: 10,
                description: "Global config",
            });
        }

        paths.push(ConfigPath {
            stem: working_dir.join(PROJECT_DIR).join("config"),
            priority: 20,
            description: "Project config",
        });

        paths.push(ConfigPath {
            stem: working_dir.join(PROJECT_DIR).join("config.local"),
            priority: 30,
            description: "Local config",
        });

        paths.sort_by_key(|p| p.priority);
        Self {
            search_paths: paths,
        }
    }

    /// 존재하는 설정 파일 목록 (우선순위 순)
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .flat_map(|p| {
                EXTENSIONS
                    .iter()
                    .map(move |ext| p.file(ext))
            })
            .filter(|p| p.is_file())
            .collect()
    }

    /// 모든 경로에서 설정 로드하여 병합
    pub fn load_all(&self) -> Result<GatewayConfig> {
        let mut merged = serde_json::to_value(GatewayConfig::default())?;

        for config_path in &self.search_paths {
            for ext in EXTENSIONS {
                let path = config_path.file(ext);
                if !path.is_file() {
                    continue;
                }
                let layer = read_value(&path)?;
                info!(path = %path.display(), "Loaded {}", config_path.description);
                merge_values(&mut merged, layer);
            }
        }

        finish(merged, "merged config")
    }
}

// ============================================================================
// 유틸리티 함수
// ============================================================================

/// 파일 하나에서 설정 로드 (기본값 위에 덮어씀)
pub fn load_config_from_file(path: &Path) -> Result<GatewayConfig> {
    let mut merged = serde_json::to_value(GatewayConfig::default())?;
    merge_values(&mut merged, read_value(path)?);
    finish(merged, &path.display().to_string())
}

/// 확장자에 따라 TOML/JSON 파싱
fn read_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str::<Value>(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML at {}: {}", path.display(), e)))?,
        _ => serde_json::from_str::<Value>(&content)
            .map_err(|e| Error::Config(format!("Invalid JSON at {}: {}", path.display(), e)))?,
    };

    debug!(path = %path.display(), "Parsed config layer");
    Ok(value)
}

fn finish(value: Value, source: &str) -> Result<GatewayConfig> {
    serde_json::from_value(value)
        .map_err(|e| Error::Config(format!("Invalid settings in {}: {}", source, e)))
}

/// later가 earlier를 오버라이드하는 deep merge
///
/// `permissions` 테이블은 principal 단위로 교체된다 (capability 목록은 합치지 않음).
pub fn merge_values(earlier: &mut Value, later: Value) {
    match (earlier, later) {
        (Value::Object(base), Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => {
                        merge_values(slot, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Capability;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_merge_values() {
        let mut base = json!({ "command": { "defaultTimeoutSecs": 60, "maxTimeoutSecs": 600 } });
        merge_values(&mut base, json!({ "command": { "maxTimeoutSecs": 10 } }));
        assert_eq!(base["command"]["defaultTimeoutSecs"], 60);
        assert_eq!(base["command"]["maxTimeoutSecs"], 10);
    }

    #[test]
    fn test_project_and_local_layers() {
        let dir = tempdir().unwrap();
        let cfg_dir = dir.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&cfg_dir).unwrap();

        std::fs::write(
            cfg_dir.join("config.toml"),
            r#"
[http]
allowPrivateNetworks = true

[permissions]
bot = ["read:file"]
"#,
        )
        .unwrap();
        std::fs::write(
            cfg_dir.join("config.local.json"),
            r#"{ "permissions": { "bot": ["read:file", "execute:command"] } }"#,
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path()).load_all().unwrap();
        assert!(config.http.allow_private_networks);
        assert_eq!(config.http.default_timeout_secs, 30);

        let bot = config.permissions.get("bot").unwrap();
        assert!(bot.contains(&Capability::ExecuteCommand));
        // 기본 principal도 유지
        assert!(config.permissions.get("admin").is_some());
    }

    #[test]
    fn test_local_layer_file_names() {
        let dir = tempdir().unwrap();
        let cfg_dir = dir.path().join(PROJECT_DIR);
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.local.toml"), "[http]\nmaxBodyBytes = 1024\n").unwrap();

        let loader = ConfigLoader::new(dir.path());
        let files = loader.existing_files();
        assert!(files.contains(&cfg_dir.join("config.local.toml")));
        assert!(!files.contains(&cfg_dir.join("config.toml")));
        assert_eq!(loader.load_all().unwrap().http.max_body_bytes, 1024);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(Error::Config(_))
        ));

        std::fs::write(&path, r#"{ "permissions": { "x": ["root:all"] } }"#).unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
