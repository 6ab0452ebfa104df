//! Tool Security - 경로 보안 검증
//!
//! 모든 경로 인자는 handler가 I/O를 하기 전에 `PathGuard`를 거친다.
//!
//! ## 기능
//! - 심볼릭 링크를 끝까지 따라간 canonical 경로 계산 (존재하지 않는 꼬리 포함)
//! - 보호 디렉토리 차단 (component 단위 비교)
//! - jail root 밖 경로 차단
//! - 루트 / jail root 자체 삭제 차단

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};
use toolgate_foundation::{Error, Result, SandboxConfig};

/// 심볼릭 링크 최대 추적 횟수 (Linux MAXSYMLINKS)
const MAX_SYMLINK_HOPS: usize = 40;

/// 경로 사용 목적
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIntent {
    Read,
    Write,
    Delete,
    List,
}

impl PathIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathIntent::Read => "read",
            PathIntent::Write => "write",
            PathIntent::Delete => "delete",
            PathIntent::List => "list",
        }
    }
}

/// 경로 검증 실패 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathViolation {
    /// 빈 경로
    Empty,

    /// 보호 디렉토리 내부
    Protected { path: PathBuf, protected: PathBuf },

    /// jail root 밖
    OutsideJail { path: PathBuf },

    /// 루트 또는 jail root 자체 삭제
    RootRemoval { path: PathBuf },

    /// 심볼릭 링크 루프 등으로 해석 불가
    Unresolvable { path: PathBuf },
}

impl PathViolation {
    pub fn message(&self) -> String {
        match self {
            PathViolation::Empty => "Path must not be empty".to_string(),
            PathViolation::Protected { path, protected } => format!(
                "Path '{}' is inside protected directory '{}'",
                path.display(),
                protected.display()
            ),
            PathViolation::OutsideJail { path } => {
                format!("Path '{}' is outside the allowed roots", path.display())
            }
            PathViolation::RootRemoval { path } => {
                format!("Refusing to delete root directory '{}'", path.display())
            }
            PathViolation::Unresolvable { path } => {
                format!("Cannot resolve path '{}'", path.display())
            }
        }
    }
}

impl From<PathViolation> for Error {
    fn from(v: PathViolation) -> Self {
        Error::InvalidInput(v.message())
    }
}

// ============================================================================
// PathGuard
// ============================================================================

/// 경로 검증기
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// 상대 경로 기준 (canonical)
    working_dir: PathBuf,

    /// 보호 디렉토리 (원본 + canonical)
    protected: Vec<PathBuf>,

    /// 허용 루트 (canonical, 비어 있으면 제한 없음)
    jail_roots: Vec<PathBuf>,
}

impl PathGuard {
    /// 보호 디렉토리 없이 생성
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let working_dir = resolve(&absolutize(&working_dir), true).unwrap_or(working_dir);
        Self {
            working_dir,
            protected: Vec::new(),
            jail_roots: Vec::new(),
        }
    }

    /// 설정으로 생성
    pub fn from_config(config: &SandboxConfig) -> Self {
        let guard = Self::new(config.resolved_working_dir());
        let guard = config
            .protected_dirs
            .iter()
            .fold(guard, |g, dir| g.with_protected_dir(dir));
        config
            .jail_roots
            .iter()
            .fold(guard, |g, root| g.with_jail_root(root))
    }

    /// 보호 디렉토리 추가
    pub fn with_protected_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if !dir.is_absolute() {
            return self;
        }
        self.protected.push(dir.to_path_buf());
        if let Ok(canonical) = resolve(dir, true) {
            if canonical != dir {
                self.protected.push(canonical);
            }
        }
        self
    }

    /// jail root 추가
    pub fn with_jail_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = absolutize_from(&self.working_dir, root.as_ref());
        let canonical = resolve(&root, true).unwrap_or(root);
        self.jail_roots.push(canonical);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// 경로 검증 후 canonical 경로 반환
    ///
    /// `Delete`는 마지막 component가 심볼릭 링크여도 따라가지 않는다
    /// (링크 자체를 지움).
    pub fn validate(&self, raw: &str, intent: PathIntent) -> Result<PathBuf> {
        self.check(raw, intent).map_err(Error::from)
    }

    /// `validate`와 같지만 실패 사유를 그대로 반환
    pub fn check(&self, raw: &str, intent: PathIntent) -> std::result::Result<PathBuf, PathViolation> {
        if raw.trim().is_empty() {
            return Err(PathViolation::Empty);
        }

        let absolute = absolutize_from(&self.working_dir, Path::new(raw));
        let canonical = resolve(&absolute, intent != PathIntent::Delete)?;

        // 보호 디렉토리: canonical 경로와 lexical 경로 모두 비교
        let lexical = normalize_lexically(&absolute);
        for protected in &self.protected {
            if canonical.starts_with(protected) || lexical.starts_with(protected) {
                return Err(PathViolation::Protected {
                    path: canonical,
                    protected: protected.clone(),
                });
            }
        }

        if !self.jail_roots.is_empty()
            && !self.jail_roots.iter().any(|root| canonical.starts_with(root))
        {
            return Err(PathViolation::OutsideJail { path: canonical });
        }

        if intent == PathIntent::Delete
            && (canonical.parent().is_none() || self.jail_roots.contains(&canonical))
        {
            return Err(PathViolation::RootRemoval { path: canonical });
        }

        Ok(canonical)
    }
}

// ============================================================================
// 경로 해석
// ============================================================================

fn absolutize(path: &Path) -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => absolutize_from(&cwd, path),
        Err(_) => path.to_path_buf(),
    }
}

fn absolutize_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// 루트 부분과 나머지 component 분리
fn split_components(path: &Path) -> (Option<PathBuf>, Vec<OsString>) {
    let mut root: Option<PathBuf> = None;
    let mut parts = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                root.get_or_insert_with(PathBuf::new)
                    .push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => parts.push(OsString::from("..")),
            Component::Normal(name) => parts.push(name.to_os_string()),
        }
    }

    (root, parts)
}

/// 심볼릭 링크를 따라가며 절대 경로를 해석
///
/// 존재하지 않는 component는 그대로 붙이고, `..`는 그 시점까지 해석된
/// 실제 경로 기준으로 처리한다. 끊어진 링크도 대상 경로를 따라간다.
fn resolve(path: &Path, follow_final: bool) -> std::result::Result<PathBuf, PathViolation> {
    let unresolvable = || PathViolation::Unresolvable {
        path: path.to_path_buf(),
    };

    let (root, parts) = split_components(path);
    let mut resolved = root.ok_or_else(unresolvable)?;
    let mut pending: VecDeque<OsString> = parts.into();
    let mut hops = 0;

    while let Some(part) = pending.pop_front() {
        if part.as_os_str() == OsStr::new("..") {
            resolved.pop();
            continue;
        }

        let candidate = resolved.join(&part);
        let is_link = fs::symlink_metadata(&candidate)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        if is_link && (follow_final || !pending.is_empty()) {
            hops += 1;
            if hops > MAX_SYMLINK_HOPS {
                return Err(unresolvable());
            }
            let target = fs::read_link(&candidate).map_err(|_| unresolvable())?;
            let (target_root, target_parts) = split_components(&target);
            if let Some(target_root) = target_root {
                resolved = target_root;
            }
            for p in target_parts.into_iter().rev() {
                pending.push_front(p);
            }
            continue;
        }

        resolved.push(part);
    }

    Ok(resolved)
}

/// 파일시스템을 보지 않는 정규화
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard(dir: &TempDir) -> PathGuard {
        PathGuard::new(dir.path())
    }

    #[test]
    fn test_relative_path_resolves_against_working_dir() {
        let dir = TempDir::new().unwrap();
        let g = guard(&dir);
        let p = g.validate("sub/../a.txt", PathIntent::Write).unwrap();
        assert_eq!(p, g.working_dir().join("a.txt"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let dir = TempDir::new().unwrap();
        assert_eq!(guard(&dir).check("  ", PathIntent::Read), Err(PathViolation::Empty));
    }

    #[test]
    fn test_protected_dir_every_intent() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("secret");
        fs::create_dir(&secret).unwrap();
        let g = guard(&dir).with_protected_dir(&secret);

        for intent in [
            PathIntent::Read,
            PathIntent::Write,
            PathIntent::Delete,
            PathIntent::List,
        ] {
            let err = g.check("secret/x", intent).unwrap_err();
            assert!(matches!(err, PathViolation::Protected { .. }), "{:?}", intent);
            assert!(g.check("secret", intent).is_err());
            // 상위 디렉토리 경유
            assert!(g.check("other/../secret/x", intent).is_err());
        }
    }

    #[test]
    fn test_component_comparison() {
        let dir = TempDir::new().unwrap();
        let g = guard(&dir).with_protected_dir(dir.path().join("etc"));
        assert!(g.check("etcetera/file", PathIntent::Read).is_ok());
        assert!(g.check("etc/file", PathIntent::Read).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_default_protected_dirs() {
        let dir = TempDir::new().unwrap();
        let config = SandboxConfig {
            working_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let g = PathGuard::from_config(&config);
        assert!(g.check("/etc/passwd", PathIntent::Read).is_err());
        assert!(g.check("/usr/bin/../../etc/hosts", PathIntent::Read).is_err());
        assert!(g.check("../../../../../../../../etc/shadow", PathIntent::Read).is_err());
    }

    #[test]
    fn test_jail_root() {
        let dir = TempDir::new().unwrap();
        let jail = dir.path().join("jail");
        fs::create_dir(&jail).unwrap();
        let g = PathGuard::new(&jail).with_jail_root(&jail);

        assert!(g.check("inside.txt", PathIntent::Write).is_ok());
        let err = g.check("../outside.txt", PathIntent::Write).unwrap_err();
        assert!(matches!(err, PathViolation::OutsideJail { .. }));
        // jail root 자체 삭제 금지
        let err = g.check(".", PathIntent::Delete).unwrap_err();
        assert!(matches!(err, PathViolation::RootRemoval { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_root_removal() {
        let dir = TempDir::new().unwrap();
        let err = guard(&dir).check("/", PathIntent::Delete).unwrap_err();
        assert!(matches!(err, PathViolation::RootRemoval { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_blocked() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let jail = dir.path().join("jail");
        fs::create_dir(&jail).unwrap();
        std::os::unix::fs::symlink(outside.path(), jail.join("link")).unwrap();

        let g = PathGuard::new(&jail).with_jail_root(&jail);
        let err = g.check("link/file.txt", PathIntent::Write).unwrap_err();
        assert!(matches!(err, PathViolation::OutsideJail { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_followed() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("secret");
        fs::create_dir(&secret).unwrap();
        std::os::unix::fs::symlink(secret.join("missing"), dir.path().join("dangling")).unwrap();

        let g = guard(&dir).with_protected_dir(&secret);
        assert!(g.check("dangling", PathIntent::Write).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_does_not_follow_final_link() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

        let g = guard(&dir);
        let deleted = g.check("link", PathIntent::Delete).unwrap();
        assert_eq!(deleted, g.working_dir().join("link"));
        let read = g.check("link", PathIntent::Read).unwrap();
        assert_eq!(read, g.working_dir().join("target.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_unresolvable() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("b"), dir.path().join("a")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("b")).unwrap();

        let err = guard(&dir).check("a", PathIntent::Read).unwrap_err();
        assert!(matches!(err, PathViolation::Unresolvable { .. }));
    }
}
