//! Security - 명령어 안전 정책
//!
//! ExecuteCommand가 프로세스를 띄우기 전에 확인한다.
//! - 금지 패턴 (exact / contains / regex)
//! - 차단 프로그램 (argv[0]의 basename 기준)

use regex::Regex;
use tracing::warn;

// ============================================================
// 금지 패턴
// ============================================================

/// 패턴 종류
#[derive(Debug, Clone)]
pub enum PatternType {
    Exact(String),
    Contains(String),
    Regex(Regex),
}

/// 금지 패턴 정의
#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub pattern: PatternType,
    pub reason: String,
}

impl ForbiddenPattern {
    pub fn exact(exact: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Exact(exact.into()),
            reason: reason.into(),
        }
    }

    pub fn contains(substring: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pattern: PatternType::Contains(substring.into()),
            reason: reason.into(),
        }
    }

    /// 정규식 패턴 (컴파일 실패 시 None)
    pub fn regex(pattern: &str, reason: impl Into<String>) -> Option<Self> {
        Regex::new(pattern).ok().map(|re| Self {
            pattern: PatternType::Regex(re),
            reason: reason.into(),
        })
    }

    /// 명령어가 이 패턴에 매칭되는지 확인
    pub fn matches(&self, command: &str) -> bool {
        match &self.pattern {
            PatternType::Exact(s) => command.trim() == s,
            PatternType::Contains(s) => command.contains(s.as_str()),
            PatternType::Regex(re) => re.is_match(command),
        }
    }
}

/// 기본 금지 패턴
pub fn forbidden_patterns() -> Vec<ForbiddenPattern> {
    let mut patterns = vec![
        // 시스템 파괴
        ForbiddenPattern::exact("rm -rf /", "Root filesystem deletion"),
        ForbiddenPattern::exact("rm -rf /*", "Root filesystem deletion"),
        ForbiddenPattern::exact("rm -fr /", "Root filesystem deletion"),
        // Fork bomb
        ForbiddenPattern::contains(":(){ :|:& };:", "Fork bomb"),
        // 네트워크 악용
        ForbiddenPattern::contains("/dev/tcp/", "Network device access"),
        // 히스토리 삭제
        ForbiddenPattern::exact("history -c", "History clear"),
        // 프로세스 무차별 종료
        ForbiddenPattern::contains("killall -9", "Mass process kill"),
        ForbiddenPattern::contains("pkill -9", "Mass process kill"),
    ];

    let regexes = [
        (r"rm\s+(-[rf]+\s+)+/\s*$", "Root filesystem deletion"),
        (r"rm\s+(-[rf]+\s+)+/\*", "Root filesystem deletion"),
        (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "Fork bomb"),
        (r"dd\s+if=.*of=/dev/[sh]d[a-z]", "Disk overwrite"),
        (r"mkfs\.", "Filesystem format"),
        (r"chmod\s+(-R\s+)?777\s+/\s*$", "Dangerous permission change"),
        (r"rm\s+.*\.bash_history", "History deletion"),
        (r"^\s*(insmod|modprobe|rmmod)\s+", "Kernel module loading"),
    ];
    patterns.extend(
        regexes
            .iter()
            .filter_map(|(re, reason)| ForbiddenPattern::regex(re, *reason)),
    );

    patterns
}

/// 기본 차단 프로그램
pub fn blocked_programs() -> Vec<String> {
    ["shutdown", "reboot", "halt", "poweroff", "mkfs", "fdisk", "format"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ============================================================
// CommandPolicy
// ============================================================

/// 명령어 안전 정책
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    forbidden: Vec<ForbiddenPattern>,
    blocked_programs: Vec<String>,
}

impl CommandPolicy {
    /// 기본 정책
    pub fn new() -> Self {
        Self {
            forbidden: forbidden_patterns(),
            blocked_programs: blocked_programs(),
        }
    }

    /// 아무것도 막지 않는 정책
    pub fn permissive() -> Self {
        Self {
            forbidden: Vec::new(),
            blocked_programs: Vec::new(),
        }
    }

    /// 설정값으로 생성
    pub fn from_settings(enforce_patterns: bool, blocked: Vec<String>) -> Self {
        Self {
            forbidden: if enforce_patterns {
                forbidden_patterns()
            } else {
                Vec::new()
            },
            blocked_programs: blocked,
        }
    }

    pub fn with_blocked_program(mut self, program: impl Into<String>) -> Self {
        self.blocked_programs.push(program.into());
        self
    }

    /// 명령어 검사
    ///
    /// 차단되면 사유를 `Err`로 반환한다.
    pub fn check(&self, command: &str, argv: &[String]) -> Result<(), String> {
        if let Some(program) = argv.first() {
            let base = std::path::Path::new(program)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(program);
            // mkfs.ext4 같은 변형도 차단
            let stem = base.split('.').next().unwrap_or(base);

            if self
                .blocked_programs
                .iter()
                .any(|b| b == base || b == stem)
            {
                warn!(program = %base, "Blocked program");
                return Err(format!("Program '{}' is blocked", base));
            }
        }

        if let Some(hit) = self.forbidden.iter().find(|p| p.matches(command)) {
            warn!(command = %command, reason = %hit.reason, "Forbidden command pattern");
            return Err(hit.reason.clone());
        }

        Ok(())
    }
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(cmd: &str) -> Vec<String> {
        cmd.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_forbidden_patterns() {
        let policy = CommandPolicy::new();
        for cmd in ["rm -rf /", "rm -rf /*", "dd if=/dev/zero of=/dev/sda", "modprobe evil"] {
            assert!(policy.check(cmd, &argv(cmd)).is_err(), "{cmd} should be blocked");
        }
    }

    #[test]
    fn test_blocked_programs() {
        let policy = CommandPolicy::new();
        assert!(policy.check("/sbin/shutdown now", &argv("/sbin/shutdown now")).is_err());
        assert!(policy.check("mkfs.ext4 /dev/x", &argv("mkfs.ext4 /dev/x")).is_err());
    }

    #[test]
    fn test_ordinary_commands_allowed() {
        let policy = CommandPolicy::new();
        for cmd in ["ls -la", "sleep 5", "cat README.md", "echo halting", "rm -rf ./build"] {
            assert!(policy.check(cmd, &argv(cmd)).is_ok(), "{cmd} should pass");
        }
    }

    #[test]
    fn test_permissive_and_custom() {
        let policy = CommandPolicy::permissive();
        assert!(policy.check("rm -rf /", &argv("rm -rf /")).is_ok());

        let policy = CommandPolicy::permissive().with_blocked_program("curl");
        assert!(policy.check("curl x", &argv("curl x")).is_err());
    }
}
