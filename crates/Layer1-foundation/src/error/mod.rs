//! Error types for toolgate
//!
//! 모든 에러를 중앙에서 관리하고, 호출자에게 노출되는 8개의 에러 코드(`ErrorKind`)로 매핑

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// ErrorKind - 외부 에러 코드
// ============================================================================

/// 호출자가 분기할 수 있는 평탄한 에러 코드
///
/// `message`는 사람을 위한 것이고, 프로그램은 이 코드만 보고 판단한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    PermissionDenied,
    NotFound,
    InvalidInput,
    AlreadyExists,
    Timeout,
    ExecutionError,
    NetworkError,
    IoError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::PermissionDenied,
        ErrorKind::NotFound,
        ErrorKind::InvalidInput,
        ErrorKind::AlreadyExists,
        ErrorKind::Timeout,
        ErrorKind::ExecutionError,
        ErrorKind::NetworkError,
        ErrorKind::IoError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ExecutionError => "EXECUTION_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::IoError => "IO_ERROR",
        }
    }

    /// 문자열 코드 파싱 (정확히 일치해야 함)
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == code)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Error
// ============================================================================

/// toolgate 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 입력 검증
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 파일/리소스 상태
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 네트워크
    // ========================================================================
    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// 외부 에러 코드로 매핑
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) | Error::Config(_) => ErrorKind::InvalidInput,
            Error::Http(_) => ErrorKind::NetworkError,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorKind::NotFound,
                std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
                _ => ErrorKind::IoError,
            },
            // 직렬화 실패는 저장 매체가 아니라 실행 쪽 결함
            Error::Json(_) => ErrorKind::ExecutionError,
            Error::Sqlite(_) | Error::Storage(_) => ErrorKind::IoError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(ErrorKind::PermissionDenied.as_str(), "PERMISSION_DENIED");
        assert_eq!(ErrorKind::IoError.as_str(), "IO_ERROR");
        assert_eq!(
            serde_json::to_value(ErrorKind::AlreadyExists).unwrap(),
            serde_json::json!("ALREADY_EXISTS")
        );
        assert_eq!(ErrorKind::parse("TIMEOUT"), Some(ErrorKind::Timeout));
        assert_eq!(ErrorKind::parse("timeout"), None);
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::Config("bad".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::Http("refused".into()).kind(), ErrorKind::NetworkError);
        assert_eq!(Error::Storage("full".into()).kind(), ErrorKind::IoError);

        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }
}
