//! Capability - 부작용 카테고리 하나를 여는 권한 이름
//!
//! 문자열 표현은 정확히 일치해야 하며 와일드카드 의미는 없다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 고정된 권한 집합
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "read:file")]
    ReadFile,
    #[serde(rename = "write:file")]
    WriteFile,
    #[serde(rename = "delete:file")]
    DeleteFile,
    #[serde(rename = "execute:command")]
    ExecuteCommand,
    #[serde(rename = "network:outbound")]
    NetworkOutbound,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::ReadFile,
        Capability::WriteFile,
        Capability::DeleteFile,
        Capability::ExecuteCommand,
        Capability::NetworkOutbound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadFile => "read:file",
            Capability::WriteFile => "write:file",
            Capability::DeleteFile => "delete:file",
            Capability::ExecuteCommand => "execute:command",
            Capability::NetworkOutbound => "network:outbound",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown capability: {}", s)))
    }
}
