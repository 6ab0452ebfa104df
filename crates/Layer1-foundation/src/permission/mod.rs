//! Permission system for toolgate
//!
//! - `capability`: 고정된 권한 이름 (read:file, write:file, ...)
//! - `service`: 런타임 권한 관리 (PermissionManager)
//! - `settings`: JSON 저장/로드 (PermissionTable)
//! - `security`: 명령어 안전 정책 (CommandPolicy)
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use toolgate_foundation::permission::{Capability, PermissionManager};
//!
//! let manager = PermissionManager::new();
//! if manager.check("user", Capability::WriteFile) {
//!     // 실행
//! }
//!
//! manager.grant("user", Capability::DeleteFile);
//! ```

mod capability;
pub mod security;
mod service;
mod settings;

pub use capability::Capability;
pub use security::{CommandPolicy, ForbiddenPattern, PatternType};
pub use service::PermissionManager;
pub use settings::{PermissionTable, PERMISSIONS_FILE};
