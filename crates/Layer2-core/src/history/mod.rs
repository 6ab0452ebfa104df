//! History - 파일 버전 관리
//!
//! FileWrite/FileDelete가 파일을 바꾸기 직전 내용을 스냅샷으로 남기고,
//! 목록/비교/복원을 제공한다.
//!
//! - `types`: VersionRecord, VersionDiff
//! - `lock`: 경로별 비동기 잠금
//! - `store`: VersionStore

mod lock;
mod store;
mod types;

pub use lock::PathLocks;
pub use store::VersionStore;
pub use types::{VersionDiff, VersionRecord};
