//! Storage module for toolgate
//!
//! - `json`: JSON - 설정/권한 테이블 파일 저장/로드
//!
//! 감사 로그의 SQLite 저장은 `audit` 모듈이, 스냅샷 저장은 core의 `history`가 소유한다.

pub(crate) mod json;

pub use json::JsonStore;
