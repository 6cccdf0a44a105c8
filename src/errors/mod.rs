//! 에러 처리 모듈
//!
//! - [`errors`] - [`RepositoryError`] 정의와 중복 키 판별 로직

pub mod errors;

pub use errors::*;
