//! 도메인 계층
//!
//! 리포지토리가 저장하는 레코드의 공통 계약을 정의합니다.

pub mod entity;

pub use entity::Entity;
