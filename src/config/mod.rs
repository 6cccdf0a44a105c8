//! # Configuration Module
//!
//! 리포지토리 계층의 설정 관리를 담당하는 모듈입니다.
//! 모든 설정값은 환경 변수(또는 프로필별 `.env` 파일)에서 읽어옵니다.
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! export PROFILE="dev"                          # .env.dev 로드
//! export MONGODB_URI="mongodb://localhost:27017"
//! export DATABASE_NAME="repository_dev"
//! export AUTO_INDEX="true"
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use mongo_repository::config::{load_env_file, DatabaseConfig};
//!
//! load_env_file();
//! let uri = DatabaseConfig::uri();
//! ```

pub mod data_config;

pub use data_config::*;
