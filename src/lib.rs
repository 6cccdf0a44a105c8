//! MongoDB 제네릭 리포지토리
//!
//! 이름이 붙은 모델 핸들 하나에 바인딩되어 CRUD와 집계를 제공하는
//! 재사용 가능한 데이터 액세스 계층입니다.
//!
//! # Features
//!
//! - **제네릭 리포지토리**: 레코드 타입만 바꾸어 모든 컬렉션에 재사용
//! - **중복 키 변환**: 유니크 제약 위반을 필드 이름이 담긴 에러로 변환
//! - **스키마**: 컬렉션 이름, 유니크 인덱스, 기본값 선언
//! - **토큰 레지스트리**: `"<Name>Repository"` 토큰으로 리포지토리 주입
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  RepositoryModule   │ ← for_feature / for_feature_async
//! └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │   ServiceLocator    │ ← "<Name>Model", "<Name>Repository"
//! └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │ RepositoryService<T>│ ← 기본 옵션 병합, 중복 키 변환
//! └─────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │  Model (MongoModel) │ ← MongoDB 컬렉션
//! └─────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use mongo_repository::core::{RepositoryModule, RepositoryOptions, ServiceLocator, DATABASE_CONNECTION};
//! use mongo_repository::db::{Database, Schema};
//!
//! let locator = ServiceLocator::global();
//! locator.set(DATABASE_CONNECTION, Arc::new(Database::new().await?));
//!
//! let users = RepositoryModule::for_feature::<User>(
//!     RepositoryOptions::new("User", Schema::new().unique("email")),
//! )
//! .register(locator)
//! .await?;
//!
//! let created = users.create(user).await?;
//! ```

pub mod core;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod repositories;
