//! # Core Module
//!
//! 리포지토리 등록과 조회를 위한 의존성 주입 기능을 제공하는 모듈입니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 토큰 기반 컨테이너
//! - **ServiceLocator**: 문자열 토큰 → 공유 인스턴스
//! - **토큰 헬퍼**: `"DatabaseConnection"`, `"<Name>Model"`, `"<Name>Repository"`
//!
//! ### [`module`] - 기능 단위 등록
//! - **RepositoryModule**: `for_feature` / `for_feature_async`
//! - **DynamicModule**: 레지스트리에 모델과 리포지토리 바인딩
//! - **FeatureRegistration**: `inventory` 기반 일괄 등록
//!
//! ## 애플리케이션 초기화
//!
//! ```rust,ignore
//! use mongo_repository::core::{RepositoryModule, ServiceLocator, DATABASE_CONNECTION};
//!
//! let locator = ServiceLocator::global();
//! locator.set(DATABASE_CONNECTION, Arc::new(Database::new().await?));
//! RepositoryModule::initialize_all(locator).await?;
//! ```

pub mod module;
pub mod registry;

pub use module::{
    AsyncRepositoryOptions, DynamicModule, FeatureRegistration, InjectedProviders, Provider,
    RepositoryModule, RepositoryOptions, SchemaFactory,
};
pub use registry::{get_model_token, get_repository_token, ServiceLocator, DATABASE_CONNECTION};
