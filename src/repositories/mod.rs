//! 데이터 액세스 계층을 담당하는 리포지토리 모듈
//!
//! 모델 핸들([`Model`](crate::db::Model)) 하나에 바인딩된 제네릭 리포지토리를 제공합니다.
//! 인스턴스는 보통 [`RepositoryModule`](crate::core::RepositoryModule) 로 등록하고
//! `"<Name>Repository"` 토큰으로 꺼내 씁니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::repositories::RepositoryService;
//!
//! let user_repo: Arc<RepositoryService<User>> = locator.get("UserRepository")?;
//! let user = user_repo.find_one(doc! { "email": "user@example.com" }, None, None).await?;
//! ```

pub mod repository_service;

pub use repository_service::RepositoryService;
