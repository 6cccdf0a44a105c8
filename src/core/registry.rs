//! # Provider Registry - 토큰 기반 의존성 주입 컨테이너
//!
//! 문자열 토큰으로 공유 인스턴스(데이터베이스 연결, 모델 핸들, 리포지토리)를
//! 등록하고 조회하는 컨테이너입니다.
//!
//! ## 토큰 규칙
//!
//! | 토큰 | 값 | 생성 함수 |
//! |------|----|-----------|
//! | `"DatabaseConnection"` | [`Database`](crate::db::Database) | [`DATABASE_CONNECTION`] |
//! | `"<Name>Model"` | `dyn Model` 핸들 | [`get_model_token`] |
//! | `"<Name>Repository"` | `RepositoryService<T>` | [`get_repository_token`] |
//!
//! ## 동작 방식
//!
//! ```text
//! 1. 인프라 등록
//!    └─ locator.set(DATABASE_CONNECTION, Arc::new(database))
//!
//! 2. 기능 등록 (RepositoryModule::for_feature / for_feature_async)
//!    ├─ "<Name>Model" 토큰에 모델 핸들 바인딩 (이미 있으면 재사용)
//!    └─ "<Name>Repository" 토큰에 RepositoryService 바인딩
//!
//! 3. 조회
//!    └─ locator.get::<RepositoryService<User>>("UserRepository")
//! ```
//!
//! 전역 컨테이너는 [`ServiceLocator::global`] 로 접근하고,
//! 테스트는 [`ServiceLocator::new`] 로 독립된 컨테이너를 만들어 사용합니다.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use once_cell::sync::Lazy;

use crate::errors::{RepositoryError, RepositoryResult};

/// 데이터베이스 연결 토큰
pub const DATABASE_CONNECTION: &str = "DatabaseConnection";

/// 모델 핸들 토큰 (`User` → `UserModel`)
pub fn get_model_token(name: &str) -> String {
    format!("{}Model", name)
}

/// 리포지토리 토큰 (`User` → `UserRepository`)
pub fn get_repository_token(name: &str) -> String {
    format!("{}Repository", name)
}

type Instance = Arc<dyn Any + Send + Sync>;

/// 토큰 → 인스턴스 컨테이너
///
/// # 주요 기능
///
/// - **토큰 바인딩**: 같은 토큰에 다시 등록하면 이전 값을 대체
/// - **타입 검증**: 조회 시 요청 타입과 등록 타입이 다르면 [`RepositoryError::TypeMismatch`]
/// - **Thread-safe**: `RwLock` 으로 보호되며, 락이 오염되어도 내부 값을 계속 사용
pub struct ServiceLocator {
    instances: RwLock<HashMap<String, Instance>>,
}

impl Default for ServiceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// 애플리케이션 전역 컨테이너
    pub fn global() -> &'static ServiceLocator {
        &LOCATOR
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Instance>> {
        self.instances.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Instance>> {
        self.instances.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 인스턴스를 토큰에 바인딩합니다.
    ///
    /// ```rust,ignore
    /// let database = Database::new().await?;
    /// locator.set(DATABASE_CONNECTION, Arc::new(database));
    /// ```
    pub fn set<T: Any + Send + Sync>(&self, token: impl Into<String>, instance: Arc<T>) {
        self.set_any(token, instance);
    }

    /// 타입이 지워진 인스턴스를 바인딩합니다.
    pub fn set_any(&self, token: impl Into<String>, instance: Instance) {
        let token = token.into();
        debug!("📦 Registering: {}", token);
        self.write().insert(token, instance);
    }

    /// 토큰에 바인딩된 인스턴스를 `T` 로 꺼냅니다.
    ///
    /// # 에러
    ///
    /// * `NotRegistered` - 토큰이 바인딩되지 않음
    /// * `TypeMismatch` - 바인딩된 값이 `T` 가 아님
    pub fn get<T: Any + Send + Sync>(&self, token: &str) -> RepositoryResult<Arc<T>> {
        self.get_any(token)?.downcast::<T>().map_err(|_| {
            RepositoryError::TypeMismatch(format!("{} (requested {})", token, type_name::<T>()))
        })
    }

    pub fn get_any(&self, token: &str) -> RepositoryResult<Instance> {
        self.read()
            .get(token)
            .cloned()
            .ok_or_else(|| RepositoryError::NotRegistered(token.to_string()))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.read().contains_key(token)
    }

    /// 바인딩된 토큰 목록 (정렬됨)
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }
}

/// 전역 서비스 로케이터 인스턴스
static LOCATOR: Lazy<ServiceLocator> = Lazy::new(ServiceLocator::new);
