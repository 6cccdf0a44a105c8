//! # Repository Module - 기능 단위 리포지토리 등록
//!
//! 이름과 스키마(또는 스키마 팩토리)로 모델 핸들과 [`RepositoryService`] 를
//! [`ServiceLocator`] 에 바인딩합니다.
//!
//! ## 등록 방식
//!
//! | 방식 | 스키마 | 용도 |
//! |------|--------|------|
//! | [`RepositoryModule::for_feature`] | 즉시 제공 | 정적 스키마 |
//! | [`RepositoryModule::for_feature_async`] | 팩토리가 비동기 생성 | 설정 의존 스키마 |
//! | [`FeatureRegistration`] + `inventory` | 위 두 방식을 감싼 함수 | 시작 시 일괄 등록 |
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! let locator = ServiceLocator::global();
//! locator.set(DATABASE_CONNECTION, Arc::new(Database::new().await?));
//!
//! let users = RepositoryModule::for_feature::<User>(
//!     RepositoryOptions::new("User", Schema::new().unique("email").default_value("age", 0)),
//! )
//! .register(locator)
//! .await?;
//!
//! // 이후 어디서든
//! let users: Arc<RepositoryService<User>> = locator.get("UserRepository")?;
//! ```

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::info;

use crate::core::registry::{
    get_model_token, get_repository_token, ServiceLocator, DATABASE_CONNECTION,
};
use crate::db::{Database, Model, Schema};
use crate::domain::Entity;
use crate::errors::{RepositoryError, RepositoryResult};
use crate::repositories::RepositoryService;

/// 주입된 프로바이더로부터 스키마를 만드는 비동기 팩토리
pub type SchemaFactory =
    Arc<dyn Fn(InjectedProviders) -> BoxFuture<'static, RepositoryResult<Schema>> + Send + Sync>;

/// 정적 등록 옵션
#[derive(Clone)]
pub struct RepositoryOptions {
    pub name: String,
    pub schema: Schema,
}

impl RepositoryOptions {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// 토큰과 값 쌍. 팩토리 실행 전에 레지스트리에 먼저 바인딩됩니다.
#[derive(Clone)]
pub struct Provider {
    pub token: String,
    pub instance: Arc<dyn Any + Send + Sync>,
}

impl Provider {
    pub fn value<T: Any + Send + Sync>(token: impl Into<String>, instance: Arc<T>) -> Self {
        Self {
            token: token.into(),
            instance,
        }
    }
}

/// 팩토리에 전달되는 주입 값 목록. `inject` 에 적은 순서를 따릅니다.
pub struct InjectedProviders {
    providers: Vec<(String, Arc<dyn Any + Send + Sync>)>,
}

impl InjectedProviders {
    /// `index` 번째 주입 값을 `T` 로 꺼냅니다.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> RepositoryResult<Arc<T>> {
        let (token, instance) = self
            .providers
            .get(index)
            .ok_or_else(|| RepositoryError::NotRegistered(format!("inject[{}]", index)))?;

        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| RepositoryError::TypeMismatch(token.clone()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// 비동기 등록 옵션
///
/// - `use_factory`: 스키마를 만드는 팩토리
/// - `inject`: 팩토리에 전달할 프로바이더 토큰 (순서 유지)
/// - `imports`: 팩토리 실행 전에 바인딩할 프로바이더
#[derive(Clone)]
pub struct AsyncRepositoryOptions {
    pub name: String,
    pub use_factory: SchemaFactory,
    pub inject: Vec<String>,
    pub imports: Vec<Provider>,
}

impl AsyncRepositoryOptions {
    pub fn new<F, Fut>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(InjectedProviders) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RepositoryResult<Schema>> + Send + 'static,
    {
        let use_factory: SchemaFactory = Arc::new(move |injected| factory(injected).boxed());

        Self {
            name: name.into(),
            use_factory,
            inject: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn inject(mut self, token: impl Into<String>) -> Self {
        self.inject.push(token.into());
        self
    }

    pub fn import(mut self, provider: Provider) -> Self {
        self.imports.push(provider);
        self
    }
}

enum SchemaSource {
    Static(Schema),
    Factory {
        use_factory: SchemaFactory,
        inject: Vec<String>,
        imports: Vec<Provider>,
    },
}

/// 레지스트리에 바인딩되기 전의 기능 모듈
pub struct DynamicModule<T: Entity> {
    name: String,
    source: SchemaSource,
    _record: PhantomData<fn() -> T>,
}

impl<T: Entity> DynamicModule<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 리포지토리가 바인딩될 토큰
    pub fn token(&self) -> String {
        get_repository_token(&self.name)
    }

    pub fn model_token(&self) -> String {
        get_model_token(&self.name)
    }

    /// 모델 핸들과 리포지토리를 레지스트리에 바인딩합니다.
    ///
    /// 1. `imports` 바인딩, `inject` 해석, 팩토리 실행으로 스키마 확정
    /// 2. `"<Name>Model"` 이 이미 있으면 재사용, 없으면 `"DatabaseConnection"` 으로 생성
    /// 3. `"<Name>Repository"` 에 [`RepositoryService`] 바인딩
    ///
    /// 이미 바인딩된 모델은 자신의 스키마를 그대로 사용합니다. 이 경우 확정된 스키마는
    /// 팩토리 실행과 주입 검증에만 쓰이고 모델에는 반영되지 않습니다.
    pub async fn register(
        self,
        locator: &ServiceLocator,
    ) -> RepositoryResult<Arc<RepositoryService<T>>> {
        let model_token = self.model_token();
        let repository_token = self.token();

        let schema = match self.source {
            SchemaSource::Static(schema) => schema,
            SchemaSource::Factory {
                use_factory,
                inject,
                imports,
            } => {
                for provider in imports {
                    locator.set_any(provider.token, provider.instance);
                }

                let providers = inject
                    .into_iter()
                    .map(|token| locator.get_any(&token).map(|instance| (token, instance)))
                    .collect::<RepositoryResult<Vec<_>>>()?;

                use_factory(InjectedProviders { providers }).await?
            }
        };

        let model: Arc<dyn Model> = if locator.contains(&model_token) {
            Arc::clone(&*locator.get::<Arc<dyn Model>>(&model_token)?)
        } else {
            let database = locator.get::<Database>(DATABASE_CONNECTION)?;
            let model: Arc<dyn Model> = database.model(&self.name, schema).await?;
            RepositoryModule::bind_model(locator, &self.name, model.clone());
            model
        };

        let service = Arc::new(RepositoryService::<T>::new(model));
        locator.set(repository_token.clone(), service.clone());
        info!("✅ {} 등록 완료", repository_token);

        Ok(service)
    }
}

/// 기능 모듈 생성 진입점
pub struct RepositoryModule;

impl RepositoryModule {
    pub fn for_feature<T: Entity>(options: RepositoryOptions) -> DynamicModule<T> {
        DynamicModule {
            name: options.name,
            source: SchemaSource::Static(options.schema),
            _record: PhantomData,
        }
    }

    pub fn for_feature_async<T: Entity>(options: AsyncRepositoryOptions) -> DynamicModule<T> {
        DynamicModule {
            name: options.name,
            source: SchemaSource::Factory {
                use_factory: options.use_factory,
                inject: options.inject,
                imports: options.imports,
            },
            _record: PhantomData,
        }
    }

    /// 모델 핸들을 `"<Name>Model"` 에 직접 바인딩합니다.
    ///
    /// 등록 전에 호출하면 데이터베이스 대신 이 핸들이 사용됩니다.
    pub fn bind_model(locator: &ServiceLocator, name: &str, model: Arc<dyn Model>) {
        locator.set(get_model_token(name), Arc::new(model));
    }

    /// `inventory` 로 수집된 모든 [`FeatureRegistration`] 을 등록합니다.
    ///
    /// 등록된 기능 수를 반환합니다. 하나라도 실패하면 즉시 에러를 반환합니다.
    pub async fn initialize_all(locator: &ServiceLocator) -> RepositoryResult<usize> {
        let mut count = 0;

        for registration in inventory::iter::<FeatureRegistration>() {
            info!("🔄 {} 등록 중...", registration.name);
            (registration.register)(locator).await?;
            count += 1;
        }

        info!("🎉 리포지토리 {}개 초기화 완료", count);
        Ok(count)
    }
}

/// 시작 시 일괄 등록할 기능
///
/// ```rust,ignore
/// fn register_users(locator: &ServiceLocator) -> BoxFuture<'_, RepositoryResult<()>> {
///     Box::pin(async move {
///         RepositoryModule::for_feature::<User>(RepositoryOptions::new("User", user_schema()))
///             .register(locator)
///             .await?;
///         Ok(())
///     })
/// }
///
/// inventory::submit! { FeatureRegistration::new("User", register_users) }
/// ```
pub struct FeatureRegistration {
    pub name: &'static str,
    pub register: for<'a> fn(&'a ServiceLocator) -> BoxFuture<'a, RepositoryResult<()>>,
}

impl FeatureRegistration {
    pub const fn new(
        name: &'static str,
        register: for<'a> fn(&'a ServiceLocator) -> BoxFuture<'a, RepositoryResult<()>>,
    ) -> Self {
        Self { name, register }
    }
}

inventory::collect!(FeatureRegistration);
