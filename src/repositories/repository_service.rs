//! # 제네릭 리포지토리 서비스
//!
//! 하나의 모델 핸들에 바인딩되어 CRUD와 집계 연산을 제공하는 데이터 액세스 파사드입니다.
//!
//! ## 특징
//!
//! - **컬렉션 무관**: 레코드 타입 `T` 만 바꾸어 모든 컬렉션에 재사용
//! - **얇은 전달 계층**: 필터, 업데이트, 파이프라인을 검사하지 않고 그대로 전달
//! - **기본 옵션 병합**: 조회는 lean, 업데이트는 변경 후 문서 반환이 기본값
//! - **상태 없음**: 모델 핸들 외의 상태를 보관하지 않으므로 동시 호출에 안전

use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, warn};
use mongodb::bson::{self, oid::ObjectId, Document};
use mongodb::options::AggregateOptions;
use serde::de::DeserializeOwned;

use crate::db::{DeleteResult, Model, QueryOptions};
use crate::domain::Entity;
use crate::errors::{RepositoryError, RepositoryResult};

/// 레코드 타입 `T` 에 대한 리포지토리
///
/// ## 기본 옵션
///
/// | 연산 | 기본값 | 비고 |
/// |------|--------|------|
/// | `find`, `find_one` | `lean` | 호출자 옵션이 우선 |
/// | `find_one_and_update` | `lean`, `return_new` | 호출자 옵션이 우선 |
/// | `upsert` | `upsert`, `return_new` | lean 아님 (스키마 기본값 적용) |
///
/// ## 에러 처리
///
/// - `create` 의 유니크 제약 위반만 [`RepositoryError::DuplicateKey`] 로 변환
/// - 그 외 저장소 에러는 그대로 전달
/// - 찾을 수 없음은 `Ok(None)` (또는 빈 `Vec`)
///
/// ## 사용 예제
///
/// ```rust,ignore
/// let repo: Arc<RepositoryService<User>> = locator.get("UserRepository")?;
///
/// let created = repo.create(User::new("Test User", "test@example.com")).await?;
/// let found = repo.find_one(doc! { "_id": created.id() }, None, None).await?;
///
/// let updated = repo
///     .find_one_and_update(doc! { "email": "test@example.com" }, doc! { "$set": { "age": 31 } }, None)
///     .await?;
/// ```
pub struct RepositoryService<T: Entity> {
    model: Arc<dyn Model>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for RepositoryService<T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            _record: PhantomData,
        }
    }
}

impl<T: Entity> RepositoryService<T> {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            _record: PhantomData,
        }
    }

    /// 바인딩된 모델 핸들
    pub fn model(&self) -> &Arc<dyn Model> {
        &self.model
    }

    /// 새 식별자를 할당하여 레코드를 삽입합니다.
    ///
    /// # 반환값
    ///
    /// * `Ok(T)` - 저장된 레코드 (스키마 기본값 포함)
    /// * `Err(RepositoryError::DuplicateKey)` - 유니크 제약 위반 (위반 필드 이름 포함)
    /// * `Err(_)` - 그 외 저장소 에러
    pub async fn create(&self, mut data: T) -> RepositoryResult<T> {
        let id = ObjectId::new();
        data.set_id(id);

        let mut document = bson::to_document(&data)?;
        document.insert("_id", id);
        debug!("{}.create _id={}", self.model.name(), id);

        match self.model.create(document).await {
            Ok(created) => Ok(bson::from_document(created)?),
            Err(error) => match error.duplicate_key_field() {
                Some(key) => {
                    warn!("{} 중복 키: {}", self.model.name(), key);
                    Err(RepositoryError::DuplicateKey(key))
                }
                None => Err(error),
            },
        }
    }

    /// 필터와 일치하는 모든 레코드를 반환합니다. 일치하는 레코드가 없으면 빈 `Vec` 입니다.
    pub async fn find(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: Option<QueryOptions>,
    ) -> RepositoryResult<Vec<T>> {
        let options = QueryOptions::new().lean(true).merge(options);
        debug!("{}.find filter={}", self.model.name(), filter);

        let documents = self
            .model
            .find(filter, non_empty(projection), options)
            .await?;

        documents
            .into_iter()
            .map(|document| bson::from_document(document).map_err(RepositoryError::from))
            .collect()
    }

    /// 필터와 일치하는 레코드 하나를 반환합니다.
    pub async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: Option<QueryOptions>,
    ) -> RepositoryResult<Option<T>> {
        let options = QueryOptions::new().lean(true).merge(options);
        debug!("{}.find_one filter={}", self.model.name(), filter);

        let document = self
            .model
            .find_one(filter, non_empty(projection), options)
            .await?;

        decode_optional(document)
    }

    /// 일치하는 레코드 하나를 원자적으로 변경하고 변경 후 레코드를 반환합니다.
    ///
    /// 연산자가 없는 최상위 필드는 `$set` 으로 처리됩니다.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: Option<QueryOptions>,
    ) -> RepositoryResult<Option<T>> {
        let options = QueryOptions::new()
            .lean(true)
            .return_new(true)
            .merge(options);
        debug!(
            "{}.find_one_and_update filter={} update={}",
            self.model.name(),
            filter,
            update
        );

        let document = self
            .model
            .find_one_and_update(filter, update, options)
            .await?;

        decode_optional(document)
    }

    /// 일치하는 첫 레코드를 `document` 로 변경하거나, 없으면 새로 삽입합니다.
    ///
    /// 항상 결과 레코드를 반환합니다. 기존 레코드의 식별자는 유지되고,
    /// 삽입 시에는 새 식별자가 할당됩니다.
    pub async fn upsert(&self, filter: Document, document: Document) -> RepositoryResult<T> {
        let options = QueryOptions::new().upsert(true).return_new(true);
        debug!("{}.upsert filter={}", self.model.name(), filter);

        let document = self
            .model
            .find_one_and_update(filter, document, options)
            .await?
            .ok_or_else(|| {
                RepositoryError::UnexpectedEmptyResult(format!("{}.upsert", self.model.name()))
            })?;

        Ok(bson::from_document(document)?)
    }

    /// 일치하는 레코드 하나를 원자적으로 삭제하고 삭제된 레코드를 반환합니다.
    pub async fn find_one_and_delete(&self, filter: Document) -> RepositoryResult<Option<T>> {
        debug!("{}.find_one_and_delete filter={}", self.model.name(), filter);

        let document = self
            .model
            .find_one_and_delete(filter, QueryOptions::new())
            .await?;

        decode_optional(document)
    }

    /// 일치하는 모든 레코드를 삭제합니다.
    pub async fn delete_many(&self, filter: Document) -> RepositoryResult<DeleteResult> {
        debug!("{}.delete_many filter={}", self.model.name(), filter);

        self.model.delete_many(filter).await
    }

    /// 일치하는 레코드 수
    pub async fn count(&self, filter: Document) -> RepositoryResult<u64> {
        self.model.count_documents(filter).await
    }

    /// 집계 파이프라인을 실행합니다. 결과 순서는 저장소가 정합니다.
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> RepositoryResult<Vec<Document>> {
        debug!("{}.aggregate stages={}", self.model.name(), pipeline.len());

        self.model.aggregate(pipeline, options).await
    }

    /// 집계 결과를 `R` 로 역직렬화합니다.
    pub async fn aggregate_as<R: DeserializeOwned>(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> RepositoryResult<Vec<R>> {
        self.aggregate(pipeline, options)
            .await?
            .into_iter()
            .map(|row| bson::from_document(row).map_err(RepositoryError::from))
            .collect()
    }
}

/// 빈 프로젝션은 프로젝션 없음과 같습니다.
fn non_empty(projection: Option<Document>) -> Option<Document> {
    projection.filter(|projection| !projection.is_empty())
}

fn decode_optional<T: DeserializeOwned>(document: Option<Document>) -> RepositoryResult<Option<T>> {
    document
        .map(bson::from_document)
        .transpose()
        .map_err(RepositoryError::from)
}
