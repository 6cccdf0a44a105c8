//! 모델 핸들 추상화
//!
//! 하나의 컬렉션에 바인딩된 저장소 핸들을 [`Model`] trait으로 표현합니다.
//! [`RepositoryService`](crate::repositories::RepositoryService)는 이 trait에만 의존하므로
//! 드라이버 구현([`MongoModel`](super::MongoModel))과 테스트 대역을 교체할 수 있습니다.

use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::options::AggregateOptions;

use crate::errors::RepositoryResult;

/// 쿼리 실행 옵션
///
/// 모든 필드는 선택적이며, [`merge`](QueryOptions::merge) 로 기본값 위에
/// 호출자가 지정한 값만 덮어씁니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// 스키마 기본값을 적용하지 않은 저장된 문서 그대로 반환
    pub lean: Option<bool>,
    /// 변경 후 문서 반환 (`false` 이면 변경 전 문서)
    pub return_new: Option<bool>,
    /// 일치하는 문서가 없으면 삽입
    pub upsert: Option<bool>,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lean(mut self, lean: bool) -> Self {
        self.lean = Some(lean);
        self
    }

    pub fn return_new(mut self, return_new: bool) -> Self {
        self.return_new = Some(return_new);
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `overrides` 에 지정된 값이 기본값보다 우선합니다.
    pub fn merge(self, overrides: Option<QueryOptions>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };

        Self {
            lean: overrides.lean.or(self.lean),
            return_new: overrides.return_new.or(self.return_new),
            upsert: overrides.upsert.or(self.upsert),
            sort: overrides.sort.or(self.sort),
            skip: overrides.skip.or(self.skip),
            limit: overrides.limit.or(self.limit),
        }
    }

    pub fn is_lean(&self) -> bool {
        self.lean.unwrap_or(false)
    }

    pub fn returns_new(&self) -> bool {
        self.return_new.unwrap_or(false)
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert.unwrap_or(false)
    }
}

/// `delete_many` 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// 연산자가 아닌 최상위 키를 `$set` 으로 옮깁니다.
///
/// `{ "name": "x", "$inc": { "age": 1 } }` → `{ "$inc": { "age": 1 }, "$set": { "name": "x" } }`
pub fn cast_update(update: Document) -> Document {
    if update.keys().all(|key| key.starts_with('$')) {
        return update;
    }

    let mut cast = Document::new();
    let mut set = Document::new();
    for (key, value) in update {
        if key.starts_with('$') {
            cast.insert(key, value);
        } else {
            set.insert(key, value);
        }
    }

    if let Ok(existing) = cast.get_document_mut("$set") {
        for (key, value) in set {
            existing.insert(key, value);
        }
    } else {
        cast.insert("$set", set);
    }
    cast
}

/// 하나의 컬렉션에 바인딩된 저장소 핸들
///
/// 필터, 업데이트, 파이프라인은 검사 없이 그대로 저장소에 전달됩니다.
/// 단건 연산에서 일치하는 문서가 없으면 `Ok(None)` 을 반환합니다.
#[async_trait]
pub trait Model: Send + Sync {
    /// 모델 이름 (`User`)
    fn name(&self) -> &str;

    /// 바인딩된 컬렉션 이름 (`users`)
    fn collection_name(&self) -> &str;

    /// 문서를 삽입하고 저장된 문서를 반환합니다.
    async fn create(&self, document: Document) -> RepositoryResult<Document>;

    async fn find(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Vec<Document>>;

    async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>>;

    /// 원자적 조회 후 변경. `options.return_new` 에 따라 변경 전/후 문서를 반환합니다.
    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>>;

    /// 원자적 조회 후 삭제. 삭제된 문서를 반환합니다.
    async fn find_one_and_delete(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>>;

    async fn delete_many(&self, filter: Document) -> RepositoryResult<DeleteResult>;

    async fn count_documents(&self, filter: Document) -> RepositoryResult<u64>;

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> RepositoryResult<Vec<Document>>;
}
