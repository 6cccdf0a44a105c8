//! MongoDB 드라이버 기반 [`Model`] 구현

use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info};
use mongodb::bson::{Bson, Document};
use mongodb::options::{
    AggregateOptions, FindOneAndDeleteOptions, FindOneAndUpdateOptions, FindOneOptions,
    FindOptions, ReturnDocument,
};
use mongodb::Collection;

use crate::db::model::{cast_update, DeleteResult, Model, QueryOptions};
use crate::db::schema::Schema;
use crate::errors::RepositoryResult;

/// 이름과 스키마가 바인딩된 MongoDB 컬렉션 핸들
///
/// ## 드라이버 규약
///
/// - **생성**: 스키마 기본값을 채운 뒤 `insert_one`
/// - **업데이트**: 연산자가 아닌 최상위 키는 `$set` 으로 변환
/// - **upsert**: 누락된 기본값과 `_id` 는 `$setOnInsert` 로 이동
/// - **lean 이 아닌 조회**: 반환 문서에 누락된 스키마 기본값을 채움
#[derive(Clone)]
pub struct MongoModel {
    name: String,
    schema: Schema,
    collection: Collection<Document>,
}

impl MongoModel {
    pub fn new(name: impl Into<String>, schema: Schema, database: &mongodb::Database) -> Self {
        let name = name.into();
        let collection = database.collection::<Document>(&schema.collection_name_for(&name));

        Self {
            name,
            schema,
            collection,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// 드라이버 컬렉션 핸들
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// 스키마에 선언된 인덱스를 생성합니다.
    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let models = self.schema.index_models();
        if models.is_empty() {
            return Ok(());
        }

        let count = models.len();
        self.collection.create_indexes(models).await?;
        info!("📇 {} 인덱스 {}개 동기화 완료", self.collection.name(), count);

        Ok(())
    }
}

/// lean 이 아닌 조회 결과에 스키마 기본값을 채웁니다.
///
/// 프로젝션에서 빠진 필드는 채우지 않습니다.
pub(crate) fn hydrate(
    schema: &Schema,
    mut document: Document,
    projection: Option<&Document>,
    options: &QueryOptions,
) -> Document {
    if !options.is_lean() {
        schema.apply_selected_defaults(&mut document, projection);
    }
    document
}

/// upsert 업데이트에 삽입 시에만 쓰일 필드를 `$setOnInsert` 로 모읍니다.
///
/// 필터의 동등 조건 필드는 삽입 문서에 복사되므로 기본값으로 덮어쓰지 않습니다.
pub(crate) fn prepare_upsert(schema: &Schema, filter: &Document, update: &mut Document) {
    let mut set_on_insert = match update.remove("$setOnInsert") {
        Some(Bson::Document(existing)) => existing,
        _ => Document::new(),
    };

    // _id 는 변경할 수 없으므로 새 문서에만 기록
    let mut set_emptied = false;
    if let Ok(set) = update.get_document_mut("$set") {
        if let Some(id) = set.remove("_id") {
            set_on_insert.insert("_id", id);
            set_emptied = set.is_empty();
        }
    }
    if set_emptied {
        update.remove("$set");
    }

    let touched = |field: &str| {
        (!field.starts_with('$') && filter.contains_key(field))
            || set_on_insert.contains_key(field)
            || update
                .values()
                .filter_map(Bson::as_document)
                .any(|operator| operator.contains_key(field))
    };
    let defaults = schema.missing_defaults(touched);
    for (field, value) in defaults {
        set_on_insert.insert(field, value);
    }

    if !set_on_insert.is_empty() {
        update.insert("$setOnInsert", set_on_insert);
    }
}

#[async_trait]
impl Model for MongoModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection_name(&self) -> &str {
        self.collection.name()
    }

    async fn create(&self, mut document: Document) -> RepositoryResult<Document> {
        self.schema.apply_defaults(&mut document);
        if !document.contains_key("_id") {
            document.insert("_id", mongodb::bson::oid::ObjectId::new());
        }

        self.collection.insert_one(&document).await?;

        Ok(document)
    }

    async fn find(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Vec<Document>> {
        let find_options = FindOptions::builder()
            .projection(projection.clone())
            .sort(options.sort.clone())
            .skip(options.skip)
            .limit(options.limit)
            .build();

        let cursor = self.collection.find(filter).with_options(find_options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!("{}.find → {}건", self.collection.name(), documents.len());

        Ok(documents
            .into_iter()
            .map(|document| hydrate(&self.schema, document, projection.as_ref(), &options))
            .collect())
    }

    async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>> {
        let find_options = FindOneOptions::builder()
            .projection(projection.clone())
            .sort(options.sort.clone())
            .skip(options.skip)
            .build();

        let document = self
            .collection
            .find_one(filter)
            .with_options(find_options)
            .await?;

        Ok(document.map(|document| hydrate(&self.schema, document, projection.as_ref(), &options)))
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>> {
        let mut update = cast_update(update);
        if options.is_upsert() {
            prepare_upsert(&self.schema, &filter, &mut update);
        }

        let return_document = if options.returns_new() {
            ReturnDocument::After
        } else {
            ReturnDocument::Before
        };
        let update_options = FindOneAndUpdateOptions::builder()
            .return_document(return_document)
            .upsert(options.upsert)
            .sort(options.sort.clone())
            .build();

        let document = self
            .collection
            .find_one_and_update(filter, update)
            .with_options(update_options)
            .await?;

        Ok(document.map(|document| hydrate(&self.schema, document, None, &options)))
    }

    async fn find_one_and_delete(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>> {
        let delete_options = FindOneAndDeleteOptions::builder()
            .sort(options.sort.clone())
            .build();

        let document = self
            .collection
            .find_one_and_delete(filter)
            .with_options(delete_options)
            .await?;

        Ok(document.map(|document| hydrate(&self.schema, document, None, &options)))
    }

    async fn delete_many(&self, filter: Document) -> RepositoryResult<DeleteResult> {
        let result = self.collection.delete_many(filter).await?;

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn count_documents(&self, filter: Document) -> RepositoryResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> RepositoryResult<Vec<Document>> {
        let cursor = self
            .collection
            .aggregate(pipeline)
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }
}
