//! 테스트용 인메모리 [`Model`]
//!
//! 최상위 필드 동등 비교 필터, 포함/제외 프로젝션(프로젝션 후 기본값 적용), `$set`/`$inc`/`$setOnInsert`,
//! 단일 필드 유니크 제약(코드 11000)만 지원합니다.
//! 호출마다 전달된 옵션을 기록하여 기본 옵션 병합을 검증할 수 있습니다.

use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use mongodb::options::AggregateOptions;

use crate::db::model::{cast_update, DeleteResult, Model, QueryOptions};
use crate::db::mongo_model::{hydrate, prepare_upsert};
use crate::db::schema::{projection_selects, Schema};
use crate::errors::{RepositoryError, RepositoryResult, DUPLICATE_KEY_CODE};

/// 호출 기록
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub operation: &'static str,
    pub options: QueryOptions,
    pub projection: Option<Document>,
    pub update: Option<Document>,
}

pub(crate) struct MemoryModel {
    name: String,
    collection: String,
    schema: Schema,
    documents: Mutex<Vec<Document>>,
    calls: Mutex<Vec<RecordedCall>>,
    aggregate_rows: Mutex<Vec<Document>>,
    aggregate_calls: Mutex<Vec<(Vec<Document>, Option<AggregateOptions>)>>,
}

impl MemoryModel {
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            collection: schema.collection_name_for(name),
            schema,
            documents: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            aggregate_rows: Mutex::new(Vec::new()),
            aggregate_calls: Mutex::new(Vec::new()),
        }
    }

    /// 다음 `aggregate` 호출이 돌려줄 결과
    pub fn with_aggregate_rows(self, rows: Vec<Document>) -> Self {
        *self.aggregate_rows.lock().unwrap() = rows;
        self
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    pub fn last_call(&self, operation: &str) -> Option<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.operation == operation)
            .cloned()
    }

    pub fn aggregate_calls(&self) -> Vec<(Vec<Document>, Option<AggregateOptions>)> {
        self.aggregate_calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        operation: &'static str,
        options: &QueryOptions,
        projection: Option<&Document>,
        update: Option<&Document>,
    ) {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            options: options.clone(),
            projection: projection.cloned(),
            update: update.cloned(),
        });
    }

    fn check_unique(&self, documents: &[Document], candidate: &Document) -> RepositoryResult<()> {
        let candidate_id = candidate.get("_id");
        for field in self.schema.unique_fields() {
            let Some(value) = candidate.get(&field) else {
                continue;
            };
            let conflict = documents
                .iter()
                .filter(|existing| existing.get("_id") != candidate_id)
                .any(|existing| existing.get(&field) == Some(value));
            if conflict {
                let mut key_value = Document::new();
                key_value.insert(field.clone(), value.clone());
                return Err(RepositoryError::ServerError {
                    code: DUPLICATE_KEY_CODE,
                    message: format!(
                        "E11000 duplicate key error collection: test.{} index: {}_1 \
                         dup key: {{ {}: {} }}",
                        self.collection, field, field, value
                    ),
                    key_value: Some(key_value),
                });
            }
        }
        Ok(())
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn project(document: Document, projection: Option<&Document>) -> Document {
    document
        .into_iter()
        .filter(|(key, _)| projection_selects(projection, key))
        .collect()
}

fn apply_update(document: &mut Document, update: &Document, inserting: bool) {
    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            continue;
        };
        match operator.as_str() {
            "$set" => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            "$setOnInsert" if inserting => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            "$inc" => {
                for (key, delta) in fields {
                    let next = match (document.get(key), delta) {
                        (Some(Bson::Int32(current)), Bson::Int32(delta)) => {
                            Bson::Int32(current + delta)
                        }
                        (Some(Bson::Int64(current)), Bson::Int64(delta)) => {
                            Bson::Int64(current + delta)
                        }
                        (Some(Bson::Double(current)), Bson::Double(delta)) => {
                            Bson::Double(current + delta)
                        }
                        _ => delta.clone(),
                    };
                    document.insert(key.clone(), next);
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Model for MemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn create(&self, mut document: Document) -> RepositoryResult<Document> {
        self.record("create", &QueryOptions::new(), None, None);
        self.schema.apply_defaults(&mut document);
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }

        let mut documents = self.documents.lock().unwrap();
        self.check_unique(&documents, &document)?;
        documents.push(document.clone());

        Ok(document)
    }

    async fn find(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Vec<Document>> {
        self.record("find", &options, projection.as_ref(), None);
        let documents = self.documents.lock().unwrap();

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => usize::MAX,
        };

        Ok(documents
            .iter()
            .filter(|document| matches(document, &filter))
            .skip(skip)
            .take(limit)
            .map(|document| {
                let projected = project(document.clone(), projection.as_ref());
                hydrate(&self.schema, projected, projection.as_ref(), &options)
            })
            .collect())
    }

    async fn find_one(
        &self,
        filter: Document,
        projection: Option<Document>,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.record("find_one", &options, projection.as_ref(), None);
        let documents = self.documents.lock().unwrap();

        Ok(documents
            .iter()
            .find(|document| matches(document, &filter))
            .map(|document| {
                let projected = project(document.clone(), projection.as_ref());
                hydrate(&self.schema, projected, projection.as_ref(), &options)
            }))
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
        self.record("find_one_and_update", &options, None, Some(&update));

        let mut documents = self.documents.lock().unwrap();
        if let Some(position) = documents.iter().position(|document| matches(document, &filter)) {
            let before = documents[position].clone();
            let mut after = before.clone();
            apply_update(&mut after, &update, false);
            self.check_unique(&documents, &after)?;
            documents[position] = after.clone();

            let returned = if options.returns_new() { after } else { before };
            return Ok(Some(hydrate(&self.schema, returned, None, &options)));
        }

        if !options.is_upsert() {
            return Ok(None);
        }

        let mut inserted: Document = filter
            .iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        apply_update(&mut inserted, &update, true);
        if !inserted.contains_key("_id") {
            inserted.insert("_id", ObjectId::new());
        }
        self.check_unique(&documents, &inserted)?;
        documents.push(inserted.clone());

        if options.returns_new() {
            Ok(Some(hydrate(&self.schema, inserted, None, &options)))
        } else {
            Ok(None)
        }
    }

    async fn find_one_and_delete(
        &self,
        filter: Document,
        options: QueryOptions,
    ) -> RepositoryResult<Option<Document>> {
        self.record("find_one_and_delete", &options, None, None);
        let mut documents = self.documents.lock().unwrap();

        let removed = documents
            .iter()
            .position(|document| matches(document, &filter))
            .map(|position| documents.remove(position));

        Ok(removed.map(|document| hydrate(&self.schema, document, None, &options)))
    }

    async fn delete_many(&self, filter: Document) -> RepositoryResult<DeleteResult> {
        self.record("delete_many", &QueryOptions::new(), None, None);
        let mut documents = self.documents.lock().unwrap();

        let before = documents.len();
        documents.retain(|document| !matches(document, &filter));

        Ok(DeleteResult {
            deleted_count: (before - documents.len()) as u64,
        })
    }

    async fn count_documents(&self, filter: Document) -> RepositoryResult<u64> {
        self.record("count_documents", &QueryOptions::new(), None, None);
        let documents = self.documents.lock().unwrap();

        Ok(documents.iter().filter(|document| matches(document, &filter)).count() as u64)
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<AggregateOptions>,
    ) -> RepositoryResult<Vec<Document>> {
        self.aggregate_calls.lock().unwrap().push((pipeline, options));

        Ok(self.aggregate_rows.lock().unwrap().clone())
    }
}
