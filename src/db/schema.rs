//! 모델 스키마 정의
//!
//! 컬렉션 이름, 인덱스, 필드 기본값을 선언합니다.
//! 필드 타입 검증은 하지 않습니다. 타입은 레코드 구조체의 serde 정의가 담당합니다.

use mongodb::bson::{Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

/// 기본값 생성 함수 (예: 생성 시각)
pub type DefaultFn = fn() -> Bson;

#[derive(Debug, Clone)]
enum FieldDefault {
    Value(Bson),
    Computed(DefaultFn),
}

impl FieldDefault {
    fn resolve(&self) -> Bson {
        match self {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Computed(f) => f(),
        }
    }
}

/// 인덱스 선언
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// 인덱스 키 (`{ "email": 1 }`)
    pub keys: Document,
    /// 유니크 제약 여부
    pub unique: bool,
}

impl IndexSpec {
    /// 단일 필드 인덱스이면 필드 이름을 반환합니다.
    pub fn single_field(&self) -> Option<&str> {
        if self.keys.len() == 1 {
            self.keys.keys().next().map(String::as_str)
        } else {
            None
        }
    }
}

/// 모델 스키마
///
/// ```rust,ignore
/// let schema = Schema::new()
///     .unique("email")
///     .default_value("age", 0)
///     .default_value("active", false)
///     .default_with("createdAt", || Bson::DateTime(DateTime::now()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    collection: Option<String>,
    indexes: Vec<IndexSpec>,
    defaults: Vec<(String, FieldDefault)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컬렉션 이름을 명시합니다. 지정하지 않으면 모델 이름에서 유도합니다.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// 단일 필드 유니크 인덱스를 선언합니다.
    pub fn unique(self, field: &str) -> Self {
        let mut keys = Document::new();
        keys.insert(field, 1);
        self.index(keys, true)
    }

    pub fn index(mut self, keys: Document, unique: bool) -> Self {
        self.indexes.push(IndexSpec { keys, unique });
        self
    }

    /// 고정 기본값을 선언합니다.
    pub fn default_value(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.defaults.push((field.into(), FieldDefault::Value(value.into())));
        self
    }

    /// 적용 시점마다 계산되는 기본값을 선언합니다.
    pub fn default_with(mut self, field: impl Into<String>, f: DefaultFn) -> Self {
        self.defaults.push((field.into(), FieldDefault::Computed(f)));
        self
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// 단일 필드 유니크 인덱스의 필드 목록
    pub fn unique_fields(&self) -> Vec<String> {
        self.indexes
            .iter()
            .filter(|index| index.unique)
            .filter_map(|index| index.single_field().map(str::to_string))
            .collect()
    }

    /// 모델 이름에 대한 컬렉션 이름
    ///
    /// 명시된 이름이 없으면 소문자 복수형을 사용합니다 (`User` → `users`).
    pub fn collection_name_for(&self, model_name: &str) -> String {
        match &self.collection {
            Some(name) => name.clone(),
            None => pluralize(&model_name.to_lowercase()),
        }
    }

    /// 문서에 없는 최상위 필드에 기본값을 채웁니다.
    pub fn apply_defaults(&self, document: &mut Document) {
        for (field, default) in &self.defaults {
            if !document.contains_key(field) {
                document.insert(field.clone(), default.resolve());
            }
        }
    }

    /// 프로젝션이 선택한 필드 중 문서에 없는 필드에만 기본값을 채웁니다.
    ///
    /// 프로젝션에서 제외된 필드는 기본값으로도 되살리지 않습니다.
    pub fn apply_selected_defaults(&self, document: &mut Document, projection: Option<&Document>) {
        for (field, default) in &self.defaults {
            if !document.contains_key(field) && projection_selects(projection, field) {
                document.insert(field.clone(), default.resolve());
            }
        }
    }

    /// `present` 에 포함되지 않은 필드의 기본값만 모아 반환합니다.
    pub fn missing_defaults(&self, present: impl Fn(&str) -> bool) -> Document {
        let mut missing = Document::new();
        for (field, default) in &self.defaults {
            if !present(field) {
                missing.insert(field.clone(), default.resolve());
            }
        }
        missing
    }

    /// 드라이버 인덱스 모델로 변환합니다.
    pub fn index_models(&self) -> Vec<IndexModel> {
        self.indexes
            .iter()
            .map(|index| {
                IndexModel::builder()
                    .keys(index.keys.clone())
                    .options(IndexOptions::builder().unique(index.unique).build())
                    .build()
            })
            .collect()
    }
}

/// 프로젝션 값이 필드를 포함하는지 여부 (`0`, `false` 는 제외)
fn includes(value: &Bson) -> bool {
    match value {
        Bson::Int32(0) | Bson::Int64(0) | Bson::Boolean(false) => false,
        Bson::Double(v) => *v != 0.0,
        _ => true,
    }
}

/// 프로젝션이 최상위 필드 `field` 를 결과에 남기는지 판단합니다.
///
/// - 프로젝션 없음: 모든 필드
/// - 포함 프로젝션 (`_id` 외에 포함 값이 하나라도 있음): 포함으로 나열된 필드만
/// - 제외 프로젝션: 제외로 나열되지 않은 필드
pub fn projection_selects(projection: Option<&Document>, field: &str) -> bool {
    let Some(projection) = projection else {
        return true;
    };

    if field == "_id" {
        return projection.get("_id").map(includes).unwrap_or(true);
    }

    let inclusive = projection
        .iter()
        .any(|(key, value)| key != "_id" && includes(value));

    match projection.get(field) {
        Some(value) => includes(value),
        None => !inclusive,
    }
}

fn pluralize(name: &str) -> String {
    if name.is_empty() || name.ends_with('s') {
        return name.to_string();
    }

    if let Some(stem) = name.strip_suffix('y') {
        let before_y = stem.chars().last();
        if matches!(before_y, Some(c) if !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }

    if name.ends_with('x') || name.ends_with("ch") || name.ends_with("sh") {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime};

    #[test]
    fn test_collection_name_derived_from_model_name() {
        let schema = Schema::new();

        assert_eq!(schema.collection_name_for("User"), "users");
        assert_eq!(schema.collection_name_for("Category"), "categories");
        assert_eq!(schema.collection_name_for("Box"), "boxes");
        assert_eq!(schema.collection_name_for("Key"), "keys");
        assert_eq!(schema.collection_name_for("News"), "news");
    }

    #[test]
    fn test_explicit_collection_name() {
        let schema = Schema::new().collection("people");

        assert_eq!(schema.collection_name_for("User"), "people");
    }

    #[test]
    fn test_apply_defaults_keeps_existing_fields() {
        let schema = Schema::new()
            .default_value("age", 0)
            .default_value("active", false)
            .default_with("createdAt", || Bson::DateTime(DateTime::now()));
        let mut document = doc! { "name": "Test User", "age": 30 };

        schema.apply_defaults(&mut document);

        assert_eq!(document.get_i32("age").unwrap(), 30);
        assert!(!document.get_bool("active").unwrap());
        assert!(document.get_datetime("createdAt").is_ok());
    }

    #[test]
    fn test_selected_defaults_respect_projection() {
        let schema = Schema::new().default_value("age", 0).default_value("active", false);

        let mut included = doc! { "_id": 1, "name": "a" };
        schema.apply_selected_defaults(&mut included, Some(&doc! { "name": 1, "active": 1 }));
        assert_eq!(included, doc! { "_id": 1, "name": "a", "active": false });

        let mut excluded = doc! { "_id": 1, "name": "a" };
        schema.apply_selected_defaults(&mut excluded, Some(&doc! { "age": 0 }));
        assert_eq!(excluded, doc! { "_id": 1, "name": "a", "active": false });

        let mut unprojected = doc! { "_id": 1 };
        schema.apply_selected_defaults(&mut unprojected, None);
        assert_eq!(unprojected, doc! { "_id": 1, "age": 0, "active": false });
    }

    #[test]
    fn test_projection_selects() {
        let inclusive = doc! { "name": 1, "_id": 0 };
        let exclusive = doc! { "age": 0 };

        assert!(projection_selects(Some(&inclusive), "name"));
        assert!(!projection_selects(Some(&inclusive), "age"));
        assert!(!projection_selects(Some(&inclusive), "_id"));
        assert!(projection_selects(Some(&exclusive), "name"));
        assert!(!projection_selects(Some(&exclusive), "age"));
        assert!(projection_selects(Some(&exclusive), "_id"));
        assert!(projection_selects(Some(&doc! { "_id": 0 }), "age"));
    }

    #[test]
    fn test_missing_defaults() {
        let schema = Schema::new().default_value("age", 0).default_value("active", false);

        let missing = schema.missing_defaults(|field| field == "age");

        assert_eq!(missing, doc! { "active": false });
    }

    #[test]
    fn test_unique_fields() {
        let schema = Schema::new()
            .unique("email")
            .index(doc! { "name": 1, "age": -1 }, true)
            .index(doc! { "createdAt": -1 }, false);

        assert_eq!(schema.unique_fields(), vec!["email".to_string()]);
        assert_eq!(schema.index_models().len(), 3);
    }
}
