//! Entity Trait
//!
//! 리포지토리가 다루는 레코드 타입이 갖춰야 할 최소 조건을 정의합니다.

use mongodb::bson::oid::ObjectId;
use serde::{de::DeserializeOwned, Serialize};

/// `_id` 필드를 가진 영속 레코드
///
/// [`RepositoryService`](crate::repositories::RepositoryService)의 타입 파라미터는
/// 이 trait으로 제한됩니다. 식별자는 생성 시 클라이언트에서 할당되므로
/// 직렬화 시 `_id` 필드가 비어 있으면 생략되도록 선언하는 것이 일반적입니다.
///
/// 프로젝션 조회 결과도 같은 타입으로 역직렬화되므로, 프로젝션에서 빠질 수 있는
/// 필드는 `Option` 이나 `#[serde(default)]` 로 선언해야 합니다.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub email: String,
///     #[serde(default)]
///     pub age: i32,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> Option<ObjectId> { self.id }
///     fn set_id(&mut self, id: ObjectId) { self.id = Some(id); }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 저장된 식별자. 아직 저장되지 않은 레코드는 `None`
    fn id(&self) -> Option<ObjectId>;

    /// 식별자를 할당합니다.
    fn set_id(&mut self, id: ObjectId);
}
