//! 리포지토리 계층 전역에서 사용하는 에러 시스템
//!
//! `thiserror` 기반의 단일 에러 타입을 제공합니다.
//! 저장소(MongoDB) 에러는 가공 없이 그대로 전달하고,
//! 유니크 제약 위반(코드 11000)만 [`RepositoryError::DuplicateKey`]로 변환합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::errors::RepositoryError;
//!
//! match repo.create(user).await {
//!     Ok(created) => println!("created {:?}", created.id()),
//!     Err(RepositoryError::DuplicateKey(field)) => println!("{} already exists", field),
//!     Err(e) => return Err(e),
//! }
//! ```

use mongodb::bson::Document;
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB가 유니크 인덱스 위반 시 보고하는 에러 코드
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// 리포지토리 계층 에러 타입
///
/// "찾을 수 없음"은 에러가 아닙니다. 단건 조회/변경은 `Ok(None)`으로 표현됩니다.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 유니크 제약 위반 (생성 시)
    ///
    /// 위반된 필드 이름을 담습니다. 호출자는 "이미 존재함"으로 취급하여
    /// 업데이트하거나 요청을 거절할 수 있습니다.
    #[error("Duplicate key {0} error")]
    DuplicateKey(String),

    /// MongoDB 드라이버 에러 (연결, 인증, 잘못된 쿼리 등)
    #[error("Database error: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    /// 드라이버 외의 [`Model`](crate::db::Model) 구현체가 보고한 코드 기반 에러
    #[error("Store error {code}: {message}")]
    ServerError {
        code: i32,
        message: String,
        /// 위반된 키/값 (유니크 제약 위반 시)
        key_value: Option<Document>,
    },

    /// BSON 직렬화/역직렬화 에러
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 레지스트리에 등록되지 않은 토큰 요청
    #[error("Provider not registered: {0}")]
    NotRegistered(String),

    /// 등록된 타입과 요청 타입이 다름
    #[error("Type mismatch for provider: {0}")]
    TypeMismatch(String),

    /// 설정값 누락 또는 파싱 실패
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// upsert가 결과 문서를 돌려주지 않은 경우
    #[error("Unexpected empty result: {0}")]
    UnexpectedEmptyResult(String),
}

impl RepositoryError {
    /// 저장소가 보고한 숫자 에러 코드를 반환합니다.
    ///
    /// 쓰기 에러와 커맨드 에러만 코드를 가집니다.
    pub fn store_code(&self) -> Option<i32> {
        match self {
            RepositoryError::DatabaseError(e) => match e.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(we)) => Some(we.code),
                ErrorKind::Command(ce) => Some(ce.code),
                _ => None,
            },
            RepositoryError::ServerError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// 유니크 제약 위반이면 위반된 필드 이름을 반환합니다.
    ///
    /// 드라이버는 서버 응답의 `keyValue`를 보존하지 않으므로
    /// 에러 메시지의 `dup key: { field: ... }` 부분에서 필드를 추출합니다.
    pub fn duplicate_key_field(&self) -> Option<String> {
        if self.store_code() != Some(DUPLICATE_KEY_CODE) {
            return None;
        }

        match self {
            RepositoryError::DatabaseError(e) => match e.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(we)) => parse_duplicate_key(&we.message),
                ErrorKind::Command(ce) => parse_duplicate_key(&ce.message),
                _ => None,
            },
            RepositoryError::ServerError { message, key_value, .. } => key_value
                .as_ref()
                .and_then(|kv| kv.keys().next().cloned())
                .or_else(|| parse_duplicate_key(message)),
            _ => None,
        }
    }
}

/// `E11000 duplicate key error ... dup key: { email: "a@b.c" }` 형식의 메시지에서
/// 첫 번째 키 이름을 추출합니다.
///
/// `dup key` 부분이 없으면 `index: email_1` 에서 인덱스 이름의 필드 부분을 사용합니다.
pub fn parse_duplicate_key(message: &str) -> Option<String> {
    if let Some(pos) = message.find("dup key: {") {
        let rest = message[pos + "dup key: {".len()..].trim_start();
        let key: String = rest
            .chars()
            .take_while(|c| *c != ':' && !c.is_whitespace())
            .collect();
        let key = key.trim_matches('"').to_string();
        if !key.is_empty() {
            return Some(key);
        }
    }

    let pos = message.find("index: ")?;
    let index_name: String = message[pos + "index: ".len()..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    // 기본 인덱스 이름은 `<field>_<direction>` 형태
    let field = match index_name.rsplit_once('_') {
        Some((field, dir)) if dir == "1" || dir == "-1" => field.to_string(),
        _ => index_name,
    };
    (!field.is_empty()).then_some(field)
}

impl From<mongodb::bson::ser::Error> for RepositoryError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        RepositoryError::SerializationError(e.to_string())
    }
}

impl From<mongodb::bson::de::Error> for RepositoryError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        RepositoryError::SerializationError(e.to_string())
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_duplicate_key_message() {
        let error = RepositoryError::DuplicateKey("email".to_string());

        assert_eq!(error.to_string(), "Duplicate key email error");
    }

    #[test]
    fn test_parse_duplicate_key_from_dup_key_section() {
        let message = r#"E11000 duplicate key error collection: test.users index: email_1 dup key: { email: "test@example.com" }"#;

        assert_eq!(parse_duplicate_key(message), Some("email".to_string()));
    }

    #[test]
    fn test_parse_duplicate_key_falls_back_to_index_name() {
        let message = "E11000 duplicate key error collection: test.users index: username_1";

        assert_eq!(parse_duplicate_key(message), Some("username".to_string()));
    }

    #[test]
    fn test_parse_duplicate_key_unrecognized_message() {
        assert_eq!(parse_duplicate_key("connection refused"), None);
    }

    #[test]
    fn test_server_error_duplicate_key_uses_key_value() {
        let error = RepositoryError::ServerError {
            code: DUPLICATE_KEY_CODE,
            message: "duplicate".to_string(),
            key_value: Some(doc! { "email": "a@b.c" }),
        };

        assert_eq!(error.store_code(), Some(DUPLICATE_KEY_CODE));
        assert_eq!(error.duplicate_key_field(), Some("email".to_string()));
    }

    #[test]
    fn test_other_codes_are_not_duplicate_keys() {
        let error = RepositoryError::ServerError {
            code: 121,
            message: "Document failed validation".to_string(),
            key_value: None,
        };

        assert_eq!(error.duplicate_key_field(), None);
        assert_eq!(RepositoryError::NotRegistered("x".into()).store_code(), None);
    }
}
