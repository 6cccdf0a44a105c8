//! 데이터베이스 및 실행 환경 설정 관리 모듈
//!
//! MongoDB 연결과 인덱스 동기화 관련 설정을 환경 변수에서 읽어옵니다.

use std::env;
use log::{error, info};

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 개발 환경
    Development,
    /// 테스트 환경 - 자동화된 테스트용 설정
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    pub fn current() -> Self {
        Self::from_str(&env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()))
    }

    /// 문자열에서 Environment를 생성합니다. 알 수 없는 값은 `Production`입니다.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

/// MongoDB 연결 설정
///
/// ## Environment Variables
///
/// - `MONGODB_URI`: 연결 URI (기본값: `mongodb://localhost:27017`)
/// - `DATABASE_NAME`: 데이터베이스 이름 (기본값: `repository_dev`)
/// - `MONGODB_APP_NAME`: 드라이버에 전달할 애플리케이션 이름
/// - `AUTO_INDEX`: 모델 등록 시 스키마 인덱스 생성 여부 (기본값: 프로덕션 외 `true`)
pub struct DatabaseConfig;

impl DatabaseConfig {
    pub fn uri() -> String {
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    pub fn database_name() -> String {
        env::var("DATABASE_NAME").unwrap_or_else(|_| "repository_dev".to_string())
    }

    pub fn app_name() -> String {
        env::var("MONGODB_APP_NAME").unwrap_or_else(|_| "mongo_repository".to_string())
    }

    /// 모델 생성 시 스키마에 선언된 인덱스를 생성할지 여부
    ///
    /// `AUTO_INDEX` 가 없으면 프로덕션에서는 끄고 그 외 환경에서는 켭니다.
    pub fn auto_index() -> bool {
        let default = Environment::current() != Environment::Production;
        env::var("AUTO_INDEX")
            .map(|v| Self::parse_flag(&v, default))
            .unwrap_or(default)
    }

    fn parse_flag(value: &str, default: bool) -> bool {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                error!("AUTO_INDEX 파싱 실패: {}. 기본값 {} 사용", other, default);
                default
            }
        }
    }
}

/// 프로필별 .env 파일을 로드합니다
///
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * 기타 - 기본 .env 파일 로드
pub fn load_env_file() {
    let profile = env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    info!("Current profile: {}", profile);

    match profile.as_str() {
        "prod" => match dotenv::from_filename(".env.prod") {
            Ok(_) => info!(".env.prod 파일 로드 됨"),
            Err(e) => error!(".env.prod 파일 로드 실패: {}", e),
        },
        "dev" => match dotenv::from_filename(".env.dev") {
            Ok(_) => info!(".env.dev 파일 로드 됨"),
            Err(e) => error!(".env.dev 파일 로드 실패: {}", e),
        },
        _ => {
            dotenv::dotenv().ok();
            info!("기본 .env 파일 로드");
        }
    }
}
