//! 애플리케이션 설정
//! 환경 변수에서 읽어온다. 경매 시작/종료 시각은 DB config 테이블에서 읽는다.
// region:    --- Imports
use std::env;
use thiserror::Error;
use tracing::info;

// endregion: --- Imports

// region:    --- Config Error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing config value: {0}")]
    Missing(String),
    #[error("invalid config value {name}: {reason}")]
    Invalid { name: String, reason: String },
}
// endregion: --- Config Error

// region:    --- App Config
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TITLE: &str = "Charity Auction";
const DEFAULT_MAIL_FROM: &str = "auction@localhost";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 애플리케이션 설정 모델
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub base_url: String,
    pub title: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub db_max_connections: u32,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 조회 함수로부터 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url =
            get("DATABASE_URL").ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse::<u32>().map_err(|e| ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS".to_string(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            database_url,
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            base_url: get("BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            title: get("AUCTION_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            mail_relay_url: get("MAIL_RELAY_URL"),
            mail_from: get("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            db_max_connections,
        };

        info!(
            "{:<12} --> 설정 로드: listen={}, base_url={}",
            "Config", config.listen_addr, config.base_url
        );
        Ok(config)
    }
}
// endregion: --- App Config

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn database_url_is_required() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(name) if name == "DATABASE_URL"));
    }

    #[test]
    fn defaults_are_applied() {
        let config =
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/auction")]))
                .unwrap();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.db_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.mail_relay_url.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/auction"),
            ("BASE_URL", "https://bid.example.org/"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://bid.example.org");
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn invalid_pool_size_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/auction"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
// endregion: --- Tests
