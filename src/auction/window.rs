//! 경매 기간
//! 시작 시각은 포함하지 않고(now > start), 종료 시각은 포함한다(now <= end).
// region:    --- Imports
use crate::config::ConfigError;
use crate::error::AppError;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

// endregion: --- Imports

/// config 테이블에 저장되는 시각 형식 (예: 2024-05-01 09:00:00 -0500)
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S %z";

pub const AUCTION_START_KEY: &str = "auction_start";
pub const AUCTION_END_KEY: &str = "auction_end";

// region:    --- Auction Window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowStatus {
    NotStarted,
    Open,
    Ended,
}

impl AuctionWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConfigError> {
        if end < start {
            return Err(ConfigError::Invalid {
                name: AUCTION_END_KEY.to_string(),
                reason: format!("end {} is before start {}", end, start),
            });
        }
        Ok(Self { start, end })
    }

    /// config 값(없을 수 있음)으로부터 경매 기간 생성
    pub fn from_config_values(
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let start = parse_time(AUCTION_START_KEY, start)?;
        let end = parse_time(AUCTION_END_KEY, end)?;
        Self::new(start, end)
    }

    /// 저장소 config 테이블에서 경매 기간 로드
    pub async fn load(store: &dyn AuctionStore) -> Result<Self, AppError> {
        let start = store.config_value(AUCTION_START_KEY).await?;
        let end = store.config_value(AUCTION_END_KEY).await?;
        Ok(Self::from_config_values(start.as_deref(), end.as_deref())?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        now > self.start
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_started(now) && !self.is_ended(now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> WindowStatus {
        if !self.is_started(now) {
            WindowStatus::NotStarted
        } else if self.is_ended(now) {
            WindowStatus::Ended
        } else {
            WindowStatus::Open
        }
    }
}

fn parse_time(name: &str, value: Option<&str>) -> Result<DateTime<Utc>, ConfigError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))?;

    DateTime::parse_from_str(value, TIME_LAYOUT)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ConfigError::Invalid {
            name: name.to_string(),
            reason: format!("{:?}: {}", value, e),
        })
}
// endregion: --- Auction Window

// endregion: --- Tests
