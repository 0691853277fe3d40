use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 이전 최고 입찰자가 밀려난 이벤트 (알림 대상)
    Outbid {
        item_id: i64,
        outbid_bidder: String,
        new_amount: Decimal,
        timestamp: DateTime<Utc>,
    },
}
