//! 경매 저장소
//!
//! 상품(수정 가능)과 입찰(추가 전용)을 보관한다. 모든 구현체는
//! `place_bid`에 대해 같은 원자성 계약을 지켜야 한다:
//!
//! 한 상품에 대한 "최소 입찰가 확인 + 입찰 추가"는 같은 상품의 다른
//! `place_bid` 호출과 선형화된다. 동시에 들어온 두 호출이 같은 이전 상태를
//! 보고 둘 다 성공하는 일은 없다. 서로 다른 상품은 독립적으로 진행된다.
// region:    --- Imports
use crate::bidding::model::{
    Bid, BidWithContact, Item, ItemView, ItemWithBids, NewItem, UserContact, Winner,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Imports

// region:    --- Store Error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store lock poisoned")]
    Poisoned,
}
// endregion: --- Store Error

// region:    --- Ledger Write
/// 원자적 입찰 추가 결과
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerWrite {
    /// 입찰이 추가됨
    Appended { prior_bidder: Option<String> },
    /// 최소 입찰가 미만
    TooLow {
        prior_bidder: Option<String>,
        minimum: Decimal,
    },
    NoSuchItem,
    DisplayOnly,
}
// endregion: --- Ledger Write

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 최소 입찰가 확인과 입찰 추가를 하나의 원자적 연산으로 수행
    async fn place_bid(
        &self,
        item_id: i64,
        amount: Decimal,
        bidder: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError>;

    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError>;

    /// 상품 수정 (없으면 None)
    async fn update_item(&self, id: i64, item: &NewItem) -> Result<Option<Item>, StoreError>;

    async fn get_item(&self, id: i64) -> Result<Option<ItemView>, StoreError>;

    /// id 오름차순
    async fn list_items(&self) -> Result<Vec<ItemView>, StoreError>;

    /// 최신 입찰 순
    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError>;

    /// 입찰이 있는 상품만, id 오름차순, 입찰은 최신 순
    async fn items_with_bids(&self) -> Result<Vec<ItemWithBids>, StoreError>;

    /// 입찰이 있는 상품의 최고 입찰, id 오름차순
    async fn winners(&self) -> Result<Vec<Winner>, StoreError>;

    async fn user_contact(&self, user_name: &str) -> Result<Option<UserContact>, StoreError>;

    async fn config_value(&self, name: &str) -> Result<Option<String>, StoreError>;
}

pub type SharedAuctionStore = Arc<dyn AuctionStore>;
// endregion: --- Auction Store Trait

pub(crate) fn group_bids(items: Vec<Item>, bids: Vec<BidWithContact>) -> Vec<ItemWithBids> {
    items
        .into_iter()
        .filter_map(|item| {
            let item_bids: Vec<BidWithContact> = bids
                .iter()
                .filter(|b| b.bid.item_id == item.id)
                .cloned()
                .collect();
            if item_bids.is_empty() {
                None
            } else {
                Some(ItemWithBids {
                    item,
                    bids: item_bids,
                })
            }
        })
        .collect()
}
