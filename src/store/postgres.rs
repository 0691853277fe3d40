// region:    --- Imports
use super::{group_bids, AuctionStore, LedgerWrite, StoreError};
use crate::bidding::model::{
    effective_minimum, Bid, BidWithContact, Item, ItemView, ItemWithBids, LeadingBid, NewItem,
    UserContact, Winner,
};
use crate::database::DatabaseManager;
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Rows
#[derive(sqlx::FromRow)]
struct BidTerms {
    opening_bid: Decimal,
    min_bid_incr: Decimal,
}

#[derive(sqlx::FromRow)]
struct LeadingBidRow {
    bidder: String,
    amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct ItemViewRow {
    #[sqlx(flatten)]
    item: Item,
    leading_bidder: Option<String>,
    leading_amount: Option<Decimal>,
    leading_at: Option<DateTime<Utc>>,
}

impl From<ItemViewRow> for ItemView {
    fn from(row: ItemViewRow) -> Self {
        let leading = match (row.leading_bidder, row.leading_amount, row.leading_at) {
            (Some(bidder), Some(amount), Some(created_at)) => Some(LeadingBid {
                bidder,
                amount,
                created_at,
            }),
            _ => None,
        };
        ItemView::new(row.item, leading)
    }
}
// endregion: --- Rows

// region:    --- Postgres Store
/// PostgreSQL 저장소
/// 입찰은 상품 행 잠금(SELECT ... FOR UPDATE) 안에서 확인 후 추가한다.
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn place_bid(
        &self,
        item_id: i64,
        amount: Decimal,
        bidder: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError> {
        let bidder = bidder.to_string();
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    // 상품 행 잠금: 같은 상품의 다른 입찰은 커밋까지 대기
                    let terms = sqlx::query_as::<_, BidTerms>(queries::LOCK_ITEM_FOR_BID)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    let Some(terms) = terms else {
                        return Ok(LedgerWrite::NoSuchItem);
                    };
                    if terms.opening_bid.is_zero() {
                        return Ok(LedgerWrite::DisplayOnly);
                    }

                    let leading = sqlx::query_as::<_, LeadingBidRow>(queries::GET_LEADING_BID)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    let minimum = effective_minimum(
                        terms.opening_bid,
                        terms.min_bid_incr,
                        leading.as_ref().map(|l| l.amount),
                    );
                    let prior_bidder = leading.map(|l| l.bidder);

                    if amount < minimum {
                        debug!(
                            "{:<12} --> 최소 입찰가 미달: item={}, amount={}, minimum={}",
                            "Store", item_id, amount, minimum
                        );
                        return Ok(LedgerWrite::TooLow {
                            prior_bidder,
                            minimum,
                        });
                    }

                    sqlx::query(queries::INSERT_BID)
                        .bind(item_id)
                        .bind(&bidder)
                        .bind(amount)
                        .bind(at)
                        .execute(&mut **tx)
                        .await?;

                    info!(
                        "{:<12} --> 입찰 추가: item={}, bidder={}, amount={}",
                        "Store", item_id, bidder, amount
                    );
                    Ok(LedgerWrite::Appended { prior_bidder })
                })
            })
            .await
    }

    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError> {
        let created = sqlx::query_as::<_, Item>(queries::INSERT_ITEM)
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.artist)
            .bind(&item.image_file_name)
            .bind(item.opening_bid)
            .bind(item.min_bid_incr)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(created)
    }

    async fn update_item(&self, id: i64, item: &NewItem) -> Result<Option<Item>, StoreError> {
        let updated = sqlx::query_as::<_, Item>(queries::UPDATE_ITEM)
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.artist)
            .bind(&item.image_file_name)
            .bind(item.opening_bid)
            .bind(item.min_bid_incr)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(updated)
    }

    async fn get_item(&self, id: i64) -> Result<Option<ItemView>, StoreError> {
        let row = sqlx::query_as::<_, ItemViewRow>(&queries::get_item_view())
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(row.map(ItemView::from))
    }

    async fn list_items(&self) -> Result<Vec<ItemView>, StoreError> {
        let rows = sqlx::query_as::<_, ItemViewRow>(&queries::get_all_item_views())
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(rows.into_iter().map(ItemView::from).collect())
    }

    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
            .bind(item_id)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(bids)
    }

    async fn items_with_bids(&self) -> Result<Vec<ItemWithBids>, StoreError> {
        // 두 조회가 같은 스냅샷을 보도록 하나의 트랜잭션에서 실행
        let (items, bids) = self
            .db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let items = sqlx::query_as::<_, Item>(queries::GET_ITEMS_WITH_BIDS)
                        .fetch_all(&mut **tx)
                        .await?;
                    let bids = sqlx::query_as::<_, BidWithContact>(queries::GET_BIDS_WITH_CONTACT)
                        .fetch_all(&mut **tx)
                        .await?;
                    Ok::<_, StoreError>((items, bids))
                })
            })
            .await?;
        Ok(group_bids(items, bids))
    }

    async fn winners(&self) -> Result<Vec<Winner>, StoreError> {
        let winners = sqlx::query_as::<_, Winner>(queries::GET_WINNERS)
            .fetch_all(self.db_manager.pool())
            .await?;
        Ok(winners)
    }

    async fn user_contact(&self, user_name: &str) -> Result<Option<UserContact>, StoreError> {
        let contact = sqlx::query_as::<_, UserContact>(queries::GET_USER_CONTACT)
            .bind(user_name)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(contact)
    }

    async fn config_value(&self, name: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(queries::GET_CONFIG_VALUE)
            .bind(name)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(value)
    }
}
// endregion: --- Postgres Store
