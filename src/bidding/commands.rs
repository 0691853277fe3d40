//! 입찰 관련 커맨드 처리
//! 1. 입찰
//! 2. 상품 생성
//! 3. 상품 수정
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::AuctionWindow;
use crate::bidding::model::{fits_money_column, Item, NewItem};
use crate::bidding::outcome::{BidOutcome, BidResult};
use crate::error::AppError;
use crate::notification::NotificationDispatcher;
use crate::store::{AuctionStore, LedgerWrite, SharedAuctionStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub bidder: String,
    pub amount: Decimal,
}
// endregion: --- Commands

// region:    --- Bid Ledger
/// 입찰 원장
///
/// 경매 기간 확인, 입력 검증, 저장소의 원자적 입찰 추가를 차례로 수행하고
/// 최고 입찰자가 바뀌면 알림을 요청한다.
#[derive(Clone)]
pub struct BidLedger {
    store: SharedAuctionStore,
    window: AuctionWindow,
    dispatcher: Option<NotificationDispatcher>,
}

impl BidLedger {
    pub fn new(
        store: SharedAuctionStore,
        window: AuctionWindow,
        dispatcher: Option<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            window,
            dispatcher,
        }
    }

    pub fn window(&self) -> &AuctionWindow {
        &self.window
    }

    /// 1. 입찰
    pub async fn handle_place_bid(&self, cmd: PlaceBidCommand) -> Result<BidResult, AppError> {
        self.place_bid_at(cmd, Utc::now()).await
    }

    /// 주어진 시각 기준 입찰
    pub async fn place_bid_at(
        &self,
        cmd: PlaceBidCommand,
        now: DateTime<Utc>,
    ) -> Result<BidResult, AppError> {
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

        if !self.window.is_open(now) {
            info!(
                "{:<12} --> 경매 기간이 아님: status={:?}",
                "Command",
                self.window.status(now)
            );
            return Ok(BidResult::rejected(BidOutcome::AuctionClosed));
        }
        if cmd.bidder.trim().is_empty() {
            return Ok(BidResult::rejected(BidOutcome::InvalidUser));
        }
        if !is_valid_amount(cmd.amount) {
            return Ok(BidResult::rejected(BidOutcome::InvalidAmount));
        }

        let write = self
            .store
            .place_bid(cmd.item_id, cmd.amount, &cmd.bidder, now)
            .await
            .map_err(|e| {
                error!("{:<12} --> 입찰 저장 실패: {:?} ({:?})", "Command", e, cmd);
                AppError::Storage(e)
            })?;

        let result = match write {
            LedgerWrite::Appended { prior_bidder } => BidResult {
                outcome: BidOutcome::Placed,
                prior_bidder,
            },
            LedgerWrite::TooLow {
                prior_bidder,
                minimum,
            } => {
                info!(
                    "{:<12} --> 입찰 금액 부족: amount={}, minimum={}",
                    "Command", cmd.amount, minimum
                );
                BidResult {
                    outcome: BidOutcome::TooLow,
                    prior_bidder,
                }
            }
            LedgerWrite::NoSuchItem => BidResult::rejected(BidOutcome::NoSuchItem),
            LedgerWrite::DisplayOnly => BidResult::rejected(BidOutcome::DisplayOnly),
        };

        if result.placed() {
            info!(
                "{:<12} --> 입찰 성공: item={}, bidder={}, amount={}",
                "Command", cmd.item_id, cmd.bidder, cmd.amount
            );
            self.publish(&cmd, &result, now);
        }
        Ok(result)
    }

    // 알림 요청 (입찰 결과와 무관하게 별도 태스크에서 처리)
    fn publish(&self, cmd: &PlaceBidCommand, result: &BidResult, now: DateTime<Utc>) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        if let Some(prior) = result.notify_target(&cmd.bidder) {
            dispatcher.dispatch(AuctionEvent::Outbid {
                item_id: cmd.item_id,
                outbid_bidder: prior.to_string(),
                new_amount: cmd.amount,
                timestamp: now,
            });
        }
    }
}

/// 양수이고 NUMERIC(12,2)에 그대로 저장되는 금액만 허용
fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && fits_money_column(amount)
}
// endregion: --- Bid Ledger

// region:    --- Catalog Commands
/// 2. 상품 생성
pub async fn handle_create_item(
    store: &dyn AuctionStore,
    new_item: NewItem,
) -> Result<Item, AppError> {
    info!("{:<12} --> 상품 생성: {}", "Command", new_item.title);
    new_item.validate()?;
    Ok(store.create_item(&new_item).await?)
}

/// 3. 상품 수정
pub async fn handle_update_item(
    store: &dyn AuctionStore,
    item_id: i64,
    new_item: NewItem,
) -> Result<Item, AppError> {
    info!("{:<12} --> 상품 수정 id: {}", "Command", item_id);
    new_item.validate()?;
    store
        .update_item(item_id, &new_item)
        .await?
        .ok_or(AppError::NotFound)
}
// endregion: --- Catalog Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAuctionStore;
    use chrono::Duration;
    use std::sync::Arc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(opening: &str, incr: &str) -> NewItem {
        NewItem {
            title: "Quilt".to_string(),
            description: "Patchwork".to_string(),
            artist: "Guild".to_string(),
            image_file_name: "quilt.png".to_string(),
            opening_bid: d(opening),
            min_bid_incr: d(incr),
        }
    }

    async fn ledger_with(items: &[NewItem]) -> (InMemoryAuctionStore, BidLedger, DateTime<Utc>) {
        let store = InMemoryAuctionStore::new();
        for i in items {
            store.create_item(i).await.unwrap();
        }
        let now = Utc::now();
        let window = AuctionWindow::new(now - Duration::hours(1), now + Duration::hours(1)).unwrap();
        let ledger = BidLedger::new(Arc::new(store.clone()), window, None);
        (store, ledger, now)
    }

    fn bid(item_id: i64, bidder: &str, amount: &str) -> PlaceBidCommand {
        PlaceBidCommand {
            item_id,
            bidder: bidder.to_string(),
            amount: d(amount),
        }
    }

    #[tokio::test]
    async fn opening_bid_is_accepted_and_raises_minimum() {
        let (store, ledger, now) = ledger_with(&[item("5", "1")]).await;

        let result = ledger.place_bid_at(bid(1, "alice", "5.00"), now).await.unwrap();
        assert_eq!(result.outcome, BidOutcome::Placed);
        assert_eq!(result.message(), "Bid placed");
        assert_eq!(result.prior_bidder, None);

        let view = store.get_item(1).await.unwrap().unwrap();
        assert_eq!(view.min_bid, d("6.00"));
    }

    #[tokio::test]
    async fn below_opening_bid_is_too_low() {
        let (store, ledger, now) = ledger_with(&[item("5", "1")]).await;

        let result = ledger.place_bid_at(bid(1, "alice", "4.99"), now).await.unwrap();
        assert_eq!(result.message(), "Bid too low");
        assert_eq!(store.bid_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_window_touches_nothing() {
        let (store, ledger, _now) = ledger_with(&[item("5", "1")]).await;
        let window = ledger.window();

        for at in [window.start(), window.end() + Duration::seconds(1)] {
            let result = ledger.place_bid_at(bid(1, "alice", "50"), at).await.unwrap();
            assert_eq!(result.outcome, BidOutcome::AuctionClosed);
        }
        let at_end = ledger.place_bid_at(bid(1, "alice", "50"), window.end()).await.unwrap();
        assert!(at_end.placed());
        assert_eq!(store.bid_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_blank_bidder_before_amount() {
        let (_store, ledger, now) = ledger_with(&[item("5", "1")]).await;

        let result = ledger.place_bid_at(bid(1, "  ", "-1"), now).await.unwrap();
        assert_eq!(result.outcome, BidOutcome::InvalidUser);
    }

    #[tokio::test]
    async fn rejects_non_positive_and_sub_cent_amounts() {
        let (_store, ledger, now) = ledger_with(&[item("5", "1")]).await;

        for amount in ["0", "-3", "5.001", "10000000000", "100000000000"] {
            let result = ledger.place_bid_at(bid(1, "alice", amount), now).await.unwrap();
            assert_eq!(result.outcome, BidOutcome::InvalidAmount, "amount {}", amount);
        }
        let result = ledger.place_bid_at(bid(1, "alice", "5.100"), now).await.unwrap();
        assert!(result.placed());
    }

    #[tokio::test]
    async fn unknown_and_display_only_items() {
        let (store, ledger, now) = ledger_with(&[item("0", "1")]).await;

        let missing = ledger.place_bid_at(bid(42, "alice", "10"), now).await.unwrap();
        assert_eq!(missing.message(), "No such item");

        let display = ledger.place_bid_at(bid(1, "alice", "10"), now).await.unwrap();
        assert_eq!(display.message(), "Display only item");
        assert_eq!(store.bid_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn reports_prior_bidder() {
        let (_store, ledger, now) = ledger_with(&[item("10", "1")]).await;

        ledger.place_bid_at(bid(1, "alice", "10"), now).await.unwrap();
        let result = ledger.place_bid_at(bid(1, "bob", "15"), now).await.unwrap();
        assert!(result.placed());
        assert_eq!(result.prior_bidder.as_deref(), Some("alice"));
        assert_eq!(result.notify_target("bob"), Some("alice"));

        let low = ledger.place_bid_at(bid(1, "carol", "15"), now).await.unwrap();
        assert_eq!(low.outcome, BidOutcome::TooLow);
        assert_eq!(low.prior_bidder.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn create_and_update_validate_input() {
        let store = InMemoryAuctionStore::new();

        let mut bad = item("10", "1");
        bad.title = String::new();
        assert!(matches!(
            handle_create_item(&store, bad.clone()).await,
            Err(AppError::Validation(_))
        ));

        let created = handle_create_item(&store, item("10", "1")).await.unwrap();
        let mut changed = item("12", "2");
        changed.title = "Quilt (large)".to_string();
        let updated = handle_update_item(&store, created.id, changed.clone())
            .await
            .unwrap();
        assert_eq!(updated.title, "Quilt (large)");
        assert_eq!(updated.opening_bid, d("12"));

        assert!(matches!(
            handle_update_item(&store, 99, changed).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            handle_update_item(&store, created.id, bad).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn out_of_range_increment_is_rejected_before_storage() {
        let store = InMemoryAuctionStore::new();

        let mut huge = item("1", "1");
        huge.min_bid_incr = Decimal::MAX;
        assert!(matches!(
            handle_create_item(&store, huge).await,
            Err(AppError::Validation(_))
        ));
        assert!(store.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn largest_storable_bid_is_accepted() {
        let (_store, ledger, now) = ledger_with(&[item("5", "1")]).await;

        let result = ledger
            .place_bid_at(bid(1, "alice", "9999999999.99"), now)
            .await
            .unwrap();
        assert!(result.placed());

        // 최소 입찰가가 상한을 넘으면 더 이상 유효한 입찰이 없다
        let next = ledger
            .place_bid_at(bid(1, "bob", "9999999999.99"), now)
            .await
            .unwrap();
        assert_eq!(next.outcome, BidOutcome::TooLow);
    }
}
// endregion: --- Tests
