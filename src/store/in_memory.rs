use super::{group_bids, AuctionStore, LedgerWrite, StoreError};
use crate::bidding::model::{
    contact_or_placeholder, effective_minimum, Bid, BidWithContact, Item, ItemView, ItemWithBids,
    LeadingBid, NewItem, UserContact, Winner,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex as ItemLock;

#[derive(Default)]
struct Tables {
    items: BTreeMap<i64, Item>,
    bids: Vec<Bid>,
    users: HashMap<String, UserContact>,
    config: HashMap<String, String>,
    next_item_id: i64,
    next_bid_id: i64,
}

impl Tables {
    fn leading_bid(&self, item_id: i64) -> Option<&Bid> {
        // 금액, 입찰 시각, id 순 (GET_LEADING_BID와 같은 순서)
        self.bids
            .iter()
            .filter(|b| b.item_id == item_id)
            .max_by(|a, b| {
                a.amount
                    .cmp(&b.amount)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            })
    }

    fn view(&self, item: &Item) -> ItemView {
        let leading = self.leading_bid(item.id).map(|b| LeadingBid {
            bidder: b.bidder.clone(),
            amount: b.amount,
            created_at: b.created_at,
        });
        ItemView::new(item.clone(), leading)
    }
}

/// Fake in-memory store.
///
/// Useful for unit-tests. 같은 상품의 입찰은 상품별 비동기 뮤텍스로 직렬화한다.
#[derive(Default, Clone)]
pub struct InMemoryAuctionStore {
    tables: Arc<RwLock<Tables>>,
    item_locks: Arc<Mutex<HashMap<i64, Arc<ItemLock<()>>>>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 연락처 등록 (인증 서비스 대역)
    pub fn add_user(&self, user_name: &str, full_name: &str, email: &str) -> Result<(), StoreError> {
        self.write()?.users.insert(
            user_name.to_string(),
            UserContact {
                user_name: user_name.to_string(),
                full_name: full_name.to_string(),
                email: email.to_string(),
            },
        );
        Ok(())
    }

    pub fn set_config(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.write()?
            .config
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// 저장된 입찰 수
    pub fn bid_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.bids.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    fn locks(&self) -> Result<MutexGuard<'_, HashMap<i64, Arc<ItemLock<()>>>>, StoreError> {
        self.item_locks.lock().map_err(|_| StoreError::Poisoned)
    }

    fn item_lock(&self, item_id: i64) -> Result<Arc<ItemLock<()>>, StoreError> {
        Ok(self.locks()?.entry(item_id).or_default().clone())
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn place_bid(
        &self,
        item_id: i64,
        amount: Decimal,
        bidder: &str,
        at: DateTime<Utc>,
    ) -> Result<LedgerWrite, StoreError> {
        // 상품은 삭제되지 않으므로 존재 확인 후 잠금을 만든다
        if !self.read()?.items.contains_key(&item_id) {
            return Ok(LedgerWrite::NoSuchItem);
        }
        let lock = self.item_lock(item_id)?;
        let _guard = lock.lock().await;

        let (opening_bid, min_bid_incr, leading) = {
            let tables = self.read()?;
            let Some(item) = tables.items.get(&item_id) else {
                return Ok(LedgerWrite::NoSuchItem);
            };
            if item.is_display_only() {
                return Ok(LedgerWrite::DisplayOnly);
            }
            let leading = tables
                .leading_bid(item_id)
                .map(|b| (b.bidder.clone(), b.amount));
            (item.opening_bid, item.min_bid_incr, leading)
        };

        let minimum = effective_minimum(opening_bid, min_bid_incr, leading.as_ref().map(|l| l.1));
        let prior_bidder = leading.map(|l| l.0);
        if amount < minimum {
            return Ok(LedgerWrite::TooLow {
                prior_bidder,
                minimum,
            });
        }

        let mut tables = self.write()?;
        tables.next_bid_id += 1;
        let id = tables.next_bid_id;
        tables.bids.push(Bid {
            id,
            item_id,
            bidder: bidder.to_string(),
            amount,
            created_at: at,
        });
        Ok(LedgerWrite::Appended { prior_bidder })
    }

    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError> {
        let mut tables = self.write()?;
        tables.next_item_id += 1;
        let created = Item {
            id: tables.next_item_id,
            title: item.title.clone(),
            description: item.description.clone(),
            artist: item.artist.clone(),
            image_file_name: item.image_file_name.clone(),
            opening_bid: item.opening_bid,
            min_bid_incr: item.min_bid_incr,
            created_at: Utc::now(),
        };
        tables.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_item(&self, id: i64, item: &NewItem) -> Result<Option<Item>, StoreError> {
        let mut tables = self.write()?;
        let Some(existing) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        existing.title = item.title.clone();
        existing.description = item.description.clone();
        existing.artist = item.artist.clone();
        existing.image_file_name = item.image_file_name.clone();
        existing.opening_bid = item.opening_bid;
        existing.min_bid_incr = item.min_bid_incr;
        Ok(Some(existing.clone()))
    }

    async fn get_item(&self, id: i64) -> Result<Option<ItemView>, StoreError> {
        let tables = self.read()?;
        Ok(tables.items.get(&id).map(|item| tables.view(item)))
    }

    async fn list_items(&self) -> Result<Vec<ItemView>, StoreError> {
        let tables = self.read()?;
        Ok(tables.items.values().map(|item| tables.view(item)).collect())
    }

    async fn bids_for_item(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        let tables = self.read()?;
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| b.item_id == item_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bids)
    }

    async fn items_with_bids(&self) -> Result<Vec<ItemWithBids>, StoreError> {
        let tables = self.read()?;
        let mut bids: Vec<BidWithContact> = tables
            .bids
            .iter()
            .map(|b| BidWithContact::new(b.clone(), tables.users.get(&b.bidder)))
            .collect();
        bids.sort_by(|a, b| {
            a.bid
                .item_id
                .cmp(&b.bid.item_id)
                .then(b.bid.created_at.cmp(&a.bid.created_at))
                .then(b.bid.id.cmp(&a.bid.id))
        });
        let items = tables.items.values().cloned().collect();
        Ok(group_bids(items, bids))
    }

    async fn winners(&self) -> Result<Vec<Winner>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .items
            .values()
            .filter_map(|item| {
                let leading = tables.leading_bid(item.id)?;
                let (full_name, email) = contact_or_placeholder(tables.users.get(&leading.bidder));
                Some(Winner {
                    item_id: item.id,
                    title: item.title.clone(),
                    artist: item.artist.clone(),
                    amount: leading.amount,
                    bid_at: leading.created_at,
                    bidder: leading.bidder.clone(),
                    full_name,
                    email,
                })
            })
            .collect())
    }

    async fn user_contact(&self, user_name: &str) -> Result<Option<UserContact>, StoreError> {
        Ok(self.read()?.users.get(user_name).cloned())
    }

    async fn config_value(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.config.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_item(opening: Decimal, incr: Decimal) -> NewItem {
        NewItem {
            title: "Clock".to_string(),
            description: "Brass".to_string(),
            artist: "Maker".to_string(),
            image_file_name: "clock.jpg".to_string(),
            opening_bid: opening,
            min_bid_incr: incr,
        }
    }

    #[tokio::test]
    async fn unknown_item_does_not_allocate_a_lock() {
        let store = InMemoryAuctionStore::new();
        store
            .create_item(&new_item(Decimal::new(10, 0), Decimal::ONE))
            .await
            .unwrap();

        for item_id in [7, 8, 9] {
            let write = store
                .place_bid(item_id, Decimal::new(10, 0), "alice", Utc::now())
                .await
                .unwrap();
            assert_eq!(write, LedgerWrite::NoSuchItem);
        }
        assert!(store.locks().unwrap().is_empty());

        store
            .place_bid(1, Decimal::new(10, 0), "alice", Utc::now())
            .await
            .unwrap();
        assert_eq!(store.locks().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn equal_amounts_prefer_the_newest_timestamp() {
        let store = InMemoryAuctionStore::new();
        store
            .create_item(&new_item(Decimal::new(10, 0), Decimal::ZERO))
            .await
            .unwrap();
        let t0 = Utc::now();

        // 나중 시각의 입찰이 먼저 저장됨
        store
            .place_bid(1, Decimal::new(10, 0), "late", t0 + Duration::minutes(5))
            .await
            .unwrap();
        let write = store
            .place_bid(1, Decimal::new(10, 0), "early", t0)
            .await
            .unwrap();
        assert_eq!(
            write,
            LedgerWrite::Appended {
                prior_bidder: Some("late".to_string())
            }
        );

        let view = store.get_item(1).await.unwrap().unwrap();
        assert_eq!(view.bidder.as_deref(), Some("late"));
        let winners = store.winners().await.unwrap();
        assert_eq!(winners[0].bidder, "late");
    }
}
