// region:    --- Imports
use crate::bidding::model::{Bid, ItemView, ItemWithBids, Winner};
use crate::error::AppError;
use crate::store::AuctionStore;
use rust_decimal::Decimal;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 최소 입찰가 조회
pub async fn effective_minimum_bid(
    store: &dyn AuctionStore,
    item_id: i64,
) -> Result<Decimal, AppError> {
    info!("{:<12} --> 최소 입찰가 조회 id: {}", "Query", item_id);
    let view = get_item(store, item_id).await?;
    Ok(view.min_bid)
}

/// 상품 조회
pub async fn get_item(store: &dyn AuctionStore, item_id: i64) -> Result<ItemView, AppError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    store.get_item(item_id).await?.ok_or(AppError::NotFound)
}

/// 모든 상품 조회
pub async fn list_items(store: &dyn AuctionStore) -> Result<Vec<ItemView>, AppError> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    Ok(store.list_items().await?)
}

/// 상품 입찰 이력 조회
pub async fn bids_for_item(store: &dyn AuctionStore, item_id: i64) -> Result<Vec<Bid>, AppError> {
    info!("{:<12} --> 상품 입찰 이력 조회 id: {}", "Query", item_id);
    if store.get_item(item_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(store.bids_for_item(item_id).await?)
}

/// 입찰이 있는 상품과 입찰 이력 조회
pub async fn list_items_with_bids(store: &dyn AuctionStore) -> Result<Vec<ItemWithBids>, AppError> {
    info!("{:<12} --> 입찰 상품 조회", "Query");
    Ok(store.items_with_bids().await?)
}

/// 낙찰자 조회
pub async fn list_winners(store: &dyn AuctionStore) -> Result<Vec<Winner>, AppError> {
    info!("{:<12} --> 낙찰자 조회", "Query");
    Ok(store.winners().await?)
}

// endregion: --- Query Handlers

// endregion: --- Tests
