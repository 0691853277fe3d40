// region:    --- Imports
use crate::auction::WindowStatus;
use crate::bidding::commands::{self, BidLedger, PlaceBidCommand};
use crate::bidding::model::NewItem;
use crate::bidding::outcome::{BidOutcome, PLACE_BID_ERROR};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::query;
use crate::store::SharedAuctionStore;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

// endregion: --- Imports

/// 인증 서비스가 넣어주는 사용자 이름 헤더
pub const AUTH_USER_HEADER: &str = "x-auth-user";
/// 관리자 여부 헤더 ("true")
pub const AUTH_ADMIN_HEADER: &str = "x-auth-admin";

// region:    --- App State
#[derive(Clone)]
pub struct AppState {
    pub store: SharedAuctionStore,
    pub ledger: BidLedger,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: SharedAuctionStore, ledger: BidLedger, config: AppConfig) -> Self {
        Self {
            store,
            ledger,
            config: Arc::new(config),
        }
    }
}
// endregion: --- App State

// region:    --- Router
pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auction", get(handle_get_auction))
        .route("/items", get(handle_get_items).post(handle_create_item))
        .route("/items/:id", get(handle_get_item).put(handle_update_item))
        .route("/items/:id/minimum-bid", get(handle_get_minimum_bid))
        .route(
            "/items/:id/bids",
            get(handle_get_item_bids).post(handle_place_bid),
        )
        .route("/bids", get(handle_get_bids))
        .route("/winners", get(handle_get_winners))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
// endregion: --- Router

// region:    --- Identity
/// 로그인 사용자 이름 (헤더가 없으면 401)
fn current_user(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(AUTH_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

/// 관리자 확인
fn require_admin(headers: &HeaderMap) -> Result<(), AppError> {
    let is_admin = headers
        .get(AUTH_ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    if is_admin {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
// endregion: --- Identity

// region:    --- Command Handlers

#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub placed: bool,
    pub outcome: BidOutcome,
    pub message: &'static str,
}

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<BidRequest>,
) -> Result<Response, AppError> {
    let bidder = current_user(&headers)?;
    info!(
        "{:<12} --> 입찰 요청: item={}, bidder={}, amount={}",
        "Handler", item_id, bidder, req.amount
    );

    let cmd = PlaceBidCommand {
        item_id,
        bidder,
        amount: req.amount,
    };
    let result = match state.ledger.handle_place_bid(cmd).await {
        Ok(result) => result,
        Err(AppError::Storage(_)) => {
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": PLACE_BID_ERROR })),
            )
                .into_response())
        }
        Err(e) => return Err(e),
    };

    let status = result
        .outcome
        .error()
        .map(|e| e.status_code())
        .unwrap_or(StatusCode::OK);
    let body = BidResponse {
        placed: result.placed(),
        outcome: result.outcome,
        message: result.message(),
    };
    Ok((status, Json(body)).into_response())
}

/// 상품 생성 (관리자)
pub async fn handle_create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_item): Json<NewItem>,
) -> Result<Response, AppError> {
    require_admin(&headers)?;
    let item = commands::handle_create_item(state.store.as_ref(), new_item).await?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

/// 상품 수정 (관리자)
pub async fn handle_update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    headers: HeaderMap,
    Json(new_item): Json<NewItem>,
) -> Result<Response, AppError> {
    require_admin(&headers)?;
    let item = commands::handle_update_item(state.store.as_ref(), item_id, new_item).await?;
    Ok(Json(item).into_response())
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

#[derive(Debug, Serialize)]
pub struct AuctionStatus {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: WindowStatus,
}

/// 경매 기간 상태 조회
pub async fn handle_get_auction(State(state): State<AppState>) -> Json<AuctionStatus> {
    let window = state.ledger.window();
    Json(AuctionStatus {
        title: state.config.title.clone(),
        start: window.start(),
        end: window.end(),
        status: window.status(Utc::now()),
    })
}

/// 모든 상품 조회
pub async fn handle_get_items(State(state): State<AppState>) -> Result<Response, AppError> {
    let items = query::handlers::list_items(state.store.as_ref()).await?;
    Ok(Json(items).into_response())
}

/// 상품 조회
pub async fn handle_get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Response, AppError> {
    let item = query::handlers::get_item(state.store.as_ref(), item_id).await?;
    Ok(Json(item).into_response())
}

/// 최소 입찰가 조회
pub async fn handle_get_minimum_bid(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Response, AppError> {
    let min_bid = query::handlers::effective_minimum_bid(state.store.as_ref(), item_id).await?;
    Ok(Json(serde_json::json!({ "item_id": item_id, "min_bid": min_bid })).into_response())
}

/// 상품 입찰 이력 조회
pub async fn handle_get_item_bids(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Response, AppError> {
    let bids = query::handlers::bids_for_item(state.store.as_ref(), item_id).await?;
    Ok(Json(bids).into_response())
}

/// 입찰 상품 전체 조회 (관리자)
pub async fn handle_get_bids(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&headers)?;
    let items = query::handlers::list_items_with_bids(state.store.as_ref()).await?;
    Ok(Json(items).into_response())
}

/// 낙찰자 조회 (관리자)
pub async fn handle_get_winners(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&headers)?;
    let winners = query::handlers::list_winners(state.store.as_ref()).await?;
    Ok(Json(winners).into_response())
}

// endregion: --- Query Handlers

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_user_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(current_user(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn admin_header_must_be_true() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_ADMIN_HEADER, HeaderValue::from_static("no"));
        assert!(require_admin(&headers).is_err());
        headers.insert(AUTH_ADMIN_HEADER, HeaderValue::from_static("TRUE"));
        assert!(require_admin(&headers).is_ok());
    }
}
