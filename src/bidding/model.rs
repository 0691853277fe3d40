use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 연락처 정보가 없는 사용자 대체 문자열
pub const MISSING_CONTACT: &str = "<missing>";

// 상품 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub artist: String,
    pub image_file_name: String,
    pub opening_bid: Decimal,
    pub min_bid_incr: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// 시작가가 0인 상품은 전시 전용 (입찰 불가)
    pub fn is_display_only(&self) -> bool {
        self.opening_bid.is_zero()
    }
}

// 상품 생성/수정 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub artist: String,
    pub image_file_name: String,
    pub opening_bid: Decimal,
    pub min_bid_incr: Decimal,
}

impl NewItem {
    /// 필수 필드 검증
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("artist", &self.artist),
            ("image_file_name", &self.image_file_name),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{} is required", name)));
        }
        for (name, amount) in [
            ("opening_bid", self.opening_bid),
            ("min_bid_incr", self.min_bid_incr),
        ] {
            if !fits_money_column(amount) {
                return Err(AppError::Validation(format!(
                    "{} must be between 0 and 9999999999.99 with at most 2 decimals",
                    name
                )));
            }
        }
        Ok(())
    }
}

// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub bidder: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

// 최고 입찰
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadingBid {
    pub bidder: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 금액 소수점 자리수 (NUMERIC(12,2))
const MONEY_SCALE: u32 = 2;

// NUMERIC(12,2) 상한 (미포함)
fn money_limit() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

/// NUMERIC(12,2) 컬럼에 반올림 없이 저장 가능한 금액인지 확인
pub fn fits_money_column(amount: Decimal) -> bool {
    !amount.is_sign_negative()
        && amount < money_limit()
        && amount.normalize().scale() <= MONEY_SCALE
}

/// 최소 입찰가 계산
/// 입찰이 없으면 시작가, 있으면 최고 입찰가 + 최소 증가액
pub fn effective_minimum(
    opening_bid: Decimal,
    min_bid_incr: Decimal,
    current_bid: Option<Decimal>,
) -> Decimal {
    match current_bid {
        Some(current) if !current.is_zero() => {
            current.checked_add(min_bid_incr).unwrap_or(Decimal::MAX)
        }
        _ => opening_bid,
    }
}

// 상품 조회 모델 (현재 입찰 상태 포함)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub current_bid: Decimal,
    pub bidder: Option<String>,
    pub last_bid_at: Option<DateTime<Utc>>,
    pub min_bid: Decimal,
}

impl ItemView {
    pub fn new(item: Item, leading: Option<LeadingBid>) -> Self {
        let current_bid = leading.as_ref().map(|l| l.amount);
        let min_bid = effective_minimum(item.opening_bid, item.min_bid_incr, current_bid);
        Self {
            current_bid: current_bid.unwrap_or(Decimal::ZERO),
            bidder: leading.as_ref().map(|l| l.bidder.clone()),
            last_bid_at: leading.map(|l| l.created_at),
            min_bid,
            item,
        }
    }
}

// 입찰자 연락처 (외부 인증 서비스 소유, 읽기 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserContact {
    pub user_name: String,
    pub full_name: String,
    pub email: String,
}

// 입찰 + 입찰자 연락처
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidWithContact {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub bid: Bid,
    pub full_name: String,
    pub email: String,
}

impl BidWithContact {
    pub fn new(bid: Bid, contact: Option<&UserContact>) -> Self {
        let (full_name, email) = contact_or_placeholder(contact);
        Self {
            bid,
            full_name,
            email,
        }
    }
}

// 입찰 이력을 포함한 상품
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemWithBids {
    #[serde(flatten)]
    pub item: Item,
    pub bids: Vec<BidWithContact>,
}

// 낙찰자 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Winner {
    pub item_id: i64,
    pub title: String,
    pub artist: String,
    pub amount: Decimal,
    pub bid_at: DateTime<Utc>,
    pub bidder: String,
    pub full_name: String,
    pub email: String,
}

pub(crate) fn contact_or_placeholder(contact: Option<&UserContact>) -> (String, String) {
    match contact {
        Some(c) => (c.full_name.clone(), c.email.clone()),
        None => (MISSING_CONTACT.to_string(), MISSING_CONTACT.to_string()),
    }
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn new_item() -> NewItem {
        NewItem {
            title: "Sunset".to_string(),
            description: "Oil on canvas".to_string(),
            artist: "A. Painter".to_string(),
            image_file_name: "sunset.jpg".to_string(),
            opening_bid: d("10"),
            min_bid_incr: d("2"),
        }
    }

    #[test]
    fn minimum_without_bids_is_opening_bid() {
        assert_eq!(effective_minimum(d("10.00"), d("2"), None), d("10.00"));
    }

    #[test]
    fn minimum_with_bid_adds_increment() {
        assert_eq!(effective_minimum(d("5"), d("1"), Some(d("15"))), d("16"));
    }

    #[test]
    fn zero_current_bid_counts_as_no_bid() {
        assert_eq!(effective_minimum(d("5"), d("1"), Some(Decimal::ZERO)), d("5"));
    }

    #[test]
    fn valid_item_passes() {
        assert!(new_item().validate().is_ok());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut item = new_item();
        item.artist = "  ".to_string();
        let err = item.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("artist")));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut item = new_item();
        item.min_bid_incr = d("-1");
        assert!(matches!(item.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn item_amounts_must_fit_the_money_column() {
        let mut item = new_item();
        item.opening_bid = d("10000000000");
        assert!(matches!(
            item.validate(),
            Err(AppError::Validation(msg)) if msg.contains("opening_bid")
        ));

        let mut item = new_item();
        item.min_bid_incr = d("0.125");
        assert!(matches!(
            item.validate(),
            Err(AppError::Validation(msg)) if msg.contains("min_bid_incr")
        ));

        let mut item = new_item();
        item.min_bid_incr = Decimal::MAX;
        assert!(item.validate().is_err());

        let mut item = new_item();
        item.opening_bid = d("9999999999.99");
        item.min_bid_incr = d("0.50");
        assert!(item.validate().is_ok());
    }

    #[test]
    fn money_column_bounds() {
        assert!(fits_money_column(Decimal::ZERO));
        assert!(fits_money_column(d("12.50")));
        assert!(fits_money_column(d("1.500")));
        assert!(!fits_money_column(d("1.505")));
        assert!(!fits_money_column(d("-0.01")));
        assert!(!fits_money_column(d("100000000000")));
    }

    #[test]
    fn minimum_saturates_instead_of_overflowing() {
        assert_eq!(
            effective_minimum(d("1"), Decimal::MAX, Some(d("1"))),
            Decimal::MAX
        );
    }

    #[test]
    fn missing_contact_uses_placeholder() {
        let (name, email) = contact_or_placeholder(None);
        assert_eq!(name, MISSING_CONTACT);
        assert_eq!(email, MISSING_CONTACT);
    }
}
// endregion: --- Tests
