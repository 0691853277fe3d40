//! 입찰 결과
//! 결과 종류는 닫힌 열거형이고, 사용자 메시지는 표시 단계에서만 만든다.
use crate::error::AppError;
use serde::Serialize;

pub const PLACE_BID_ERROR: &str = "Unable to place bid. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidOutcome {
    Placed,
    TooLow,
    NoSuchItem,
    DisplayOnly,
    AuctionClosed,
    InvalidAmount,
    InvalidUser,
}

impl BidOutcome {
    pub fn message(self) -> &'static str {
        match self {
            BidOutcome::Placed => "Bid placed",
            BidOutcome::TooLow => "Bid too low",
            BidOutcome::NoSuchItem => "No such item",
            BidOutcome::DisplayOnly => "Display only item",
            BidOutcome::AuctionClosed => "Auction is not open",
            BidOutcome::InvalidAmount => "Invalid bid amount",
            BidOutcome::InvalidUser => "Invalid user",
        }
    }

    /// 거절 결과를 오류 분류로 변환 (성공이면 None)
    pub fn error(self) -> Option<AppError> {
        match self {
            BidOutcome::Placed => None,
            BidOutcome::TooLow => Some(AppError::Conflict),
            BidOutcome::NoSuchItem => Some(AppError::NotFound),
            BidOutcome::AuctionClosed => Some(AppError::AuctionClosed),
            BidOutcome::DisplayOnly | BidOutcome::InvalidAmount | BidOutcome::InvalidUser => {
                Some(AppError::Validation(self.message().to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidResult {
    pub outcome: BidOutcome,
    /// 이번 호출 직전의 최고 입찰자
    pub prior_bidder: Option<String>,
}

impl BidResult {
    pub fn rejected(outcome: BidOutcome) -> Self {
        Self {
            outcome,
            prior_bidder: None,
        }
    }

    pub fn placed(&self) -> bool {
        self.outcome == BidOutcome::Placed
    }

    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }

    /// 알림을 보낼 이전 최고 입찰자 (자기 자신 제외)
    pub fn notify_target(&self, bidder: &str) -> Option<&str> {
        if !self.placed() {
            return None;
        }
        self.prior_bidder
            .as_deref()
            .filter(|prior| !prior.is_empty() && *prior != bidder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(prior: Option<&str>) -> BidResult {
        BidResult {
            outcome: BidOutcome::Placed,
            prior_bidder: prior.map(str::to_string),
        }
    }

    #[test]
    fn notifies_the_displaced_bidder() {
        assert_eq!(placed(Some("alice")).notify_target("bob"), Some("alice"));
    }

    #[test]
    fn no_notification_on_self_outbid() {
        assert_eq!(placed(Some("alice")).notify_target("alice"), None);
    }

    #[test]
    fn no_notification_without_prior_bidder() {
        assert_eq!(placed(None).notify_target("alice"), None);
        assert_eq!(placed(Some("")).notify_target("alice"), None);
    }

    #[test]
    fn no_notification_when_rejected() {
        let result = BidResult {
            outcome: BidOutcome::TooLow,
            prior_bidder: Some("alice".to_string()),
        };
        assert_eq!(result.notify_target("bob"), None);
        assert_eq!(result.message(), "Bid too low");
    }

    #[test]
    fn rejections_map_to_error_kinds() {
        assert!(BidOutcome::Placed.error().is_none());
        assert!(matches!(BidOutcome::TooLow.error(), Some(AppError::Conflict)));
        assert!(matches!(BidOutcome::NoSuchItem.error(), Some(AppError::NotFound)));
        assert!(matches!(
            BidOutcome::InvalidAmount.error(),
            Some(AppError::Validation(msg)) if msg == "Invalid bid amount"
        ));
    }
}
