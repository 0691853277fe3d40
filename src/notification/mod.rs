//! 입찰 알림
//!
//! 최고 입찰자가 바뀌면 밀려난 입찰자에게 메일을 보낸다. 전송은 입찰 결과와
//! 분리되어 있어 실패해도 로그만 남기고 입찰 결과는 바뀌지 않는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::store::{SharedAuctionStore, StoreError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Notify Error
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail relay rejected message: status {0}")]
    Rejected(u16),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("item {0} not found")]
    NoSuchItem(i64),
    #[error("no contact for user {0:?}")]
    MissingContact(String),
}
// endregion: --- Notify Error

// region:    --- Mail Message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// 상위 입찰 알림 본문
pub fn outbid_text(title: &str, base_url: &str, item_id: i64) -> String {
    format!(
        "You have been outbid on {:?}. Visit {}/item/{} to rebid.",
        title, base_url, item_id
    )
}
// endregion: --- Mail Message

// region:    --- Notifier
/// 메일 전송 트레이트
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

/// HTTP 메일 릴레이로 전송
pub struct MailRelayNotifier {
    client: reqwest::Client,
    relay_url: String,
}

impl MailRelayNotifier {
    pub fn new(relay_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url: relay_url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> 메일 릴레이 전송: to={}, relay={}",
            "Notify", message.to, self.relay_url
        );
        let response = self
            .client
            .post(&self.relay_url)
            .json(message)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// 로그로만 남기는 전송 (릴레이 미설정 시)
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> 메일 (릴레이 없음): to={}, text={}",
            "Notify", message.to, message.text
        );
        Ok(())
    }
}

/// 보낸 메일을 기록하는 전송
///
/// Useful for tests.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항상 실패하는 전송
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Rejected(503));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}
// endregion: --- Notifier

// region:    --- Dispatcher
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: SharedAuctionStore,
    notifier: Arc<dyn Notifier>,
    base_url: String,
    subject: String,
    from: String,
}

impl NotificationDispatcher {
    pub fn new(
        store: SharedAuctionStore,
        notifier: Arc<dyn Notifier>,
        base_url: &str,
        subject: &str,
        from: &str,
    ) -> Self {
        Self {
            store,
            notifier,
            base_url: base_url.to_string(),
            subject: subject.to_string(),
            from: from.to_string(),
        }
    }

    /// 이벤트 처리를 별도 태스크로 실행 (실패는 로그만)
    pub fn dispatch(&self, event: AuctionEvent) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.handle_event(&event).await {
                error!("{:<12} --> 알림 전송 실패: {:?} ({:?})", "Notify", e, event);
            }
        })
    }

    /// 이벤트 처리
    pub async fn handle_event(&self, event: &AuctionEvent) -> Result<(), NotifyError> {
        match event {
            AuctionEvent::Outbid {
                item_id,
                outbid_bidder,
                new_amount,
                ..
            } => {
                debug!(
                    "{:<12} --> 상위 입찰 알림: item={}, to={}, amount={}",
                    "Notify", item_id, outbid_bidder, new_amount
                );
                self.notify_outbid(*item_id, outbid_bidder).await
            }
        }
    }

    async fn notify_outbid(&self, item_id: i64, user_name: &str) -> Result<(), NotifyError> {
        let contact = self
            .store
            .user_contact(user_name)
            .await?
            .ok_or_else(|| NotifyError::MissingContact(user_name.to_string()))?;

        let title = match self.store.get_item(item_id).await? {
            Some(view) => view.item.title,
            None => {
                warn!("{:<12} --> 알림 대상 상품 없음: {}", "Notify", item_id);
                return Err(NotifyError::NoSuchItem(item_id));
            }
        };

        let message = MailMessage {
            from: self.from.clone(),
            to: contact.email,
            subject: self.subject.clone(),
            text: outbid_text(&title, &self.base_url, item_id),
        };
        self.notifier.send(&message).await
    }
}
// endregion: --- Dispatcher

// endregion: --- Tests
