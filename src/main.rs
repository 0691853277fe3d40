// region:    --- Imports
use charity_auction::auction::AuctionWindow;
use charity_auction::bidding::commands::BidLedger;
use charity_auction::config::AppConfig;
use charity_auction::database::DatabaseManager;
use charity_auction::handlers::{self, AppState};
use charity_auction::notification::{
    LogNotifier, MailRelayNotifier, NotificationDispatcher, Notifier,
};
use charity_auction::store::{PostgresAuctionStore, SharedAuctionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{:<12} --> 설정 로드 실패: {}", "Main", e);
            return Err(e.into());
        }
    };

    // DatabaseManager 생성
    let db_manager = match DatabaseManager::new(&config).await {
        Ok(db_manager) => Arc::new(db_manager),
        Err(e) => {
            error!("{:<12} --> 데이터베이스 연결 실패: {:?}", "Main", e);
            return Err(e.into());
        }
    };

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    let store: SharedAuctionStore = Arc::new(PostgresAuctionStore::new(db_manager));

    // 경매 기간 로드 (잘못된 설정이면 서비스하지 않음)
    let window = match AuctionWindow::load(store.as_ref()).await {
        Ok(window) => window,
        Err(e) => {
            error!("{:<12} --> 경매 기간 설정 오류: {}", "Main", e);
            return Err(e.into());
        }
    };
    info!(
        "{:<12} --> 경매 기간: {} ~ {}",
        "Main",
        window.start(),
        window.end()
    );

    // 알림 전송 설정
    let notifier: Arc<dyn Notifier> = match &config.mail_relay_url {
        Some(url) => Arc::new(MailRelayNotifier::new(url)),
        None => {
            info!("{:<12} --> 메일 릴레이 미설정, 로그로 대체", "Main");
            Arc::new(LogNotifier)
        }
    };
    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&store),
        notifier,
        &config.base_url,
        &config.title,
        &config.mail_from,
    );

    let ledger = BidLedger::new(Arc::clone(&store), window, Some(dispatcher));
    let listen_addr = config.listen_addr.clone();
    let routes_all = handlers::routes(AppState::new(store, ledger, config));

    // 리스너 생성
    let listener = TcpListener::bind(&listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
