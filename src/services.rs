use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::settings::Settings;

mod cards;
mod claims;
mod http;
mod stats;
mod users;

#[derive(Debug, thiserror::Error)]
enum ServiceError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (card_tx, mut card_rx) = mpsc::channel(512);
    let (claim_tx, mut claim_rx) = mpsc::channel(512);
    let (stats_tx, mut stats_rx) = mpsc::channel(512);

    let mut user_service = users::UserService::new();
    let mut card_service = cards::CardService::new();
    let mut claim_service = claims::ClaimService::new();
    let mut stats_service = stats::StatsService::new();

    println!("[*] Starting user service.");
    let user_pool = pool.clone();
    tokio::spawn(async move {
        user_service
            .run(users::UserRequestHandler::new(user_pool), &mut user_rx)
            .await;
    });

    println!("[*] Starting card service.");
    let card_pool = pool.clone();
    tokio::spawn(async move {
        card_service
            .run(cards::CardRequestHandler::new(card_pool), &mut card_rx)
            .await;
    });

    println!("[*] Starting claim service.");
    let claim_pool = pool.clone();
    tokio::spawn(async move {
        claim_service
            .run(claims::ClaimRequestHandler::new(claim_pool), &mut claim_rx)
            .await;
    });

    log::info!("Starting stats service.");
    let stats_pool = pool.clone();
    tokio::spawn(async move {
        stats_service
            .run(stats::StatsRequestHandler::new(stats_pool), &mut stats_rx)
            .await;
    });

    println!("[*] Starting HTTP server.");
    http::start_http_server(
        &settings.server.listen,
        settings.admin.password,
        user_tx,
        card_tx,
        claim_tx,
        stats_tx,
    )
    .await?;

    Ok(())
}
