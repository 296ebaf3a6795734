use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::stats::{Stats, UserTotals};
use crate::repositories::cards::CardRepository;
use crate::repositories::users::UserRepository;

pub enum StatsRequest {
    GetStats {
        response: oneshot::Sender<Result<Stats, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct StatsRequestHandler {
    users: UserRepository,
    cards: CardRepository,
}

impl StatsRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        StatsRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            cards: CardRepository::new(sql_conn),
        }
    }

    async fn get_stats(&self) -> Result<Stats, ServiceError> {
        let (total, claimed) = self
            .users
            .totals()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;
        let stock = self
            .cards
            .stock_counts()
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        Ok(Stats {
            users: UserTotals { total, claimed },
            stock,
        })
    }
}

#[async_trait]
impl RequestHandler<StatsRequest> for StatsRequestHandler {
    async fn handle_request(&self, request: StatsRequest) {
        match request {
            StatsRequest::GetStats { response } => {
                let result = self.get_stats().await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct StatsService;

impl StatsService {
    pub fn new() -> Self {
        StatsService {}
    }
}

#[async_trait]
impl Service<StatsRequest, StatsRequestHandler> for StatsService {}
