use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::cards::{Card, CardFilter, CardUpdate};
use crate::repositories::cards::CardRepository;

pub enum CardRequest {
    ListCards {
        page: i64,
        page_size: i64,
        filter: CardFilter,
        response: oneshot::Sender<Result<(Vec<Card>, i64), ServiceError>>,
    },
    AddCards {
        content: String,
        value: i32,
        response: oneshot::Sender<Result<u64, ServiceError>>,
    },
    UpdateCard {
        id: i32,
        data: CardUpdate,
        response: oneshot::Sender<Result<Option<Card>, ServiceError>>,
    },
    DeleteCard {
        id: i32,
        response: oneshot::Sender<Result<bool, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct CardRequestHandler {
    repository: CardRepository,
}

impl CardRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = CardRepository::new(sql_conn);

        CardRequestHandler { repository }
    }

    async fn list_cards(
        &self,
        page: i64,
        page_size: i64,
        filter: &CardFilter,
    ) -> Result<(Vec<Card>, i64), ServiceError> {
        self.repository
            .list_paginated(page, page_size, filter)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn add_cards(&self, content: &str, value: i32) -> Result<u64, ServiceError> {
        self.repository
            .add_batch(content, value)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn update_card(
        &self,
        id: i32,
        data: &CardUpdate,
    ) -> Result<Option<Card>, ServiceError> {
        self.repository
            .update(id, data)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn delete_card(&self, id: i32) -> Result<bool, ServiceError> {
        self.repository
            .delete(id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<CardRequest> for CardRequestHandler {
    async fn handle_request(&self, request: CardRequest) {
        match request {
            CardRequest::ListCards {
                page,
                page_size,
                filter,
                response,
            } => {
                let result = self.list_cards(page, page_size, &filter).await;
                let _ = response.send(result);
            }
            CardRequest::AddCards {
                content,
                value,
                response,
            } => {
                let result = self.add_cards(&content, value).await;
                let _ = response.send(result);
            }
            CardRequest::UpdateCard { id, data, response } => {
                let result = self.update_card(id, &data).await;
                let _ = response.send(result);
            }
            CardRequest::DeleteCard { id, response } => {
                let result = self.delete_card(id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct CardService;

impl CardService {
    pub fn new() -> Self {
        CardService {}
    }
}

#[async_trait]
impl Service<CardRequest, CardRequestHandler> for CardService {}
