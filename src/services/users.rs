use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::users::{User, UserImport, UserUpdate};
use crate::repositories::users::UserRepository;

pub enum UserRequest {
    ListUsers {
        page: i64,
        page_size: i64,
        response: oneshot::Sender<Result<(Vec<User>, i64), ServiceError>>,
    },
    ImportUsers {
        records: Vec<UserImport>,
        response: oneshot::Sender<Result<usize, ServiceError>>,
    },
    UpdateUser {
        id: i32,
        data: UserUpdate,
        response: oneshot::Sender<Result<Option<User>, ServiceError>>,
    },
    DeleteUser {
        id: i32,
        response: oneshot::Sender<Result<bool, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        let repository = UserRepository::new(sql_conn);

        UserRequestHandler { repository }
    }

    async fn list_users(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<User>, i64), ServiceError> {
        self.repository
            .list_paginated(page, page_size)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn import_users(&self, records: &[UserImport]) -> Result<usize, ServiceError> {
        let mut imported = 0;
        for record in records {
            self.repository
                .upsert_import(record)
                .await
                .map_err(|e| ServiceError::Database(e.to_string()))?;
            imported += 1;
        }

        Ok(imported)
    }

    async fn update_user(
        &self,
        id: i32,
        data: &UserUpdate,
    ) -> Result<Option<User>, ServiceError> {
        self.repository
            .update(id, data)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, ServiceError> {
        self.repository
            .delete(id)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::ListUsers {
                page,
                page_size,
                response,
            } => {
                let result = self.list_users(page, page_size).await;
                let _ = response.send(result);
            }
            UserRequest::ImportUsers { records, response } => {
                let result = self.import_users(&records).await;
                let _ = response.send(result);
            }
            UserRequest::UpdateUser { id, data, response } => {
                let result = self.update_user(id, &data).await;
                let _ = response.send(result);
            }
            UserRequest::DeleteUser { id, response } => {
                let result = self.delete_user(id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
