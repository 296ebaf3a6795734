use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use super::{authorize, channel_error, clamp_paging, service_failure, ApiResponse, AppState};
use crate::models::users::{UserImport, UserUpdate};
use crate::services::users::UserRequest;

#[derive(Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    page_size: Option<i64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (page, page_size) = clamp_paging(params.page, params.page_size);
    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::ListUsers {
            page,
            page_size,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match user_rx.await {
        Ok(Ok((users, total))) => (
            StatusCode::OK,
            Json(json!({
                "users": users,
                "total": total,
                "page": page,
                "page_size": page_size,
            })),
        ),
        Ok(Err(service_error)) => service_failure("list users", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn import_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(records): Json<Vec<UserImport>>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::ImportUsers {
            records,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match user_rx.await {
        Ok(Ok(count)) => (
            StatusCode::OK,
            Json(json!({"message": format!("imported or updated {} users", count)})),
        ),
        Ok(Err(service_error)) => service_failure("import users", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<i32>,
    Json(data): Json<UserUpdate>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::UpdateUser {
            id: user_id,
            data,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match user_rx.await {
        Ok(Ok(Some(user))) => (
            StatusCode::OK,
            Json(json!({"message": "user updated", "user": user})),
        ),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "user not found"})),
        ),
        Ok(Err(service_error)) => service_failure("update user", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<i32>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (user_tx, user_rx) = oneshot::channel();

    let send_result = state
        .user_channel
        .send(UserRequest::DeleteUser {
            id: user_id,
            response: user_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match user_rx.await {
        Ok(Ok(true)) => (StatusCode::OK, Json(json!({"message": "user deleted"}))),
        Ok(Ok(false)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "user not found"})),
        ),
        Ok(Err(service_error)) => service_failure("delete user", service_error),
        Err(e) => channel_error(e),
    }
}
