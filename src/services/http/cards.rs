use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use super::{authorize, channel_error, clamp_paging, service_failure, ApiResponse, AppState};
use crate::models::cards::{CardBatch, CardFilter, CardUpdate};
use crate::services::cards::CardRequest;

#[derive(Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    page_size: Option<i64>,
    value: Option<i32>,
    used: Option<bool>,
}

pub async fn list_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (page, page_size) = clamp_paging(params.page, params.page_size);
    let filter = CardFilter {
        value: params.value,
        used: params.used,
    };
    let (card_tx, card_rx) = oneshot::channel();

    let send_result = state
        .card_channel
        .send(CardRequest::ListCards {
            page,
            page_size,
            filter,
            response: card_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match card_rx.await {
        Ok(Ok((cards, total))) => (
            StatusCode::OK,
            Json(json!({
                "cards": cards,
                "total": total,
                "page": page,
                "page_size": page_size,
            })),
        ),
        Ok(Err(service_error)) => service_failure("list cards", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn add_cards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(batch): Json<CardBatch>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let value = batch.value;
    let (card_tx, card_rx) = oneshot::channel();

    let send_result = state
        .card_channel
        .send(CardRequest::AddCards {
            content: batch.content,
            value,
            response: card_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match card_rx.await {
        Ok(Ok(count)) => (
            StatusCode::OK,
            Json(json!({"message": format!("added {} cards of value {}", count, value)})),
        ),
        Ok(Err(service_error)) => service_failure("add cards", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn update_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<i32>,
    Json(data): Json<CardUpdate>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (card_tx, card_rx) = oneshot::channel();

    let send_result = state
        .card_channel
        .send(CardRequest::UpdateCard {
            id: card_id,
            data,
            response: card_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match card_rx.await {
        Ok(Ok(Some(card))) => (
            StatusCode::OK,
            Json(json!({"message": "card updated", "card": card})),
        ),
        Ok(Ok(None)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "card not found"})),
        ),
        Ok(Err(service_error)) => service_failure("update card", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn delete_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(card_id): Path<i32>,
) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (card_tx, card_rx) = oneshot::channel();

    let send_result = state
        .card_channel
        .send(CardRequest::DeleteCard {
            id: card_id,
            response: card_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match card_rx.await {
        Ok(Ok(true)) => (StatusCode::OK, Json(json!({"message": "card deleted"}))),
        Ok(Ok(false)) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "card not found"})),
        ),
        Ok(Err(service_error)) => service_failure("delete card", service_error),
        Err(e) => channel_error(e),
    }
}
