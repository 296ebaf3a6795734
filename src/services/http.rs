use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::cards::CardRequest;
use super::claims::ClaimServiceRequest;
use super::stats::StatsRequest;
use super::users::UserRequest;
use super::ServiceError;
use crate::models::claims::ClaimRequest;

mod cards;
mod users;

const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
struct AppState {
    user_channel: mpsc::Sender<UserRequest>,
    card_channel: mpsc::Sender<CardRequest>,
    claim_channel: mpsc::Sender<ClaimServiceRequest>,
    stats_channel: mpsc::Sender<StatsRequest>,
    admin_password: String,
}

type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Gate for every admin route; the configured password must arrive in
/// the admin header.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiResponse> {
    let supplied = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());

    if supplied == Some(state.admin_password.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid admin password"})),
        ))
    }
}

fn channel_error(e: impl std::fmt::Display) -> ApiResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": format!("Failed to process request: {}", e)})),
    )
}

fn service_failure(operation: &str, error: ServiceError) -> ApiResponse {
    log::error!("{} failed: {}", operation, error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal server error"})),
    )
}

fn clamp_paging(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

async fn submit_claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> ApiResponse {
    let (claim_tx, claim_rx) = oneshot::channel();

    let send_result = state
        .claim_channel
        .send(ClaimServiceRequest::Claim {
            uid: request.uid,
            contact: request.contact,
            response: claim_tx,
        })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match claim_rx.await {
        Ok(Ok(result)) => (StatusCode::OK, Json(json!(result))),
        Ok(Err(service_error)) => service_failure("claim", service_error),
        Err(e) => channel_error(e),
    }
}

async fn get_stats(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let (stats_tx, stats_rx) = oneshot::channel();

    let send_result = state
        .stats_channel
        .send(StatsRequest::GetStats { response: stats_tx })
        .await;
    if let Err(e) = send_result {
        return channel_error(e);
    }

    match stats_rx.await {
        Ok(Ok(stats)) => (StatusCode::OK, Json(json!(stats))),
        Ok(Err(service_error)) => service_failure("stats", service_error),
        Err(e) => channel_error(e),
    }
}

pub async fn start_http_server(
    listen: &str,
    admin_password: String,
    user_channel: mpsc::Sender<UserRequest>,
    card_channel: mpsc::Sender<CardRequest>,
    claim_channel: mpsc::Sender<ClaimServiceRequest>,
    stats_channel: mpsc::Sender<StatsRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        user_channel,
        card_channel,
        claim_channel,
        stats_channel,
        admin_password,
    };

    let app = Router::new()
        .route("/api/claim", post(submit_claim))
        .route("/api/admin/stats", get(get_stats))
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/import", post(users::import_users))
        .route(
            "/api/admin/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/api/admin/cards", get(cards::list_cards))
        .route("/api/admin/cards/add", post(cards::add_cards))
        .route(
            "/api/admin/cards/{id}",
            put(cards::update_card).delete(cards::delete_card),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen).await?;
    println!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::clamp_paging;

    #[test]
    fn paging_defaults_and_bounds() {
        assert_eq!(clamp_paging(None, None), (1, 20));
        assert_eq!(clamp_paging(Some(0), Some(500)), (1, 100));
        assert_eq!(clamp_paging(Some(-3), Some(0)), (1, 1));
        assert_eq!(clamp_paging(Some(4), Some(50)), (4, 50));
    }
}
