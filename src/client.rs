//! Typed client for the card-dealer REST surface: the claim form and
//! the admin panel build on the `ApiClient` here instead of issuing
//! ad-hoc requests.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::cards::{Card, CardBatch, CardFilter, CardPage, CardUpdate};
use crate::models::claims::{ClaimRequest, ClaimResult};
use crate::models::stats::Stats;
use crate::models::users::{User, UserImport, UserPage, UserUpdate};

pub mod admin;
pub mod claim;
pub mod import;

pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the admin password was rejected")]
    Unauthorized,
    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("connection failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    admin_password: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();

        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_password: None,
        }
    }

    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(password) = &self.admin_password {
            if let Ok(value) = HeaderValue::from_str(password) {
                headers.insert(ADMIN_PASSWORD_HEADER, value);
            }
        }
        headers
    }

    /// Maps the response status before the body is touched: 401 means
    /// the credential was rejected, any other non-success carries the
    /// server's error message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "request rejected".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    pub async fn claim(&self, request: &ClaimRequest) -> Result<ClaimResult, ClientError> {
        let response = self
            .http
            .post(self.url("/api/claim"))
            .json(request)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn stats(&self) -> Result<Stats, ClientError> {
        let response = self
            .http
            .get(self.url("/api/admin/stats"))
            .headers(self.admin_headers())
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn list_users(&self, page: i64, page_size: i64) -> Result<UserPage, ClientError> {
        let response = self
            .http
            .get(self.url("/api/admin/users"))
            .headers(self.admin_headers())
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn import_users(&self, records: &[UserImport]) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.url("/api/admin/users/import"))
            .headers(self.admin_headers())
            .json(&records)
            .send()
            .await?;

        Ok(Self::check(response)
            .await?
            .json::<MessageBody>()
            .await?
            .message)
    }

    pub async fn update_user(&self, id: i32, data: &UserUpdate) -> Result<User, ClientError> {
        #[derive(Deserialize)]
        struct Body {
            user: User,
        }

        let response = self
            .http
            .put(self.url(&format!("/api/admin/users/{}", id)))
            .headers(self.admin_headers())
            .json(data)
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<Body>().await?.user)
    }

    pub async fn delete_user(&self, id: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/admin/users/{}", id)))
            .headers(self.admin_headers())
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn list_cards(
        &self,
        page: i64,
        page_size: i64,
        filter: &CardFilter,
    ) -> Result<CardPage, ClientError> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(value) = filter.value {
            query.push(("value", value.to_string()));
        }
        if let Some(used) = filter.used {
            query.push(("used", used.to_string()));
        }

        let response = self
            .http
            .get(self.url("/api/admin/cards"))
            .headers(self.admin_headers())
            .query(&query)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn add_cards(&self, content: &str, value: i32) -> Result<String, ClientError> {
        let batch = CardBatch {
            content: content.to_string(),
            value,
        };

        let response = self
            .http
            .post(self.url("/api/admin/cards/add"))
            .headers(self.admin_headers())
            .json(&batch)
            .send()
            .await?;

        Ok(Self::check(response)
            .await?
            .json::<MessageBody>()
            .await?
            .message)
    }

    pub async fn update_card(&self, id: i32, data: &CardUpdate) -> Result<Card, ClientError> {
        #[derive(Deserialize)]
        struct Body {
            card: Card,
        }

        let response = self
            .http
            .put(self.url(&format!("/api/admin/cards/{}", id)))
            .headers(self.admin_headers())
            .json(data)
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<Body>().await?.card)
    }

    pub async fn delete_card(&self, id: i32) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/admin/cards/{}", id)))
            .headers(self.admin_headers())
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}
