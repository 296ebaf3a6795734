//! Admin panel controller. One parameterized implementation drives
//! both record kinds; all panel state lives here instead of in
//! module-level globals. Edits merge the server's returned record into
//! the current page and deletes drop it locally; only bulk operations
//! refetch, since their effect on the visible page cannot be derived
//! locally.

use std::future::Future;

use thiserror::Error;

use super::import::parse_user_batch;
use super::{ApiClient, ClientError};
use crate::models::cards::{Card, CardFilter, CardUpdate};
use crate::models::stats::Stats;
use crate::models::users::{User, UserUpdate};

pub const PAGE_SIZE: i64 = 20;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the input is empty")]
    EmptyInput,
    #[error("no valid records recognized in the input")]
    NoRecords,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Pagination label shown next to the cursor controls.
pub fn page_label(page: i64, total: i64, page_size: i64) -> String {
    let pages = (total + page_size - 1) / page_size;
    format!("page {} / {}", page, pages)
}

pub struct AdminPanel {
    client: ApiClient,
    pub users_page: i64,
    pub cards_page: i64,
    pub page_size: i64,
    pub card_filter: CardFilter,
    pub users: Vec<User>,
    pub users_total: i64,
    pub cards: Vec<Card>,
    pub cards_total: i64,
}

impl AdminPanel {
    pub fn new(client: ApiClient) -> Self {
        AdminPanel {
            client,
            users_page: 1,
            cards_page: 1,
            page_size: PAGE_SIZE,
            card_filter: CardFilter::default(),
            users: Vec::new(),
            users_total: 0,
            cards: Vec::new(),
            cards_total: 0,
        }
    }

    pub fn users_prev_page(&mut self) -> bool {
        if self.users_page > 1 {
            self.users_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn users_next_page(&mut self) {
        self.users_page += 1;
    }

    pub fn cards_prev_page(&mut self) -> bool {
        if self.cards_page > 1 {
            self.cards_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn cards_next_page(&mut self) {
        self.cards_page += 1;
    }

    /// A new filter starts over from the first page.
    pub fn set_card_filter(&mut self, filter: CardFilter) {
        self.card_filter = filter;
        self.cards_page = 1;
    }

    pub fn users_page_label(&self) -> String {
        page_label(self.users_page, self.users_total, self.page_size)
    }

    pub fn cards_page_label(&self) -> String {
        page_label(self.cards_page, self.cards_total, self.page_size)
    }

    pub async fn load_users(&mut self) -> Result<(), ClientError> {
        let page = self.client.list_users(self.users_page, self.page_size).await?;
        self.users = page.users;
        self.users_total = page.total;

        Ok(())
    }

    pub async fn load_cards(&mut self) -> Result<(), ClientError> {
        let page = self
            .client
            .list_cards(self.cards_page, self.page_size, &self.card_filter)
            .await?;
        self.cards = page.cards;
        self.cards_total = page.total;

        Ok(())
    }

    pub async fn save_user(&mut self, id: i32, data: &UserUpdate) -> Result<User, ClientError> {
        let updated = self.client.update_user(id, data).await?;
        self.merge_user(&updated);

        Ok(updated)
    }

    pub async fn remove_user(&mut self, id: i32) -> Result<(), ClientError> {
        self.client.delete_user(id).await?;
        self.drop_user_locally(id);

        Ok(())
    }

    pub async fn import_users(&mut self, text: &str) -> Result<String, ImportError> {
        if text.trim().is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let records = parse_user_batch(text);
        if records.is_empty() {
            return Err(ImportError::NoRecords);
        }

        let message = self.client.import_users(&records).await?;
        self.load_users().await?;

        Ok(message)
    }

    pub async fn save_card(&mut self, id: i32, data: &CardUpdate) -> Result<Card, ClientError> {
        let updated = self.client.update_card(id, data).await?;
        self.merge_card(&updated);

        Ok(updated)
    }

    pub async fn remove_card(&mut self, id: i32) -> Result<(), ClientError> {
        self.client.delete_card(id).await?;
        self.drop_card_locally(id);

        Ok(())
    }

    pub async fn add_cards(&mut self, content: &str, value: i32) -> Result<String, ImportError> {
        if content.trim().is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let message = self.client.add_cards(content, value).await?;
        self.load_cards().await?;

        Ok(message)
    }

    pub async fn refresh_stats(&self) -> Result<Stats, ClientError> {
        self.client.stats().await
    }

    fn merge_user(&mut self, updated: &User) {
        if let Some(slot) = self.users.iter_mut().find(|user| user.id == updated.id) {
            *slot = updated.clone();
        }
    }

    fn drop_user_locally(&mut self, id: i32) {
        self.users.retain(|user| user.id != id);
        self.users_total = (self.users_total - 1).max(0);
    }

    fn merge_card(&mut self, updated: &Card) {
        if let Some(slot) = self.cards.iter_mut().find(|card| card.id == updated.id) {
            *slot = updated.clone();
        }
    }

    fn drop_card_locally(&mut self, id: i32) {
        self.cards.retain(|card| card.id != id);
        self.cards_total = (self.cards_total - 1).max(0);
    }
}

/// The six stat tiles of the admin dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSummary {
    pub total_users: i64,
    pub claimed_users: i64,
    pub stock_10: i64,
    pub stock_5: i64,
    pub stock_3: i64,
    pub stock_1: i64,
}

impl From<&Stats> for StatsSummary {
    fn from(stats: &Stats) -> Self {
        StatsSummary {
            total_users: stats.users.total,
            claimed_users: stats.users.claimed,
            stock_10: stats.stock.tens,
            stock_5: stats.stock.fives,
            stock_3: stats.stock.threes,
            stock_1: stats.stock.ones,
        }
    }
}

pub enum AuthOutcome {
    Authorized(Stats),
    Rejected,
    Unreachable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no password supplied, aborting the admin session")]
    Aborted,
    #[error("could not reach the server: {0}")]
    Unreachable(String),
}

/// The admin password handshake: verify the credential by fetching
/// stats, and ask for a new password exactly once per rejection, with
/// no bound on retries. Declining the prompt aborts the session; a
/// transport failure aborts with the error, keeping the credential.
pub async fn establish_session<F, Fut, P>(
    stored: Option<String>,
    mut fetch: F,
    mut prompt: P,
) -> Result<(String, Stats), SessionError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AuthOutcome>,
    P: FnMut() -> Option<String>,
{
    let mut password = match stored {
        Some(password) => password,
        None => prompt().ok_or(SessionError::Aborted)?,
    };

    loop {
        match fetch(password.clone()).await {
            AuthOutcome::Authorized(stats) => return Ok((password, stats)),
            AuthOutcome::Rejected => {
                password = prompt().ok_or(SessionError::Aborted)?;
            }
            AuthOutcome::Unreachable(error) => return Err(SessionError::Unreachable(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn sample_stats() -> Stats {
        serde_json::from_value(serde_json::json!({
            "users": {"total": 50, "claimed": 10},
            "stock": {"10": 2, "5": 3, "3": 0, "1": 9},
        }))
        .unwrap()
    }

    fn panel() -> AdminPanel {
        AdminPanel::new(ApiClient::new("http://127.0.0.1:1"))
    }

    fn user(id: i32, nickname: &str) -> User {
        User {
            id,
            uid: format!("U{}", id),
            nickname: nickname.to_string(),
            contact: "10000".to_string(),
            reward_count: 3,
            has_claimed: false,
            claimed_at: None,
        }
    }

    #[test]
    fn page_label_uses_ceiling_division() {
        assert_eq!(page_label(1, 50, 20), "page 1 / 3");
        assert_eq!(page_label(2, 40, 20), "page 2 / 2");
        assert_eq!(page_label(1, 0, 20), "page 1 / 0");
        assert_eq!(page_label(3, 41, 20), "page 3 / 3");
    }

    #[test]
    fn previous_page_stops_at_one() {
        let mut panel = panel();

        assert!(!panel.users_prev_page());
        assert_eq!(panel.users_page, 1);

        panel.users_next_page();
        panel.users_next_page();
        assert!(panel.users_prev_page());
        assert_eq!(panel.users_page, 2);

        assert!(!panel.cards_prev_page());
        assert_eq!(panel.cards_page, 1);
    }

    #[test]
    fn changing_the_filter_resets_the_cursor() {
        let mut panel = panel();
        panel.cards_next_page();
        panel.cards_next_page();

        panel.set_card_filter(CardFilter {
            value: Some(5),
            used: Some(false),
        });

        assert_eq!(panel.cards_page, 1);
        assert_eq!(panel.card_filter.value, Some(5));
    }

    #[test]
    fn edits_merge_into_the_current_page() {
        let mut panel = panel();
        panel.users = vec![user(1, "Alice"), user(2, "Bob")];
        panel.users_total = 2;

        let mut renamed = user(2, "Robert");
        renamed.reward_count = 8;
        panel.merge_user(&renamed);

        assert_eq!(panel.users[1].nickname, "Robert");
        assert_eq!(panel.users[1].reward_count, 8);
        assert_eq!(panel.users[0].nickname, "Alice");
    }

    #[test]
    fn deletes_drop_locally_and_adjust_the_total() {
        let mut panel = panel();
        panel.users = vec![user(1, "Alice"), user(2, "Bob")];
        panel.users_total = 42;

        panel.drop_user_locally(1);

        assert_eq!(panel.users.len(), 1);
        assert_eq!(panel.users[0].id, 2);
        assert_eq!(panel.users_total, 41);
    }

    #[test]
    fn stats_summary_maps_all_six_fields() {
        let summary = StatsSummary::from(&sample_stats());

        assert_eq!(
            summary,
            StatsSummary {
                total_users: 50,
                claimed_users: 10,
                stock_10: 2,
                stock_5: 3,
                stock_3: 0,
                stock_1: 9,
            }
        );
    }

    #[tokio::test]
    async fn stored_password_needs_no_prompt() {
        let prompts = Arc::new(Mutex::new(0));
        let prompt_count = prompts.clone();

        let fetch = |_password: String| async { AuthOutcome::Authorized(sample_stats()) };
        let prompt = move || {
            *prompt_count.lock().unwrap() += 1;
            Some("unused".to_string())
        };

        let (password, _stats) = establish_session(Some("secret".to_string()), fetch, prompt)
            .await
            .unwrap();

        assert_eq!(password, "secret");
        assert_eq!(*prompts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn reprompts_exactly_once_per_rejection() {
        let attempts = Arc::new(Mutex::new(0));
        let prompts = Arc::new(Mutex::new(0));

        let attempt_count = attempts.clone();
        let fetch = move |password: String| {
            let attempt_count = attempt_count.clone();
            async move {
                *attempt_count.lock().unwrap() += 1;
                if password == "right" {
                    AuthOutcome::Authorized(sample_stats())
                } else {
                    AuthOutcome::Rejected
                }
            }
        };

        let prompt_count = prompts.clone();
        let answers = Arc::new(Mutex::new(VecDeque::from([
            "wrong again".to_string(),
            "right".to_string(),
        ])));
        let prompt = move || {
            *prompt_count.lock().unwrap() += 1;
            answers.lock().unwrap().pop_front()
        };

        let (password, _stats) = establish_session(Some("wrong".to_string()), fetch, prompt)
            .await
            .unwrap();

        assert_eq!(password, "right");
        assert_eq!(*attempts.lock().unwrap(), 3);
        assert_eq!(*prompts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn declining_the_prompt_aborts() {
        let fetch = |_password: String| async { AuthOutcome::Rejected };
        let prompt = || None;

        let result = establish_session(Some("wrong".to_string()), fetch, prompt).await;

        assert!(matches!(result, Err(SessionError::Aborted)));
    }

    #[tokio::test]
    async fn transport_failure_keeps_the_credential_and_stops() {
        let prompts = Arc::new(Mutex::new(0));
        let prompt_count = prompts.clone();

        let fetch =
            |_password: String| async { AuthOutcome::Unreachable("refused".to_string()) };
        let prompt = move || {
            *prompt_count.lock().unwrap() += 1;
            Some("another".to_string())
        };

        let result = establish_session(Some("secret".to_string()), fetch, prompt).await;

        assert!(matches!(result, Err(SessionError::Unreachable(_))));
        assert_eq!(*prompts.lock().unwrap(), 0);
    }
}
