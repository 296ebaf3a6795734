use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub uid: String,
    pub nickname: String,
    pub contact: String,
    pub reward_count: i32,
    pub has_claimed: bool,
    pub claimed_at: Option<chrono::NaiveDateTime>,
}

/// One record of a bulk import, already tokenized.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserImport {
    pub uid: String,
    pub nickname: String,
    pub contact: String,
    pub count: i32,
}

/// Partial update; absent fields keep their current value. Clearing
/// `has_claimed` also clears the claim timestamp.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UserUpdate {
    pub nickname: Option<String>,
    pub contact: Option<String>,
    pub reward_count: Option<i32>,
    pub has_claimed: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
