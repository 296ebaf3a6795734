use serde::{Deserialize, Serialize};

/// Face values a card can carry, largest first. Claim combinations are
/// computed over these denominations.
pub const DENOMINATIONS: [i32; 4] = [10, 5, 3, 1];

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Card {
    pub id: i32,
    pub code: String,
    pub value: i32,
    pub is_used: bool,
    pub used_by: Option<String>,
    pub used_at: Option<chrono::NaiveDateTime>,
}

/// Partial update; clearing `is_used` also clears the claimant fields.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CardUpdate {
    pub code: Option<String>,
    pub value: Option<i32>,
    pub is_used: Option<bool>,
}

/// Bulk-add request: newline-delimited codes, all at one face value.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CardBatch {
    pub content: String,
    pub value: i32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct CardFilter {
    pub value: Option<i32>,
    pub used: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CardPage {
    pub cards: Vec<Card>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
