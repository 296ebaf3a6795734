use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClaimRequest {
    pub uid: String,
    pub contact: String,
}

/// A card handed out by a successful claim.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GrantedCard {
    pub code: String,
    pub value: i32,
}

/// Outcome of one claim attempt. Business failures are carried here
/// with `success = false`; only infrastructure errors surface as HTTP
/// errors.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClaimResult {
    pub success: bool,
    pub message: String,
    pub nickname: String,
    pub total_value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<GrantedCard>>,
}

impl ClaimResult {
    pub fn failure(
        message: impl Into<String>,
        nickname: impl Into<String>,
        total_value: i32,
    ) -> Self {
        ClaimResult {
            success: false,
            message: message.into(),
            nickname: nickname.into(),
            total_value,
            cards: None,
        }
    }
}
