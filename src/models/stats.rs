use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Stats {
    pub users: UserTotals,
    pub stock: Stock,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct UserTotals {
    pub total: i64,
    pub claimed: i64,
}

/// Remaining unused cards per denomination. Serialized with the face
/// value as the key, as the admin surface expects.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct Stock {
    #[serde(rename = "10")]
    pub tens: i64,
    #[serde(rename = "5")]
    pub fives: i64,
    #[serde(rename = "3")]
    pub threes: i64,
    #[serde(rename = "1")]
    pub ones: i64,
}

impl Stock {
    pub fn set(&mut self, value: i32, count: i64) {
        match value {
            10 => self.tens = count,
            5 => self.fives = count,
            3 => self.threes = count,
            1 => self.ones = count,
            _ => {}
        }
    }
}
