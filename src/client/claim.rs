use colored::Colorize;

use super::ApiClient;
use crate::models::claims::{ClaimRequest, ClaimResult, GrantedCard};

pub const CONNECTION_FAILED_MESSAGE: &str =
    "could not reach the server, please try again later";

/// The public claim form: an identifier plus the contact number that
/// doubles as the claim password.
#[derive(Clone, Debug, Default)]
pub struct ClaimForm {
    pub uid: String,
    pub contact: String,
}

impl ClaimForm {
    /// Both fields must be non-empty after trimming; nothing is sent
    /// otherwise.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.uid.trim().is_empty() || self.contact.trim().is_empty() {
            return Err("please fill in both the identifier and the contact number");
        }

        Ok(())
    }

    /// Submits the claim. A failed validation short-circuits before
    /// any request goes out; every request failure collapses into a
    /// generic connectivity result, exactly like a backend-reported
    /// failure.
    pub async fn submit(&self, client: &ApiClient) -> Result<ClaimResult, &'static str> {
        self.validate()?;

        let request = ClaimRequest {
            uid: self.uid.trim().to_string(),
            contact: self.contact.trim().to_string(),
        };

        match client.claim(&request).await {
            Ok(result) => Ok(result),
            Err(error) => {
                log::warn!("claim request failed: {}", error);
                Ok(ClaimResult::failure(CONNECTION_FAILED_MESSAGE, "", 0))
            }
        }
    }
}

/// One line per granted card, ready for the terminal.
pub fn card_lines(cards: &[GrantedCard]) -> Vec<String> {
    cards
        .iter()
        .map(|card| format!("  {}  (value {})", card.code, card.value))
        .collect()
}

pub fn render_result(result: &ClaimResult) -> String {
    if result.success {
        let mut out = String::new();
        out.push_str(&format!("{}\n", result.message.green().bold()));
        out.push_str(&format!("total value: {}\n", result.total_value));
        for line in card_lines(result.cards.as_deref().unwrap_or(&[])) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    } else {
        format!("{}\n", result.message.red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_fail_validation() {
        let form = ClaimForm {
            uid: "U1".to_string(),
            contact: String::new(),
        };
        assert!(form.validate().is_err());

        let form = ClaimForm {
            uid: "   ".to_string(),
            contact: "10000".to_string(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn filled_form_passes_validation() {
        let form = ClaimForm {
            uid: " U1 ".to_string(),
            contact: "10000".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn empty_form_never_reaches_the_network() {
        // The URL is unroutable; a submission attempt would come back
        // as a connectivity *result*, while validation yields an Err.
        let client = ApiClient::new("http://127.0.0.1:1");
        let form = ClaimForm::default();

        assert!(form.submit(&client).await.is_err());
    }

    #[test]
    fn one_line_per_granted_card() {
        let cards = vec![
            GrantedCard {
                code: "AAAA-1111".to_string(),
                value: 10,
            },
            GrantedCard {
                code: "BBBB-2222".to_string(),
                value: 5,
            },
            GrantedCard {
                code: "CCCC-3333".to_string(),
                value: 3,
            },
        ];

        assert_eq!(card_lines(&cards).len(), cards.len());
    }
}
