use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::cards::DENOMINATIONS;
use crate::models::claims::ClaimResult;
use crate::repositories::cards::{AllocationOutcome, CardRepository};
use crate::repositories::users::UserRepository;

pub enum ClaimServiceRequest {
    Claim {
        uid: String,
        contact: String,
        response: oneshot::Sender<Result<ClaimResult, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ClaimRequestHandler {
    users: UserRepository,
    cards: CardRepository,
}

impl ClaimRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        ClaimRequestHandler {
            users: UserRepository::new(sql_conn.clone()),
            cards: CardRepository::new(sql_conn),
        }
    }

    /// The claim pipeline: look the user up, check the contact number
    /// (it doubles as the claim password), refuse repeat claims, work
    /// out a denomination combination and allocate it. Business
    /// failures come back as `success = false` results; only lookup
    /// errors bubble up as service errors.
    async fn claim(&self, uid: &str, contact: &str) -> Result<ClaimResult, ServiceError> {
        let user = self
            .users
            .find_by_uid(uid)
            .await
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        let user = match user {
            Some(user) => user,
            None => {
                return Ok(ClaimResult::failure(
                    "claim failed: no user with that identifier, please check your input",
                    "",
                    0,
                ))
            }
        };

        if user.contact != contact {
            return Ok(ClaimResult::failure(
                "claim failed: the contact number does not match, please try again",
                user.nickname.clone(),
                user.reward_count,
            ));
        }

        if user.has_claimed {
            return Ok(already_claimed(&user.nickname, user.reward_count));
        }

        let combination = match combination_for(user.reward_count) {
            Some(combination) => combination,
            None => {
                return Ok(ClaimResult::failure(
                    format!(
                        "no card combination adds up to {}, please contact the administrator",
                        user.reward_count
                    ),
                    user.nickname.clone(),
                    user.reward_count,
                ))
            }
        };

        match self.cards.allocate(&user, &combination).await {
            Ok(AllocationOutcome::Granted(cards)) => Ok(ClaimResult {
                success: true,
                message: "claim successful, thank you for your support!".to_string(),
                nickname: user.nickname.clone(),
                total_value: user.reward_count,
                cards: Some(cards),
            }),
            Ok(AllocationOutcome::OutOfStock) => Ok(ClaimResult::failure(
                "the remaining stock cannot cover your cards, please contact the administrator",
                user.nickname.clone(),
                user.reward_count,
            )),
            Ok(AllocationOutcome::AlreadyClaimed) => {
                Ok(already_claimed(&user.nickname, user.reward_count))
            }
            Err(e) => {
                log::error!("allocation for {} failed: {}", uid, e);
                Ok(ClaimResult::failure(
                    "something went wrong during the claim, please retry or contact the administrator",
                    user.nickname.clone(),
                    user.reward_count,
                ))
            }
        }
    }
}

fn already_claimed(nickname: &str, reward_count: i32) -> ClaimResult {
    ClaimResult::failure(
        format!("{} has already claimed and cannot claim again", nickname),
        nickname,
        reward_count,
    )
}

/// Greedy combination over the denominations, largest first. Any
/// positive target is reachable since the smallest denomination is 1;
/// everything else has no combination.
pub fn combination_for(target: i32) -> Option<Vec<(i32, i64)>> {
    if target <= 0 {
        return None;
    }

    let mut remaining = target;
    let mut combination = Vec::new();
    for &value in DENOMINATIONS.iter() {
        if remaining >= value {
            let count = remaining / value;
            combination.push((value, count as i64));
            remaining -= count * value;
        }
    }

    if remaining != 0 {
        return None;
    }

    Some(combination)
}

#[async_trait]
impl RequestHandler<ClaimServiceRequest> for ClaimRequestHandler {
    async fn handle_request(&self, request: ClaimServiceRequest) {
        match request {
            ClaimServiceRequest::Claim {
                uid,
                contact,
                response,
            } => {
                let result = self.claim(&uid, &contact).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct ClaimService;

impl ClaimService {
    pub fn new() -> Self {
        ClaimService {}
    }
}

#[async_trait]
impl Service<ClaimServiceRequest, ClaimRequestHandler> for ClaimService {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_prefers_large_denominations() {
        assert_eq!(
            combination_for(18),
            Some(vec![(10, 1), (5, 1), (3, 1)])
        );
    }

    #[test]
    fn falls_back_to_ones() {
        assert_eq!(combination_for(7), Some(vec![(5, 1), (1, 2)]));
        assert_eq!(combination_for(2), Some(vec![(1, 2)]));
    }

    #[test]
    fn multiple_of_one_denomination() {
        assert_eq!(combination_for(30), Some(vec![(10, 3)]));
    }

    #[test]
    fn non_positive_targets_have_no_combination() {
        assert_eq!(combination_for(0), None);
        assert_eq!(combination_for(-4), None);
    }

    #[test]
    fn combination_sums_to_target() {
        for target in 1..200 {
            let combination = combination_for(target).unwrap();
            let sum: i64 = combination
                .iter()
                .map(|&(value, count)| value as i64 * count)
                .sum();
            assert_eq!(sum, target as i64);
        }
    }
}
