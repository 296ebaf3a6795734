use crate::models::users::{User, UserImport, UserUpdate};

use sqlx::PgPool;

const USER_COLUMNS: &str = "id, uid, nickname, contact, reward_count, has_claimed, claimed_at";

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE uid = $1",
            USER_COLUMNS
        ))
        .bind(uid)
        .fetch_optional(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn list_paginated(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<User>, i64), anyhow::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.conn)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id OFFSET $1 LIMIT $2",
            USER_COLUMNS
        ))
        .bind((page - 1) * page_size)
        .bind(page_size)
        .fetch_all(&self.conn)
        .await?;

        Ok((users, total))
    }

    /// Inserts the record, or overwrites nickname/contact/reward count
    /// for an existing uid. An existing user keeps its claim state; a
    /// new user starts unclaimed.
    pub async fn upsert_import(&self, record: &UserImport) -> Result<User, anyhow::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
                INSERT INTO users (uid, nickname, contact, reward_count, has_claimed)
                VALUES ($1, $2, $3, $4, false)
                ON CONFLICT (uid) DO UPDATE SET
                    nickname = EXCLUDED.nickname,
                    contact = EXCLUDED.contact,
                    reward_count = EXCLUDED.reward_count
                RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&record.uid)
        .bind(&record.nickname)
        .bind(&record.contact)
        .bind(record.count)
        .fetch_one(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn update(
        &self,
        id: i32,
        data: &UserUpdate,
    ) -> Result<Option<User>, anyhow::Error> {
        let mut user = match self.find_by_id(id).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        apply_update(&mut user, data);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
                UPDATE users
                SET nickname = $2, contact = $3, reward_count = $4,
                    has_claimed = $5, claimed_at = $6
                WHERE id = $1
                RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&user.nickname)
        .bind(&user.contact)
        .bind(user.reward_count)
        .bind(user.has_claimed)
        .bind(user.claimed_at)
        .fetch_one(&self.conn)
        .await?;

        Ok(Some(user))
    }

    pub async fn delete(&self, id: i32) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn totals(&self) -> Result<(i64, i64), anyhow::Error> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.conn)
            .await?;
        let claimed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE has_claimed")
            .fetch_one(&self.conn)
            .await?;

        Ok((total, claimed))
    }
}

fn apply_update(user: &mut User, data: &UserUpdate) {
    if let Some(nickname) = &data.nickname {
        user.nickname = nickname.clone();
    }
    if let Some(contact) = &data.contact {
        user.contact = contact.clone();
    }
    if let Some(reward_count) = data.reward_count {
        user.reward_count = reward_count;
    }
    if let Some(has_claimed) = data.has_claimed {
        user.has_claimed = has_claimed;
        if !has_claimed {
            user.claimed_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed_user() -> User {
        User {
            id: 1,
            uid: "U1".to_string(),
            nickname: "Alice".to_string(),
            contact: "10000".to_string(),
            reward_count: 3,
            has_claimed: true,
            claimed_at: Some(chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap().into()),
        }
    }

    #[test]
    fn absent_fields_keep_their_values() {
        let mut user = claimed_user();
        apply_update(&mut user, &UserUpdate::default());

        assert_eq!(user.nickname, "Alice");
        assert_eq!(user.reward_count, 3);
        assert!(user.has_claimed);
        assert!(user.claimed_at.is_some());
    }

    #[test]
    fn clearing_claim_flag_clears_timestamp() {
        let mut user = claimed_user();
        apply_update(
            &mut user,
            &UserUpdate {
                has_claimed: Some(false),
                ..Default::default()
            },
        );

        assert!(!user.has_claimed);
        assert!(user.claimed_at.is_none());
    }

    #[test]
    fn setting_claim_flag_keeps_timestamp() {
        let mut user = claimed_user();
        let before = user.claimed_at;
        apply_update(
            &mut user,
            &UserUpdate {
                nickname: Some("Alicia".to_string()),
                has_claimed: Some(true),
                ..Default::default()
            },
        );

        assert_eq!(user.nickname, "Alicia");
        assert_eq!(user.claimed_at, before);
    }
}
