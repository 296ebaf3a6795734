use crate::models::cards::{Card, CardFilter, CardUpdate};
use crate::models::claims::GrantedCard;
use crate::models::stats::Stock;
use crate::models::users::User;

use anyhow::bail;
use sqlx::{PgPool, Postgres, QueryBuilder};

const CARD_COLUMNS: &str = "id, code, value, is_used, used_by, used_at";

/// Result of trying to allocate a card combination for one user.
pub enum AllocationOutcome {
    Granted(Vec<GrantedCard>),
    OutOfStock,
    AlreadyClaimed,
}

#[derive(Clone)]
pub struct CardRepository {
    conn: PgPool,
}

impl CardRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn list_paginated(
        &self,
        page: i64,
        page_size: i64,
        filter: &CardFilter,
    ) -> Result<(Vec<Card>, i64), anyhow::Error> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cards");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.conn)
            .await?;

        let mut list_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM cards", CARD_COLUMNS));
        push_filter(&mut list_query, filter);
        list_query
            .push(" ORDER BY id OFFSET ")
            .push_bind((page - 1) * page_size)
            .push(" LIMIT ")
            .push_bind(page_size);
        let cards = list_query
            .build_query_as::<Card>()
            .fetch_all(&self.conn)
            .await?;

        Ok((cards, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Card>, anyhow::Error> {
        let card = sqlx::query_as::<_, Card>(&format!(
            "SELECT {} FROM cards WHERE id = $1",
            CARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(card)
    }

    /// Inserts one card per non-blank line; codes that already exist
    /// are skipped. Returns the number actually inserted.
    pub async fn add_batch(&self, content: &str, value: i32) -> Result<u64, anyhow::Error> {
        let mut inserted = 0;
        for code in batch_codes(content) {
            let result = sqlx::query(
                r#"
                    INSERT INTO cards (code, value, is_used)
                    VALUES ($1, $2, false)
                    ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(code)
            .bind(value)
            .execute(&self.conn)
            .await?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    pub async fn update(
        &self,
        id: i32,
        data: &CardUpdate,
    ) -> Result<Option<Card>, anyhow::Error> {
        let mut card = match self.find_by_id(id).await? {
            Some(card) => card,
            None => return Ok(None),
        };

        apply_update(&mut card, data);

        let card = sqlx::query_as::<_, Card>(&format!(
            r#"
                UPDATE cards
                SET code = $2, value = $3, is_used = $4, used_by = $5, used_at = $6
                WHERE id = $1
                RETURNING {}
            "#,
            CARD_COLUMNS
        ))
        .bind(id)
        .bind(&card.code)
        .bind(card.value)
        .bind(card.is_used)
        .bind(&card.used_by)
        .bind(card.used_at)
        .fetch_one(&self.conn)
        .await?;

        Ok(Some(card))
    }

    pub async fn delete(&self, id: i32) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn stock_counts(&self) -> Result<Stock, anyhow::Error> {
        let rows: Vec<(i32, i64)> =
            sqlx::query_as("SELECT value, COUNT(*) FROM cards WHERE NOT is_used GROUP BY value")
                .fetch_all(&self.conn)
                .await?;

        let mut stock = Stock::default();
        for (value, count) in rows {
            stock.set(value, count);
        }

        Ok(stock)
    }

    /// Marks the combination's cards as used by the given user and
    /// flips the user's claim flag, all inside one transaction. Row
    /// locks keep two concurrent claims from handing out the same card
    /// or letting a user claim twice; any shortage rolls everything
    /// back.
    pub async fn allocate(
        &self,
        user: &User,
        combination: &[(i32, i64)],
    ) -> Result<AllocationOutcome, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let has_claimed: Option<bool> =
            sqlx::query_scalar("SELECT has_claimed FROM users WHERE id = $1 FOR UPDATE")
                .bind(user.id)
                .fetch_optional(&mut *tx)
                .await?;
        match has_claimed {
            None => bail!("user {} vanished during allocation", user.uid),
            Some(true) => return Ok(AllocationOutcome::AlreadyClaimed),
            Some(false) => {}
        }

        let now = chrono::Utc::now().naive_utc();
        let mut granted = Vec::new();

        for &(value, count) in combination {
            if count <= 0 {
                continue;
            }

            let picked: Vec<(i32, String)> = sqlx::query_as(
                r#"
                    SELECT id, code FROM cards
                    WHERE value = $1 AND NOT is_used
                    ORDER BY id
                    LIMIT $2
                    FOR UPDATE
                "#,
            )
            .bind(value)
            .bind(count)
            .fetch_all(&mut *tx)
            .await?;

            if (picked.len() as i64) < count {
                tx.rollback().await?;
                return Ok(AllocationOutcome::OutOfStock);
            }

            let ids: Vec<i32> = picked.iter().map(|(id, _)| *id).collect();
            sqlx::query("UPDATE cards SET is_used = true, used_by = $1, used_at = $2 WHERE id = ANY($3)")
                .bind(&user.uid)
                .bind(now)
                .bind(ids)
                .execute(&mut *tx)
                .await?;

            granted.extend(
                picked
                    .into_iter()
                    .map(|(_, code)| GrantedCard { code, value }),
            );
        }

        sqlx::query("UPDATE users SET has_claimed = true, claimed_at = $2 WHERE id = $1")
            .bind(user.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(AllocationOutcome::Granted(granted))
    }
}

/// One code per line, trimmed; blank lines carry nothing.
fn batch_codes(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .collect()
}

fn push_filter(query: &mut QueryBuilder<Postgres>, filter: &CardFilter) {
    let mut prefix = " WHERE ";
    if let Some(value) = filter.value {
        query.push(prefix).push("value = ").push_bind(value);
        prefix = " AND ";
    }
    if let Some(used) = filter.used {
        query.push(prefix).push("is_used = ").push_bind(used);
    }
}

fn apply_update(card: &mut Card, data: &CardUpdate) {
    if let Some(code) = &data.code {
        card.code = code.clone();
    }
    if let Some(value) = data.value {
        card.value = value;
    }
    if let Some(is_used) = data.is_used {
        card.is_used = is_used;
        if !is_used {
            card.used_by = None;
            card.used_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used_card() -> Card {
        Card {
            id: 7,
            code: "ABCD-1234".to_string(),
            value: 5,
            is_used: true,
            used_by: Some("U1".to_string()),
            used_at: Some(chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap().into()),
        }
    }

    #[test]
    fn blank_lines_carry_no_codes() {
        let codes = batch_codes("AAAA-1111\n\n  BBBB-2222  \n\t\nCCCC-3333\n");

        assert_eq!(codes, vec!["AAAA-1111", "BBBB-2222", "CCCC-3333"]);
    }

    #[test]
    fn clearing_used_flag_clears_claimant() {
        let mut card = used_card();
        apply_update(
            &mut card,
            &CardUpdate {
                is_used: Some(false),
                ..Default::default()
            },
        );

        assert!(!card.is_used);
        assert!(card.used_by.is_none());
        assert!(card.used_at.is_none());
    }

    #[test]
    fn absent_fields_keep_their_values() {
        let mut card = used_card();
        apply_update(
            &mut card,
            &CardUpdate {
                value: Some(10),
                ..Default::default()
            },
        );

        assert_eq!(card.value, 10);
        assert_eq!(card.code, "ABCD-1234");
        assert!(card.is_used);
        assert_eq!(card.used_by.as_deref(), Some("U1"));
    }
}
