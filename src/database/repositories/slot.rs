//! Event slot repository implementation

use sqlx::{PgConnection, PgPool};
use crate::models::event::{EventSlot, SlotFields};
use crate::utils::errors::PlanlyError;

#[derive(Clone, Debug)]
pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a slot for an event
    pub async fn insert(conn: &mut PgConnection, event_id: i64, fields: &SlotFields) -> Result<EventSlot, PlanlyError> {
        let slot = sqlx::query_as::<_, EventSlot>(
            r#"
            INSERT INTO event_slots (event_id, day, start_at, end_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, day, start_at, end_at
            "#
        )
        .bind(event_id)
        .bind(fields.day)
        .bind(&fields.start_at)
        .bind(&fields.end_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(slot)
    }

    /// Overwrite day and times of a slot that belongs to `event_id`
    pub async fn update(conn: &mut PgConnection, event_id: i64, slot_id: i64, fields: &SlotFields) -> Result<bool, PlanlyError> {
        let result = sqlx::query(
            "UPDATE event_slots SET day = $3, start_at = $4, end_at = $5 WHERE id = $1 AND event_id = $2"
        )
        .bind(slot_id)
        .bind(event_id)
        .bind(fields.day)
        .bind(&fields.start_at)
        .bind(&fields.end_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete slots of an event; their participations cascade
    pub async fn delete_many(conn: &mut PgConnection, event_id: i64, slot_ids: &[i64]) -> Result<u64, PlanlyError> {
        if slot_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM event_slots WHERE event_id = $1 AND id = ANY($2)")
            .bind(event_id)
            .bind(slot_ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Slots of an event inside a transaction, ordered by day and start
    pub async fn list_for_event_in(conn: &mut PgConnection, event_id: i64) -> Result<Vec<EventSlot>, PlanlyError> {
        let slots = sqlx::query_as::<_, EventSlot>(
            "SELECT id, event_id, day, start_at, end_at FROM event_slots WHERE event_id = $1 ORDER BY day ASC, start_at ASC, id ASC"
        )
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(slots)
    }

    /// Slots of several events, ordered by day and start
    pub async fn list_for_events(&self, event_ids: &[i64]) -> Result<Vec<EventSlot>, PlanlyError> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let slots = sqlx::query_as::<_, EventSlot>(
            "SELECT id, event_id, day, start_at, end_at FROM event_slots WHERE event_id = ANY($1) ORDER BY day ASC, start_at ASC, id ASC"
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }
}
