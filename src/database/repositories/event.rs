//! Event repository implementation

use sqlx::{PgConnection, PgPool};
use chrono::{DateTime, NaiveDate, Utc};
use crate::models::event::{Event, NewEvent};
use crate::utils::errors::PlanlyError;

const EVENT_COLUMNS: &str =
    "e.id, e.title, e.description, e.created_by, e.created_at, e.is_confirmed, e.confirmed_at, e.confirmed_slot_id";

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event row
    pub async fn insert(conn: &mut PgConnection, event: &NewEvent) -> Result<Event, PlanlyError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, created_by, created_at, is_confirmed, confirmed_at, confirmed_slot_id
            "#
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.created_by)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, PlanlyError> {
        let event = sqlx::query_as::<_, Event>(
            &format!("SELECT {} FROM events e WHERE e.id = $1", EVENT_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Lock an event row for the rest of the transaction
    pub async fn find_for_update(conn: &mut PgConnection, id: i64) -> Result<Option<Event>, PlanlyError> {
        let event = sqlx::query_as::<_, Event>(
            &format!("SELECT {} FROM events e WHERE e.id = $1 FOR UPDATE", EVENT_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(event)
    }

    /// Take a shared lock on an event row; `false` if the event does not exist
    pub async fn lock_shared(conn: &mut PgConnection, id: i64) -> Result<bool, PlanlyError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.is_some())
    }

    /// Overwrite title and description
    pub async fn update_details(
        conn: &mut PgConnection,
        id: i64,
        title: &str,
        description: Option<&str>,
    ) -> Result<bool, PlanlyError> {
        let result = sqlx::query("UPDATE events SET title = $2, description = $3 WHERE id = $1")
            .bind(id)
            .bind(title)
            .bind(description)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete event; slots and participations cascade
    pub async fn delete(&self, id: i64) -> Result<bool, PlanlyError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Confirm an unconfirmed event on one of its own slots.
    ///
    /// Returns `None` when the event is missing, already confirmed, or the
    /// slot belongs elsewhere; the caller reloads to tell these apart.
    pub async fn confirm(
        &self,
        id: i64,
        slot_id: i64,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Option<Event>, PlanlyError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET is_confirmed = TRUE,
                confirmed_at = $3,
                confirmed_slot_id = $2
            WHERE id = $1
              AND is_confirmed = FALSE
              AND EXISTS (SELECT 1 FROM event_slots s WHERE s.id = $2 AND s.event_id = $1)
            RETURNING id, title, description, created_by, created_at, is_confirmed, confirmed_at, confirmed_slot_id
            "#
        )
        .bind(id)
        .bind(slot_id)
        .bind(confirmed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Get events created by user, newest first
    pub async fn list_by_creator(&self, creator: &str) -> Result<Vec<Event>, PlanlyError> {
        let events = sqlx::query_as::<_, Event>(
            &format!(
                "SELECT {} FROM events e WHERE e.created_by = $1 ORDER BY e.created_at DESC, e.id DESC",
                EVENT_COLUMNS
            )
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events where the user answered a slot on or after `today`
    pub async fn list_with_upcoming_participation(&self, user_id: &str, today: NaiveDate) -> Result<Vec<Event>, PlanlyError> {
        let events = sqlx::query_as::<_, Event>(
            &format!(
                r#"
                SELECT {} FROM events e
                WHERE EXISTS (
                    SELECT 1 FROM event_slots s
                    INNER JOIN event_participations p ON p.slot_id = s.id
                    WHERE s.event_id = e.id AND s.day >= $2 AND p.user_id = $1
                )
                ORDER BY e.created_at DESC, e.id DESC
                "#,
                EVENT_COLUMNS
            )
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Confirmed events the user answered, split on the confirmed slot's day
    pub async fn list_confirmed_with_participant(
        &self,
        user_id: &str,
        today: NaiveDate,
        before: bool,
    ) -> Result<Vec<Event>, PlanlyError> {
        let day_predicate = if before { "cs.day < $2" } else { "cs.day >= $2" };
        let events = sqlx::query_as::<_, Event>(
            &format!(
                r#"
                SELECT {} FROM events e
                INNER JOIN event_slots cs ON cs.id = e.confirmed_slot_id
                WHERE e.is_confirmed = TRUE
                  AND {}
                  AND EXISTS (
                    SELECT 1 FROM event_participations p
                    WHERE p.event_id = e.id AND p.user_id = $1
                  )
                ORDER BY e.created_at DESC, e.id DESC
                "#,
                EVENT_COLUMNS, day_predicate
            )
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, PlanlyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
