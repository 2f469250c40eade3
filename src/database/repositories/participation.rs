//! Participation repository implementation

use sqlx::{FromRow, PgConnection, PgPool};
use chrono::Utc;
use crate::models::participation::{Participation, ParticipationRow, ParticipationUpsert};
use crate::models::views::ParticipationRecord;
use crate::utils::errors::PlanlyError;

const PARTICIPATION_COLUMNS: &str =
    "p.id, p.event_id, p.slot_id, p.user_id, p.status, p.comment, p.created_at, p.updated_at";

/// Participation row joined with the responder's display name
#[derive(Debug, Clone, FromRow)]
struct ParticipationJoinRow {
    #[sqlx(flatten)]
    participation: ParticipationRow,
    user_name: Option<String>,
}

impl TryFrom<ParticipationJoinRow> for ParticipationRecord {
    type Error = PlanlyError;

    fn try_from(joined: ParticipationJoinRow) -> Result<Self, Self::Error> {
        Ok(Self {
            participation: decode(joined.participation)?,
            user_name: joined.user_name,
        })
    }
}

fn decode(row: ParticipationRow) -> Result<Participation, PlanlyError> {
    Participation::try_from(row).map_err(|e| PlanlyError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[derive(Clone, Debug)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or overwrite the response of `user_id` to one slot.
    ///
    /// Single statement keyed on the (event, slot, user) unique constraint.
    pub async fn upsert(
        conn: &mut PgConnection,
        event_id: i64,
        user_id: &str,
        response: &ParticipationUpsert,
    ) -> Result<Participation, PlanlyError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ParticipationRow>(
            r#"
            INSERT INTO event_participations (event_id, slot_id, user_id, status, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (event_id, slot_id, user_id) DO UPDATE
            SET status = EXCLUDED.status,
                comment = EXCLUDED.comment,
                updated_at = EXCLUDED.updated_at
            RETURNING id, event_id, slot_id, user_id, status, comment, created_at, updated_at
            "#
        )
        .bind(event_id)
        .bind(response.slot_id)
        .bind(user_id)
        .bind(response.status.symbol())
        .bind(&response.comment)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        decode(row)
    }

    /// Participations on the given events, with display names
    pub async fn list_for_events(&self, event_ids: &[i64]) -> Result<Vec<ParticipationRecord>, PlanlyError> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ParticipationJoinRow>(
            &format!(
                r#"
                SELECT {}, u.name AS user_name
                FROM event_participations p
                LEFT JOIN users u ON u.id = p.user_id
                WHERE p.event_id = ANY($1)
                ORDER BY p.slot_id ASC, p.created_at ASC, p.id ASC
                "#,
                PARTICIPATION_COLUMNS
            )
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ParticipationRecord::try_from).collect()
    }

    /// Count participations of one event
    pub async fn count_for_event(&self, event_id: i64) -> Result<i64, PlanlyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_participations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
