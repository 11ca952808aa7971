use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    database::Database,
    models::{Consultation, ConsultationStatus, NewConsultation},
};

pub async fn create(conn: &mut PgConnection, consultation: &NewConsultation) -> Result<Consultation, sqlx::Error> {
    sqlx::query_as::<_, Consultation>(
        r#"
        INSERT INTO consultations (user_id, consultation_type, status, scheduled_at, duration_minutes, address_id, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(consultation.user_id)
    .bind(consultation.consultation_type)
    .bind(ConsultationStatus::Scheduled)
    .bind(consultation.scheduled_at)
    .bind(consultation.duration_minutes)
    .bind(consultation.address_id)
    .bind(&consultation.notes)
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(db: &Database, consultation_id: Uuid) -> Result<Option<Consultation>, sqlx::Error> {
    sqlx::query_as::<_, Consultation>("SELECT * FROM consultations WHERE id = $1")
        .bind(consultation_id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_user(db: &Database, user_id: Uuid) -> Result<Vec<Consultation>, sqlx::Error> {
    sqlx::query_as::<_, Consultation>(
        "SELECT * FROM consultations WHERE user_id = $1 ORDER BY scheduled_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_all(db: &Database, status: Option<ConsultationStatus>) -> Result<Vec<Consultation>, sqlx::Error> {
    let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM consultations");
    if let Some(status) = status {
        query_builder.push(" WHERE status = ").push_bind(status);
    }
    query_builder.push(" ORDER BY scheduled_at");

    query_builder.build_query_as::<Consultation>().fetch_all(db).await
}

/// Persists a status change. A reschedule moves the appointment and clears
/// the reminder marker so the new slot gets its own reminder.
pub async fn update(db: &Database, consultation: &Consultation) -> Result<Consultation, sqlx::Error> {
    sqlx::query_as::<_, Consultation>(
        r#"
        UPDATE consultations SET
            status = $1,
            scheduled_at = $2,
            meeting_link = $3,
            measurement_notes = $4,
            recommendations = $5,
            reminder_sent_at = $6,
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(consultation.status)
    .bind(consultation.scheduled_at)
    .bind(&consultation.meeting_link)
    .bind(&consultation.measurement_notes)
    .bind(&consultation.recommendations)
    .bind(consultation.reminder_sent_at)
    .bind(consultation.id)
    .fetch_one(db)
    .await
}

pub async fn due_for_reminder(
    db: &Database,
    now: DateTime<Utc>,
    horizon: DateTime<Utc>,
) -> Result<Vec<Consultation>, sqlx::Error> {
    sqlx::query_as::<_, Consultation>(
        r#"
        SELECT * FROM consultations
        WHERE status IN ('SCHEDULED', 'RESCHEDULED')
          AND reminder_sent_at IS NULL
          AND scheduled_at > $1
          AND scheduled_at <= $2
        ORDER BY scheduled_at
        "#,
    )
    .bind(now)
    .bind(horizon)
    .fetch_all(db)
    .await
}

pub async fn mark_reminded(db: &Database, consultation_id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE consultations SET reminder_sent_at = $1 WHERE id = $2")
        .bind(at)
        .bind(consultation_id)
        .execute(db)
        .await?;
    Ok(())
}
