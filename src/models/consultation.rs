use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "consultation_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationType {
    Video,
    HomeVisit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "consultation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Consultation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub consultation_type: ConsultationType,
    pub status: ConsultationStatus,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub address_id: Option<Uuid>,
    pub meeting_link: Option<String>,
    pub notes: Option<String>,
    pub measurement_notes: Option<String>,
    pub recommendations: Option<String>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub user_id: Uuid,
    pub consultation_type: ConsultationType,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub address_id: Option<Uuid>,
    pub notes: Option<String>,
}
