use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{Address, Consultation, ConsultationStatus, ConsultationType, NewConsultation},
    notifications::{ConsultationEvent, Recipient},
    repository::{addresses, consultations, users},
    state::AppState,
    validation::{is_ncr_pincode, AddressInput, ConsultationBookingInput},
};

const DEFAULT_DURATION_MINUTES: i32 = 60;
const REMINDER_HORIZON_HOURS: i64 = 24;
const OUTSIDE_SERVICE_AREA: &str = "Home visits are available in Delhi NCR only";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationStatusChange {
    pub status: ConsultationStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub meeting_link: Option<String>,
    pub measurement_notes: Option<String>,
    pub recommendations: Option<String>,
}

pub fn can_transition(from: ConsultationStatus, to: ConsultationStatus) -> bool {
    use ConsultationStatus::*;

    match from {
        Scheduled | Rescheduled => matches!(to, InProgress | Completed | Cancelled | Rescheduled),
        InProgress => matches!(to, Completed | Cancelled),
        Completed | Cancelled => false,
    }
}

/// Applies a status change in memory. Rescheduling needs a new time in the
/// future and re-arms the reminder.
pub fn apply_status_change(
    consultation: &mut Consultation,
    change: ConsultationStatusChange,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if !can_transition(consultation.status, change.status) {
        return Err(AppError::Conflict(format!(
            "Consultation cannot move from {:?} to {:?}",
            consultation.status, change.status
        )));
    }

    if change.status == ConsultationStatus::Rescheduled {
        let at = change
            .scheduled_at
            .ok_or_else(|| AppError::invalid("scheduled_at", "A new time is required to reschedule"))?;
        if at <= now {
            return Err(AppError::invalid("scheduled_at", "Pick a time in the future"));
        }
        consultation.scheduled_at = at;
        consultation.reminder_sent_at = None;
    }

    consultation.status = change.status;
    if change.meeting_link.is_some() {
        consultation.meeting_link = change.meeting_link;
    }
    if change.measurement_notes.is_some() {
        consultation.measurement_notes = change.measurement_notes;
    }
    if change.recommendations.is_some() {
        consultation.recommendations = change.recommendations;
    }
    Ok(())
}

/// Where a home visit takes place: a saved address, or one typed into the
/// booking that still has to be stored.
enum VisitAddress<'a> {
    Saved(Address),
    New(&'a AddressInput),
}

/// Resolves and checks the visit address without writing anything.
async fn visit_address<'a>(
    state: &AppState,
    user: &CurrentUser,
    input: &'a ConsultationBookingInput,
) -> AppResult<Option<VisitAddress<'a>>> {
    if input.consultation_type != ConsultationType::HomeVisit {
        return Ok(None);
    }

    if let Some(address) = &input.address {
        if !is_ncr_pincode(&address.pincode) {
            return Err(AppError::invalid("address.pincode", OUTSIDE_SERVICE_AREA));
        }
        return Ok(Some(VisitAddress::New(address)));
    }

    let address_id = input
        .address_id
        .ok_or_else(|| AppError::invalid("address", "An address is required for home visits"))?;
    let address = addresses::find_for_user(&state.db, address_id, user.id)
        .await?
        .ok_or_else(|| AppError::invalid("address_id", "Address not found"))?;
    if !is_ncr_pincode(&address.pincode) {
        return Err(AppError::invalid("address_id", OUTSIDE_SERVICE_AREA));
    }
    Ok(Some(VisitAddress::Saved(address)))
}

/// Books a consultation. A new visit address and the booking are written
/// in one transaction.
pub async fn book(state: &AppState, user: &CurrentUser, input: ConsultationBookingInput) -> AppResult<Consultation> {
    input.validate_at(Utc::now())?;

    let visit = visit_address(state, user, &input).await?;

    let mut tx = state.db.begin().await?;
    let address = match visit {
        Some(VisitAddress::Saved(address)) => Some(address),
        Some(VisitAddress::New(address)) => Some(addresses::insert(&mut tx, user.id, address).await?),
        None => None,
    };
    let consultation = consultations::create(
        &mut tx,
        &NewConsultation {
            user_id: user.id,
            consultation_type: input.consultation_type,
            scheduled_at: input.scheduled_at,
            duration_minutes: input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            address_id: address.as_ref().map(|address| address.id),
            notes: input.notes.clone(),
        },
    )
    .await?;
    tx.commit().await?;
    log::info!("Consultation {} booked by {}", consultation.id, user.email);

    let location = address.as_ref().map(Address::one_line);
    state.notifier.consultation_event(
        &user.recipient(),
        &consultation,
        ConsultationEvent::Booked,
        location.as_deref(),
    );

    Ok(consultation)
}

async fn notify(state: &AppState, consultation: &Consultation, event: ConsultationEvent) {
    let customer = match users::find_by_id(&state.db, consultation.user_id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            log::warn!("Consultation {} has no customer to notify", consultation.id);
            return;
        }
        Err(e) => {
            log::error!("Failed to load customer for consultation {}: {}", consultation.id, e);
            return;
        }
    };

    let location = match consultation.address_id {
        Some(address_id) => match addresses::find_by_id(&state.db, address_id).await {
            Ok(address) => address.map(|address| address.one_line()),
            Err(e) => {
                log::warn!("Failed to load address for consultation {}: {}", consultation.id, e);
                None
            }
        },
        None => None,
    };

    state
        .notifier
        .consultation_event(&Recipient::from(&customer), consultation, event, location.as_deref());
}

pub async fn change_status(
    state: &AppState,
    consultation_id: Uuid,
    change: ConsultationStatusChange,
) -> AppResult<Consultation> {
    let mut consultation = consultations::find_by_id(&state.db, consultation_id)
        .await?
        .ok_or(AppError::NotFound("consultation"))?;

    let previous = consultation.status;
    apply_status_change(&mut consultation, change, Utc::now())?;
    let updated = consultations::update(&state.db, &consultation).await?;
    log::info!("Consultation {} moved from {:?} to {:?}", updated.id, previous, updated.status);

    notify(state, &updated, ConsultationEvent::StatusChanged).await;
    Ok(updated)
}

/// Queues reminders for appointments starting within the next day that
/// have not had one yet. Returns how many were sent.
pub async fn send_due_reminders(state: &AppState, now: DateTime<Utc>) -> AppResult<usize> {
    let horizon = now + chrono::Duration::hours(REMINDER_HORIZON_HOURS);
    let due = consultations::due_for_reminder(&state.db, now, horizon).await?;

    let sent = remind_each(due, |consultation| async move {
        consultations::mark_reminded(&state.db, consultation.id, now).await?;
        notify(state, &consultation, ConsultationEvent::Reminder).await;
        Ok(())
    })
    .await;

    if sent > 0 {
        log::info!("Sent {} consultation reminders", sent);
    }
    Ok(sent)
}

/// Runs `remind` for every due consultation. A failure is logged and the
/// rest still get their reminder; the failed one is retried next sweep.
async fn remind_each<F, Fut>(due: Vec<Consultation>, mut remind: F) -> usize
where
    F: FnMut(Consultation) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let mut sent = 0;
    for consultation in due {
        let id = consultation.id;
        match remind(consultation).await {
            Ok(()) => sent += 1,
            Err(e) => log::error!("Failed to send reminder for consultation {}: {}", id, e),
        }
    }
    sent
}

pub fn spawn_reminder_task(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = send_due_reminders(&state, Utc::now()).await {
                log::error!("Reminder sweep failed: {}", e);
            }
        }
    })
}
