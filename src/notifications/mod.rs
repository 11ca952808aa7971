//! Best-effort customer notifications.
//!
//! Triggers render the message synchronously and hand it to a background
//! worker over a bounded channel. Delivery failures are logged and never
//! reach the code that changed the order or consultation.

pub mod senders;
pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::models::{Consultation, ConsultationStatus, Order, OrderStatus, User};
use templates::{
    consultation_status_label, consultation_type_label, format_appointment, order_status_message,
    ConsultationEmail, ConsultationSms, OrderStatusEmail, OrderStatusSms,
};

pub use senders::{LogEmailSender, LogSmsSender};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("email delivery failed: {0}")]
    Email(String),

    #[error("sms delivery failed: {0}")]
    Sms(String),

    #[error("failed to render template: {0}")]
    Render(#[from] askama::Error),

    #[error("delivery timed out")]
    Timeout,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotificationError>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// A rendered notification. The SMS half is present only when the
/// recipient has a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub email: EmailMessage,
    pub sms: Option<SmsMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationEvent {
    Booked,
    StatusChanged,
    Reminder,
}

impl ConsultationEvent {
    fn headline(&self, status: ConsultationStatus) -> &'static str {
        match (self, status) {
            (ConsultationEvent::Booked, _) => "Your appointment is booked.",
            (ConsultationEvent::Reminder, _) => "A reminder about your upcoming appointment.",
            (ConsultationEvent::StatusChanged, ConsultationStatus::Rescheduled) => {
                "Your appointment has been rescheduled."
            }
            (ConsultationEvent::StatusChanged, ConsultationStatus::Cancelled) => {
                "Your appointment has been cancelled."
            }
            (ConsultationEvent::StatusChanged, ConsultationStatus::Completed) => {
                "Thank you for meeting with our tailor."
            }
            (ConsultationEvent::StatusChanged, _) => "Your appointment has been updated.",
        }
    }
}

pub fn render_order_status(
    recipient: &Recipient,
    order: &Order,
    status: OrderStatus,
    note: Option<&str>,
) -> Result<Notification, NotificationError> {
    let tracking_number = order.tracking_number.as_deref();
    let body = OrderStatusEmail {
        name: &recipient.name,
        order_number: &order.order_number,
        label: status.label(),
        message: order_status_message(status),
        progress: status.progress(),
        tracking_number,
        note,
    }
    .render()?;

    let sms = match recipient.phone.as_deref().filter(|phone| !phone.trim().is_empty()) {
        Some(phone) => Some(SmsMessage {
            to: phone.to_string(),
            body: OrderStatusSms {
                order_number: &order.order_number,
                label: status.label(),
                tracking_number,
            }
            .render()?,
        }),
        None => None,
    };

    Ok(Notification {
        email: EmailMessage {
            to: recipient.email.clone(),
            subject: format!("Order {}: {}", order.order_number, status.label()),
            body,
        },
        sms,
    })
}

pub fn render_consultation(
    recipient: &Recipient,
    consultation: &Consultation,
    event: ConsultationEvent,
    location: Option<&str>,
) -> Result<Notification, NotificationError> {
    let headline = event.headline(consultation.status);
    let kind = consultation_type_label(consultation.consultation_type);
    let when = format_appointment(consultation.scheduled_at);

    let body = ConsultationEmail {
        name: &recipient.name,
        headline,
        kind,
        when: &when,
        duration_minutes: consultation.duration_minutes,
        status: consultation_status_label(consultation.status),
        location,
        meeting_link: consultation.meeting_link.as_deref(),
    }
    .render()?;

    let sms = match recipient.phone.as_deref().filter(|phone| !phone.trim().is_empty()) {
        Some(phone) => Some(SmsMessage {
            to: phone.to_string(),
            body: ConsultationSms { headline, kind, when: &when }.render()?,
        }),
        None => None,
    };

    let subject = match event {
        ConsultationEvent::Booked => format!("Your {} is booked", kind),
        ConsultationEvent::Reminder => format!("Reminder: your {} on {}", kind, when),
        ConsultationEvent::StatusChanged => format!(
            "Your {} is {}",
            kind,
            consultation_status_label(consultation.status).to_lowercase()
        ),
    };

    Ok(Notification {
        email: EmailMessage {
            to: recipient.email.clone(),
            subject,
            body,
        },
        sms,
    })
}

/// Handle for enqueueing notifications. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    pub fn spawn(
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(rx, email, sms));
        (Self { tx }, handle)
    }

    /// Queues a notification without waiting. Returns whether it was queued.
    pub fn dispatch(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                log::warn!("Notification queue full, dropping message to {}", dropped.email.to);
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                log::error!("Notification worker stopped, dropping message to {}", dropped.email.to);
                false
            }
        }
    }

    pub fn order_status_changed(
        &self,
        recipient: &Recipient,
        order: &Order,
        status: OrderStatus,
        note: Option<&str>,
    ) {
        match render_order_status(recipient, order, status, note) {
            Ok(notification) => {
                self.dispatch(notification);
            }
            Err(e) => log::error!("Failed to render notification for order {}: {}", order.order_number, e),
        }
    }

    pub fn consultation_event(
        &self,
        recipient: &Recipient,
        consultation: &Consultation,
        event: ConsultationEvent,
        location: Option<&str>,
    ) {
        match render_consultation(recipient, consultation, event, location) {
            Ok(notification) => {
                self.dispatch(notification);
            }
            Err(e) => log::error!("Failed to render notification for consultation {}: {}", consultation.id, e),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Notification>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
) {
    while let Some(notification) = rx.recv().await {
        deliver(email.as_ref(), sms.as_ref(), &notification).await;
    }
    log::info!("Notification worker shutting down");
}

/// Sends both halves independently; neither failure stops the other.
pub async fn deliver(email: &dyn EmailSender, sms: &dyn SmsSender, notification: &Notification) {
    let message = &notification.email;
    let sent = tokio::time::timeout(
        DELIVERY_TIMEOUT,
        email.send_email(&message.to, &message.subject, &message.body),
    )
    .await
    .unwrap_or(Err(NotificationError::Timeout));
    if let Err(e) = sent {
        log::warn!("Email to {} failed: {}", message.to, e);
    }

    if let Some(text) = &notification.sms {
        let sent = tokio::time::timeout(DELIVERY_TIMEOUT, sms.send_sms(&text.to, &text.body))
            .await
            .unwrap_or(Err(NotificationError::Timeout));
        if let Err(e) = sent {
            log::warn!("SMS to {} failed: {}", text.to, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConsultationType, Order};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingEmail {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingEmail {
        async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Email("smtp unavailable".to_string()));
            }
            self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsSender for RecordingSms {
        async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push((to.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn recipient(phone: Option<&str>) -> Recipient {
        Recipient {
            name: "Ishaan".to_string(),
            email: "ishaan@example.com".to_string(),
            phone: phone.map(str::to_string),
        }
    }

    fn order() -> Order {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        Order {
            id: Uuid::new_v4(),
            order_number: "ORD-20250101-7F3K2Q".to_string(),
            user_id: Uuid::new_v4(),
            status: OrderStatus::Stitching,
            subtotal: Decimal::from(26000),
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: Decimal::from(26000),
            shipping_address_id: Uuid::new_v4(),
            billing_address_id: None,
            tracking_number: None,
            notes: None,
            shipped_at: None,
            delivered_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn consultation() -> Consultation {
        let created = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        Consultation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            consultation_type: ConsultationType::HomeVisit,
            status: ConsultationStatus::Scheduled,
            scheduled_at: Utc.with_ymd_and_hms(2025, 3, 14, 6, 0, 0).unwrap(),
            duration_minutes: 60,
            address_id: Some(Uuid::new_v4()),
            meeting_link: None,
            notes: None,
            measurement_notes: None,
            recommendations: None,
            reminder_sent_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn order_notification_skips_sms_without_phone() {
        let rendered = render_order_status(&recipient(None), &order(), OrderStatus::Stitching, None).unwrap();
        assert!(rendered.sms.is_none());
        assert_eq!(rendered.email.to, "ishaan@example.com");
        assert_eq!(rendered.email.subject, "Order ORD-20250101-7F3K2Q: Stitching");
        assert!(rendered.email.body.contains(order_status_message(OrderStatus::Stitching)));
    }

    #[test]
    fn order_notification_texts_when_phone_present() {
        let rendered =
            render_order_status(&recipient(Some("9810012345")), &order(), OrderStatus::Cancelled, Some("Customer request"))
                .unwrap();
        let sms = rendered.sms.unwrap();
        assert_eq!(sms.to, "9810012345");
        assert_eq!(sms.body, "Order ORD-20250101-7F3K2Q: Cancelled.");
        assert!(rendered.email.body.contains("Note from our atelier: Customer request"));
        assert!(rendered.email.body.contains("(0% complete)"));
    }

    #[test]
    fn blank_phone_counts_as_missing() {
        let rendered = render_order_status(&recipient(Some("  ")), &order(), OrderStatus::Shipped, None).unwrap();
        assert!(rendered.sms.is_none());
    }

    #[test]
    fn consultation_reminder_mentions_time_and_place() {
        let rendered = render_consultation(
            &recipient(Some("9810012345")),
            &consultation(),
            ConsultationEvent::Reminder,
            Some("B-42, Greater Kailash I, New Delhi, Delhi - 110048"),
        )
        .unwrap();

        assert_eq!(
            rendered.email.subject,
            "Reminder: your home visit on Fri, 14 Mar 2025 at 11:30 AM IST"
        );
        assert!(rendered.email.body.contains("Where: B-42, Greater Kailash I"));
        assert!(rendered.sms.unwrap().body.contains("Your home visit is on Fri, 14 Mar 2025"));
    }

    #[tokio::test]
    async fn email_failure_does_not_block_sms() {
        let email = RecordingEmail { fail: true, ..Default::default() };
        let sms = RecordingSms::default();
        let notification =
            render_order_status(&recipient(Some("9810012345")), &order(), OrderStatus::Shipped, None).unwrap();

        deliver(&email, &sms, &notification).await;

        assert!(email.sent.lock().unwrap().is_empty());
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn worker_drains_queue_until_closed() {
        let email = Arc::new(RecordingEmail::default());
        let sms = Arc::new(RecordingSms::default());
        let (notifier, handle) = Notifier::spawn(email.clone(), sms.clone(), 8);

        notifier.order_status_changed(&recipient(Some("9810012345")), &order(), OrderStatus::Confirmed, None);
        notifier.order_status_changed(&recipient(None), &order(), OrderStatus::FabricCutting, None);
        drop(notifier);
        handle.await.unwrap();

        let emails = email.sent.lock().unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].1, "Order ORD-20250101-7F3K2Q: Order Confirmed");
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }
}
