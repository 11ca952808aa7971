use askama::Template;
use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{ConsultationStatus, ConsultationType, OrderStatus};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Customer-facing sentence for each order status.
pub fn order_status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "We have received your order and will confirm it shortly.",
        OrderStatus::Confirmed => "Your order is confirmed. Our master tailor has been assigned.",
        OrderStatus::MeasurementsFinalized => "Your measurements are locked in and your pattern is being drafted.",
        OrderStatus::FabricCutting => "Your fabric is being cut to your pattern.",
        OrderStatus::Stitching => "Your garment is being stitched.",
        OrderStatus::Finishing => "Buttons, hems and final touches are being added.",
        OrderStatus::QualityCheck => "Your garment is going through our quality check.",
        OrderStatus::Shipped => "Your order is on its way.",
        OrderStatus::Delivered => "Your order has been delivered. We hope it fits beautifully.",
        OrderStatus::Completed => "Your order is complete. Thank you for choosing us.",
        OrderStatus::Cancelled => "Your order has been cancelled. Any payment will be refunded.",
    }
}

pub fn consultation_type_label(consultation_type: ConsultationType) -> &'static str {
    match consultation_type {
        ConsultationType::Video => "video consultation",
        ConsultationType::HomeVisit => "home visit",
    }
}

pub fn consultation_status_label(status: ConsultationStatus) -> &'static str {
    match status {
        ConsultationStatus::Scheduled => "Scheduled",
        ConsultationStatus::InProgress => "In Progress",
        ConsultationStatus::Completed => "Completed",
        ConsultationStatus::Cancelled => "Cancelled",
        ConsultationStatus::Rescheduled => "Rescheduled",
    }
}

/// Appointment times are shown in Indian Standard Time.
pub fn format_appointment(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => at.with_timezone(&ist).format("%a, %d %b %Y at %I:%M %p IST").to_string(),
        None => at.format("%a, %d %b %Y at %H:%M UTC").to_string(),
    }
}

#[derive(Template)]
#[template(
    ext = "txt",
    source = "Hi {{ name }},

{{ message }}

Order: {{ order_number }}
Status: {{ label }} ({{ progress }}% complete)
{%- if let Some(tracking) = tracking_number %}
Tracking number: {{ tracking }}
{%- endif %}
{%- if let Some(note) = note %}
Note from our atelier: {{ note }}
{%- endif %}

Track your order any time from your account.
"
)]
pub struct OrderStatusEmail<'a> {
    pub name: &'a str,
    pub order_number: &'a str,
    pub label: &'a str,
    pub message: &'a str,
    pub progress: u8,
    pub tracking_number: Option<&'a str>,
    pub note: Option<&'a str>,
}

#[derive(Template)]
#[template(
    ext = "txt",
    source = "Order {{ order_number }}: {{ label }}.{% if let Some(tracking) = tracking_number %} Tracking: {{ tracking }}.{% endif %}"
)]
pub struct OrderStatusSms<'a> {
    pub order_number: &'a str,
    pub label: &'a str,
    pub tracking_number: Option<&'a str>,
}

#[derive(Template)]
#[template(
    ext = "txt",
    source = "Hi {{ name }},

{{ headline }}

Appointment: {{ kind }}
When: {{ when }} ({{ duration_minutes }} minutes)
Status: {{ status }}
{%- if let Some(location) = location %}
Where: {{ location }}
{%- endif %}
{%- if let Some(link) = meeting_link %}
Join: {{ link }}
{%- endif %}

Reply to this email if you need to reschedule.
"
)]
pub struct ConsultationEmail<'a> {
    pub name: &'a str,
    pub headline: &'a str,
    pub kind: &'a str,
    pub when: &'a str,
    pub duration_minutes: i32,
    pub status: &'a str,
    pub location: Option<&'a str>,
    pub meeting_link: Option<&'a str>,
}

#[derive(Template)]
#[template(ext = "txt", source = "{{ headline }} Your {{ kind }} is on {{ when }}.")]
pub struct ConsultationSms<'a> {
    pub headline: &'a str,
    pub kind: &'a str,
    pub when: &'a str,
}
