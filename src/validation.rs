//! Request payloads and the rules they must satisfy before they reach a
//! repository.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::{
    error::FieldError,
    models::{ConsultationType, MeasurementValues, ServiceType},
};

/// Postal code prefixes served by home visits (Delhi, Gurugram, Noida and
/// Greater Noida, Ghaziabad, Faridabad).
const NCR_PINCODE_PREFIXES: [&str; 9] = ["110", "1220", "1221", "1222", "1223", "1224", "2013", "2010", "1210"];

fn error_with(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let local = digits
        .strip_prefix("+91")
        .or_else(|| digits.strip_prefix("91").filter(|rest| rest.len() == 10))
        .unwrap_or(&digits);

    let valid = local.len() == 10
        && local.chars().all(|c| c.is_ascii_digit())
        && matches!(local.chars().next(), Some('6'..='9'));
    if valid {
        Ok(())
    } else {
        Err(error_with("phone", "Enter a valid 10-digit mobile number"))
    }
}

fn validate_pincode(value: &str) -> Result<(), ValidationError> {
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(error_with("pincode", "Pincode must be exactly 6 digits"))
    }
}

fn validate_known_service(value: &ServiceType) -> Result<(), ValidationError> {
    if value.is_known() {
        Ok(())
    } else {
        Err(error_with("service_type", "Choose direct buy, video consultation or home visit"))
    }
}

pub fn is_ncr_pincode(pincode: &str) -> bool {
    validate_pincode(pincode).is_ok()
        && NCR_PINCODE_PREFIXES.iter().any(|prefix| pincode.starts_with(prefix))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 100, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MeasurementInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(nested)]
    pub values: MeasurementValues,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 2, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 5, message = "Address line 1 is required"))]
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    #[validate(length(min = 2, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 2, message = "State is required"))]
    pub state: String,
    #[validate(custom(function = "validate_pincode"))]
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConsultationBookingInput {
    #[serde(rename = "type")]
    pub consultation_type: ConsultationType,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 15, max = 180, message = "Duration must be between 15 and 180 minutes"))]
    pub duration_minutes: Option<i32>,
    #[validate(nested)]
    pub address: Option<AddressInput>,
    pub address_id: Option<Uuid>,
    #[validate(length(max = 1000, message = "Notes are limited to 1000 characters"))]
    pub notes: Option<String>,
}

impl ConsultationBookingInput {
    pub fn has_address(&self) -> bool {
        self.address.is_some() || self.address_id.is_some()
    }

    /// Field rules plus the checks that depend on the booking type and the
    /// current time.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.scheduled_at <= now {
            errors.add("scheduled_at", error_with("future", "Pick a time in the future"));
        }

        match self.consultation_type {
            ConsultationType::HomeVisit if !self.has_address() => {
                errors.add("address", error_with("required", "An address is required for home visits"));
            }
            ConsultationType::Video if self.has_address() => {
                errors.add("address", error_with("unexpected", "Video consultations do not take an address"));
            }
            _ => {}
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(max = 120, message = "Title is limited to 120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Review is limited to 2000 characters"))]
    pub comment: Option<String>,
}

// Serialize is needed by the length rule on `OrderInput::items`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[validate(required(message = "Product is required"))]
    pub product_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom(function = "validate_known_service"))]
    pub service_type: ServiceType,
    pub fabric_id: Option<Uuid>,
    #[validate(nested)]
    pub measurements: Option<MeasurementValues>,
    pub consultation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderInput {
    #[validate(length(min = 1, message = "Add at least one item"))]
    #[validate(nested)]
    pub items: Vec<OrderItemInput>,
    #[validate(required(message = "Shipping address is required"))]
    pub shipping_address_id: Option<Uuid>,
    pub billing_address_id: Option<Uuid>,
    #[validate(length(max = 1000, message = "Notes are limited to 1000 characters"))]
    pub notes: Option<String>,
    /// Set when the order was assembled from the visitor's cart, which is
    /// emptied once the order is placed.
    #[serde(default)]
    pub from_cart: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 2, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 3, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 10, max = 5000, message = "Message must be at least 10 characters"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewsletterInput {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

/// Flattens nested validator output into `path: message` pairs such as
/// `items[0].quantity` or `address.pincode`.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("is invalid ({})", error.code),
                    };
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fields(errors: ValidationErrors) -> Vec<String> {
        field_errors(&errors).into_iter().map(|e| e.field).collect()
    }

    fn address() -> AddressInput {
        AddressInput {
            name: "Aarav Mehta".to_string(),
            phone: "9810012345".to_string(),
            line1: "B-42, Greater Kailash I".to_string(),
            line2: None,
            landmark: None,
            city: "New Delhi".to_string(),
            state: "Delhi".to_string(),
            pincode: "110048".to_string(),
            is_default: false,
        }
    }

    fn booking(consultation_type: ConsultationType, scheduled_at: DateTime<Utc>) -> ConsultationBookingInput {
        ConsultationBookingInput {
            consultation_type,
            scheduled_at,
            duration_minutes: None,
            address: None,
            address_id: None,
            notes: None,
        }
    }

    #[test]
    fn registration_requires_email_and_long_password() {
        let input = RegisterInput {
            name: "Aarav".to_string(),
            email: "not-an-email".to_string(),
            phone: "+91 98100 12345".to_string(),
            password: "short".to_string(),
        };
        assert_eq!(fields(input.validate().unwrap_err()), vec!["email", "password"]);

        let ok = RegisterInput {
            email: "aarav@example.com".to_string(),
            password: "longenough".to_string(),
            ..input
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn phone_numbers_accept_country_code() {
        assert!(validate_phone("9810012345").is_ok());
        assert!(validate_phone("+919810012345").is_ok());
        assert!(validate_phone("91 98100-12345").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890").is_err());
    }

    #[test]
    fn pincode_must_be_six_digits() {
        let mut input = address();
        assert!(input.validate().is_ok());

        input.pincode = "11004".to_string();
        assert_eq!(fields(input.validate().unwrap_err()), vec!["pincode"]);

        input.pincode = "11004a".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn home_visit_without_address_is_rejected() {
        let now = Utc::now();
        let input = booking(ConsultationType::HomeVisit, now + Duration::days(2));
        assert_eq!(fields(input.validate_at(now).unwrap_err()), vec!["address"]);

        let with_address = ConsultationBookingInput {
            address: Some(address()),
            ..input
        };
        assert!(with_address.validate_at(now).is_ok());
    }

    #[test]
    fn video_consultation_takes_no_address() {
        let now = Utc::now();
        let mut input = booking(ConsultationType::Video, now + Duration::hours(3));
        assert!(input.validate_at(now).is_ok());

        input.address_id = Some(Uuid::new_v4());
        assert_eq!(fields(input.validate_at(now).unwrap_err()), vec!["address"]);
    }

    #[test]
    fn booking_time_must_be_strictly_future() {
        let now = Utc::now();
        let at_now = booking(ConsultationType::Video, now);
        assert_eq!(fields(at_now.validate_at(now).unwrap_err()), vec!["scheduled_at"]);

        let past = booking(ConsultationType::Video, now - Duration::minutes(5));
        assert!(past.validate_at(now).is_err());
    }

    #[test]
    fn nested_address_errors_carry_their_path() {
        let now = Utc::now();
        let mut bad_address = address();
        bad_address.pincode = "1100".to_string();
        let input = ConsultationBookingInput {
            address: Some(bad_address),
            ..booking(ConsultationType::HomeVisit, now + Duration::days(1))
        };

        assert_eq!(fields(input.validate_at(now).unwrap_err()), vec!["address.pincode"]);
    }

    #[test]
    fn review_rating_bounds() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let input = ReviewInput { rating, title: None, comment: None };
            assert_eq!(input.validate().is_ok(), ok, "rating {}", rating);
        }
    }

    #[test]
    fn order_items_are_checked_individually() {
        let input: OrderInput = serde_json::from_value(serde_json::json!({
            "items": [
                { "product_id": Uuid::new_v4(), "quantity": 1, "service_type": "HOME_VISIT" },
                { "quantity": 0, "service_type": "SAME_DAY" }
            ],
            "shipping_address_id": Uuid::new_v4()
        }))
        .unwrap();

        assert_eq!(
            fields(input.validate().unwrap_err()),
            vec!["items[1].product_id", "items[1].quantity", "items[1].service_type"]
        );
    }

    #[test]
    fn empty_item_list_reports_its_message() {
        let input: OrderInput = serde_json::from_value(serde_json::json!({
            "items": [],
            "shipping_address_id": Uuid::new_v4()
        }))
        .unwrap();

        let errors = field_errors(&input.validate().unwrap_err());
        assert_eq!(errors, vec![FieldError::new("items", "Add at least one item")]);
    }

    #[test]
    fn order_requires_items_and_shipping_address() {
        let input: OrderInput = serde_json::from_value(serde_json::json!({ "items": [] })).unwrap();
        assert_eq!(fields(input.validate().unwrap_err()), vec!["items", "shipping_address_id"]);
    }

    #[test]
    fn measurements_must_be_positive() {
        let input: MeasurementInput = serde_json::from_value(serde_json::json!({
            "name": "Wedding fit",
            "values": { "chest": 40.5, "waist": -2.0, "extra": { "posture": "slight stoop" } }
        }))
        .unwrap();
        assert_eq!(fields(input.validate().unwrap_err()), vec!["values.waist"]);
    }

    #[test]
    fn contact_and_newsletter_require_valid_email() {
        let contact = ContactInput {
            name: "Kabir".to_string(),
            email: "kabir@".to_string(),
            phone: "9988776655".to_string(),
            subject: "Alteration".to_string(),
            message: "Can you alter a bandhgala bought elsewhere?".to_string(),
        };
        assert_eq!(fields(contact.validate().unwrap_err()), vec!["email"]);

        assert!(NewsletterInput { email: "kabir@example.com".to_string() }.validate().is_ok());
        assert!(NewsletterInput { email: "kabir".to_string() }.validate().is_err());
    }

    #[test]
    fn ncr_service_area() {
        assert!(is_ncr_pincode("110048"));
        assert!(is_ncr_pincode("122002"));
        assert!(is_ncr_pincode("201301"));
        assert!(!is_ncr_pincode("400001"));
        assert!(!is_ncr_pincode("1100"));
    }
}
