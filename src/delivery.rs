use chrono::{DateTime, Duration, TimeZone};

use crate::models::ServiceType;

impl ServiceType {
    pub fn lead_time_days(&self) -> i64 {
        match self {
            ServiceType::DirectBuy => 7,
            ServiceType::VideoConsultation => 14,
            ServiceType::HomeVisit => 21,
            ServiceType::Unknown => 14,
        }
    }
}

pub fn estimate_delivery<Tz: TimeZone>(service_type: ServiceType, created_at: DateTime<Tz>) -> DateTime<Tz> {
    created_at + Duration::days(service_type.lead_time_days())
}

/// An order ships when its slowest line is ready.
pub fn estimate_order_delivery<Tz, I>(service_types: I, created_at: DateTime<Tz>) -> DateTime<Tz>
where
    Tz: TimeZone,
    I: IntoIterator<Item = ServiceType>,
{
    let days = service_types
        .into_iter()
        .map(|service| service.lead_time_days())
        .max()
        .unwrap_or_else(|| ServiceType::Unknown.lead_time_days());
    created_at + Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn home_visit_takes_three_weeks() {
        let eta = estimate_delivery(ServiceType::HomeVisit, new_year());
        assert_eq!(eta, Utc.with_ymd_and_hms(2025, 1, 22, 10, 30, 0).unwrap());
    }

    #[test]
    fn direct_buy_takes_one_week() {
        let eta = estimate_delivery(ServiceType::DirectBuy, new_year());
        assert_eq!(eta.date_naive().to_string(), "2025-01-08");
    }

    #[test]
    fn unknown_service_defaults_to_two_weeks() {
        let eta = estimate_delivery(ServiceType::Unknown, new_year());
        assert_eq!(eta.date_naive().to_string(), "2025-01-15");
        assert_eq!(
            estimate_delivery(ServiceType::VideoConsultation, new_year()),
            eta
        );
    }

    #[test]
    fn order_estimate_uses_slowest_line() {
        let eta = estimate_order_delivery(
            [ServiceType::DirectBuy, ServiceType::HomeVisit, ServiceType::VideoConsultation],
            new_year(),
        );
        assert_eq!(eta.date_naive().to_string(), "2025-01-22");

        let empty = estimate_order_delivery(Vec::new(), new_year());
        assert_eq!(empty.date_naive().to_string(), "2025-01-15");
    }
}
