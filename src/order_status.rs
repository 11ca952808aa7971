//! Order lifecycle lookup table: labels and progress percentages.

use std::str::FromStr;

use serde::Serialize;

use crate::models::OrderStatus;

impl OrderStatus {
    /// Every status in lifecycle order, cancellation last.
    pub const ALL: [OrderStatus; 11] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::MeasurementsFinalized,
        OrderStatus::FabricCutting,
        OrderStatus::Stitching,
        OrderStatus::Finishing,
        OrderStatus::QualityCheck,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The canonical forward path an order walks when nothing goes wrong.
    pub const FORWARD_PATH: [OrderStatus; 10] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::MeasurementsFinalized,
        OrderStatus::FabricCutting,
        OrderStatus::Stitching,
        OrderStatus::Finishing,
        OrderStatus::QualityCheck,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::MeasurementsFinalized => "MEASUREMENTS_FINALIZED",
            OrderStatus::FabricCutting => "FABRIC_CUTTING",
            OrderStatus::Stitching => "STITCHING",
            OrderStatus::Finishing => "FINISHING",
            OrderStatus::QualityCheck => "QUALITY_CHECK",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order Placed",
            OrderStatus::Confirmed => "Order Confirmed",
            OrderStatus::MeasurementsFinalized => "Measurements Finalized",
            OrderStatus::FabricCutting => "Fabric Cutting",
            OrderStatus::Stitching => "Stitching",
            OrderStatus::Finishing => "Finishing",
            OrderStatus::QualityCheck => "Quality Check",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Progress bar percentage. Cancelled orders always report 0.
    pub fn progress(&self) -> u8 {
        match self {
            OrderStatus::Pending => 10,
            OrderStatus::Confirmed => 20,
            OrderStatus::MeasurementsFinalized => 30,
            OrderStatus::FabricCutting => 40,
            OrderStatus::Stitching => 60,
            OrderStatus::Finishing => 80,
            OrderStatus::QualityCheck => 90,
            OrderStatus::Shipped => 95,
            OrderStatus::Delivered | OrderStatus::Completed => 100,
            OrderStatus::Cancelled => 0,
        }
    }

    /// No workflow transition leaves these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

/// Display information for a raw status value, tolerant of values this
/// build does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: String,
    pub label: String,
    pub progress: u8,
}

pub fn status_info(raw: &str) -> StatusInfo {
    match raw.parse::<OrderStatus>() {
        Ok(status) => StatusInfo {
            status: status.as_str().to_string(),
            label: status.label().to_string(),
            progress: status.progress(),
        },
        Err(_) => StatusInfo {
            status: raw.to_string(),
            label: raw.to_string(),
            progress: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_never_decreases_along_forward_path() {
        let progress: Vec<u8> = OrderStatus::FORWARD_PATH.iter().map(|s| s.progress()).collect();
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", progress);
        assert_eq!(progress.first(), Some(&10));
        assert_eq!(OrderStatus::Delivered.progress(), 100);
    }

    #[test]
    fn cancelled_reports_zero_progress() {
        assert_eq!(OrderStatus::Cancelled.progress(), 0);
        assert_eq!(status_info("CANCELLED").progress, 0);
    }

    #[test]
    fn unknown_status_falls_back_to_identity_label() {
        let info = status_info("ON_HOLD");
        assert_eq!(info.label, "ON_HOLD");
        assert_eq!(info.progress, 0);
    }

    #[test]
    fn known_status_parses_case_insensitively() {
        assert_eq!("stitching".parse::<OrderStatus>(), Ok(OrderStatus::Stitching));
        let info = status_info("quality_check");
        assert_eq!(info.status, "QUALITY_CHECK");
        assert_eq!(info.label, "Quality Check");
        assert_eq!(info.progress, 90);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
    }
}
