//! Stateless lookups used by the storefront: price quotes, delivery
//! estimates, status labels and the home-visit service area.

use axum::{
    extract::{Path, Query},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ok, ApiResponse};
use crate::{
    delivery,
    models::ServiceType,
    order_status::{status_info, StatusInfo},
    pricing,
    validation::is_ncr_pincode,
};

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub base_price: Decimal,
    #[serde(default)]
    pub service_type: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Quote {
    pub service_type: ServiceType,
    pub base_price: Decimal,
    pub surcharge: Decimal,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    pub total_display: String,
}

pub fn quote(base_price: Decimal, service_type: ServiceType, quantity: u32) -> Quote {
    let total = pricing::line_total(base_price, service_type, quantity);
    Quote {
        service_type,
        base_price,
        surcharge: service_type.surcharge(),
        unit_price: pricing::calculate_price(base_price, service_type),
        quantity,
        total,
        total_display: pricing::format_currency(total),
    }
}

pub async fn price_quote(Query(query): Query<QuoteQuery>) -> Json<ApiResponse<Quote>> {
    let service_type = ServiceType::parse_lenient(&query.service_type);
    ok(quote(query.base_price, service_type, query.quantity.unwrap_or(1)))
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    #[serde(default)]
    pub service_type: String,
    pub from: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryEstimate {
    pub service_type: ServiceType,
    pub lead_time_days: i64,
    pub estimated_delivery: DateTime<Utc>,
}

pub async fn delivery_estimate(Query(query): Query<EstimateQuery>) -> Json<ApiResponse<DeliveryEstimate>> {
    let service_type = ServiceType::parse_lenient(&query.service_type);
    let from = query.from.unwrap_or_else(Utc::now);
    ok(DeliveryEstimate {
        service_type,
        lead_time_days: service_type.lead_time_days(),
        estimated_delivery: delivery::estimate_delivery(service_type, from),
    })
}

pub async fn order_status(Path(status): Path<String>) -> Json<ApiResponse<StatusInfo>> {
    ok(status_info(&status))
}

#[derive(Debug, Serialize)]
pub struct ServiceArea {
    pub pincode: String,
    pub home_visit_available: bool,
}

pub async fn service_area(Path(pincode): Path<String>) -> Json<ApiResponse<ServiceArea>> {
    let pincode = pincode.trim().to_string();
    ok(ServiceArea {
        home_visit_available: is_ncr_pincode(&pincode),
        pincode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_for_home_visit() {
        let quote = quote(Decimal::from(25_000), ServiceType::HomeVisit, 2);

        assert_eq!(quote.surcharge, Decimal::from(1_000));
        assert_eq!(quote.unit_price, Decimal::from(26_000));
        assert_eq!(quote.total, Decimal::from(52_000));
        assert_eq!(quote.total_display, "₹52,000");
    }

    #[test]
    fn unknown_service_quotes_at_base_price() {
        let quote = quote(Decimal::from(1_500), ServiceType::parse_lenient("EXPRESS"), 1);
        assert_eq!(quote.surcharge, Decimal::ZERO);
        assert_eq!(quote.unit_price, Decimal::from(1_500));
    }
}
