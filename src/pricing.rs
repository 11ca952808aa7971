//! Service-charge pricing and rupee formatting.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::ServiceType;

pub const CURRENCY_SYMBOL: &str = "₹";

impl ServiceType {
    /// Flat charge added on top of the product price for this tier.
    pub fn surcharge(&self) -> Decimal {
        match self {
            ServiceType::DirectBuy => Decimal::ZERO,
            ServiceType::VideoConsultation => Decimal::from(500),
            ServiceType::HomeVisit => Decimal::from(1000),
            ServiceType::Unknown => Decimal::ZERO,
        }
    }
}

pub fn calculate_price(base_price: Decimal, service_type: ServiceType) -> Decimal {
    base_price + service_type.surcharge()
}

/// Charged price for a line: surcharge is per unit, then multiplied out.
pub fn line_total(unit_price: Decimal, service_type: ServiceType, quantity: u32) -> Decimal {
    calculate_price(unit_price, service_type) * Decimal::from(quantity)
}

/// Formats an amount as whole rupees with Indian digit grouping
/// (`₹1,00,000`). Display only.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}{}", sign, CURRENCY_SYMBOL, group_indian(&digits))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}
