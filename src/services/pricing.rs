use crate::{config::CheckoutConfig, services::cart::CartLineSnapshot, services::payments::PaymentMethod};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Computed pricing breakdown for a cart. Feeds both the live UI totals and
/// the committed order amount. All monetary fields are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub processing_fee: i64,
    pub tax: i64,
    pub total: i64,
    pub item_count: i32,
    pub estimated_delivery: DateTime<Utc>,
}

/// Prices a cart snapshot against an optionally-chosen payment method.
///
/// Pure and deterministic given its inputs; callers invoke it on every cart
/// mutation for live totals and once more at checkout time. Discounts apply
/// per line so each product keeps its own percentage; the per-unit discount
/// truncates to whole minor units before multiplying by the quantity. Tax is
/// rounded half-up on (subtotal - discount). Reaching the free-shipping
/// threshold exactly qualifies for free delivery; an empty cart pays no fee.
pub fn calculate_summary(
    lines: &[CartLineSnapshot],
    method: Option<&PaymentMethod>,
    config: &CheckoutConfig,
    now: DateTime<Utc>,
) -> OrderSummary {
    let mut subtotal: i64 = 0;
    let mut discount: i64 = 0;
    let mut item_count: i32 = 0;

    for line in lines {
        let quantity = i64::from(line.quantity);
        subtotal += line.unit_price * quantity;
        discount += line.unit_price * i64::from(line.discount_percent) / 100 * quantity;
        item_count += line.quantity;
    }

    let delivery_fee = if subtotal == 0 || subtotal >= config.free_shipping_threshold {
        0
    } else {
        config.delivery_fee
    };

    let processing_fee = method.map(|m| m.processing_fee).unwrap_or(0);

    let taxable = subtotal - discount;
    let tax = (taxable * config.tax_rate_bps + 5_000) / 10_000;

    let total = subtotal - discount + delivery_fee + processing_fee + tax;

    OrderSummary {
        subtotal,
        discount,
        delivery_fee,
        processing_fee,
        tax,
        total,
        item_count,
        estimated_delivery: now + Duration::days(config.delivery_estimate_days),
    }
}
