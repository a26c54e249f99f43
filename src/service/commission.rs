// service/commission.rs
use serde::Serialize;

use crate::service::error::ServiceError;

/// Upper bound (inclusive) of each price tier and the rate applied to it, in basis points.
const TIERS: [(i64, i32); 2] = [(100_000, 1_500), (500_000, 1_200)];
const TOP_TIER_BPS: i32 = 1_000;
const BPS_DENOMINATOR: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Commission {
    pub rate_bps: i32,
    pub commission_amount: i64,
    pub seller_receives: i64,
    pub buyer_pays: i64,
}

impl Commission {
    pub fn rate(&self) -> f64 {
        self.rate_bps as f64 / BPS_DENOMINATOR as f64
    }
}

pub fn rate_bps_for(price: i64) -> i32 {
    TIERS
        .iter()
        .find(|(upper, _)| price <= *upper)
        .map(|(_, bps)| *bps)
        .unwrap_or(TOP_TIER_BPS)
}

/// Split `price` into the platform commission and the creator's proceeds.
///
/// The commission is rounded half-up to a whole currency unit and the
/// creator receives the exact remainder, so the two always sum to `price`.
pub fn calculate_commission(price: i64) -> Result<Commission, ServiceError> {
    if price < 0 {
        return Err(ServiceError::Validation(format!(
            "Price cannot be negative: {}",
            price
        )));
    }

    let rate_bps = rate_bps_for(price);
    let scaled = (price as i128) * (rate_bps as i128);
    let commission_amount = ((scaled + (BPS_DENOMINATOR as i128 / 2)) / BPS_DENOMINATOR as i128) as i64;

    Ok(Commission {
        rate_bps,
        commission_amount,
        seller_receives: price - commission_amount,
        buyer_pays: price,
    })
}
