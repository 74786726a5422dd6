//! Commission tier schedule and quoting.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// 100% expressed in basis points.
pub const FULL_RATE_BPS: u32 = 10_000;

/// One price bracket with its platform fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub name: String,
    /// Inclusive lower bound in cents.
    pub min_amount_cents: u64,
    /// Fee rate in basis points (1/100 of a percent).
    pub rate_bps: u32,
}

impl CommissionTier {
    pub fn new(name: impl Into<String>, min_amount_cents: u64, rate_bps: u32) -> Self {
        Self {
            name: name.into(),
            min_amount_cents,
            rate_bps,
        }
    }
}

/// Commission split for one amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionQuote {
    pub tier: String,
    pub rate_bps: u32,
    pub amount_cents: u64,
    pub fee_cents: u64,
    pub payout_cents: u64,
}

/// Invalid commission schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    EmptySchedule,
    /// First tier must start at zero so every amount has a tier.
    FirstTierNotZero(u64),
    /// Tier minimums must strictly ascend.
    UnorderedTier(String),
    RateTooHigh { tier: String, rate_bps: u32 },
}

impl Display for PricingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySchedule => write!(f, "commission schedule has no tiers"),
            Self::FirstTierNotZero(min) => {
                write!(f, "first commission tier must start at 0, got {min}")
            }
            Self::UnorderedTier(name) => {
                write!(f, "commission tier `{name}` is not above the previous tier")
            }
            Self::RateTooHigh { tier, rate_bps } => write!(
                f,
                "commission tier `{tier}` rate {rate_bps} bps exceeds {FULL_RATE_BPS}"
            ),
        }
    }
}

impl Error for PricingError {}

/// Ordered list of commission tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionSchedule {
    tiers: Vec<CommissionTier>,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            tiers: vec![
                CommissionTier::new("starter", 0, 2_000),
                CommissionTier::new("standard", 10_000, 1_500),
                CommissionTier::new("professional", 50_000, 1_000),
                CommissionTier::new("enterprise", 200_000, 500),
            ],
        }
    }
}

impl CommissionSchedule {
    /// Builds a validated schedule.
    pub fn new(tiers: Vec<CommissionTier>) -> Result<Self, PricingError> {
        let schedule = Self { tiers };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn tiers(&self) -> &[CommissionTier] {
        &self.tiers
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        let first = self.tiers.first().ok_or(PricingError::EmptySchedule)?;
        if first.min_amount_cents != 0 {
            return Err(PricingError::FirstTierNotZero(first.min_amount_cents));
        }
        for tier in &self.tiers {
            if tier.rate_bps > FULL_RATE_BPS {
                return Err(PricingError::RateTooHigh {
                    tier: tier.name.clone(),
                    rate_bps: tier.rate_bps,
                });
            }
        }
        for pair in self.tiers.windows(2) {
            if pair[1].min_amount_cents <= pair[0].min_amount_cents {
                return Err(PricingError::UnorderedTier(pair[1].name.clone()));
            }
        }
        Ok(())
    }

    /// Returns the tier covering `amount_cents`.
    ///
    /// Falls back to the first tier for a schedule that skipped validation.
    pub fn tier_for(&self, amount_cents: u64) -> Option<&CommissionTier> {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.min_amount_cents <= amount_cents)
            .or_else(|| self.tiers.first())
    }

    /// Splits `amount_cents` into fee and payout. Fee rounds half-up.
    pub fn quote(&self, amount_cents: u64) -> Option<CommissionQuote> {
        let tier = self.tier_for(amount_cents)?;
        let fee_cents = fee_for(amount_cents, tier.rate_bps);
        Some(CommissionQuote {
            tier: tier.name.clone(),
            rate_bps: tier.rate_bps,
            amount_cents,
            fee_cents,
            payout_cents: amount_cents - fee_cents,
        })
    }
}

/// Quotes `amount_cents` against the default schedule.
pub fn commission_for(amount_cents: u64) -> CommissionQuote {
    let schedule = CommissionSchedule::default();
    let tier = schedule
        .tier_for(amount_cents)
        .cloned()
        .unwrap_or_else(|| CommissionTier::new("starter", 0, 2_000));
    let fee_cents = fee_for(amount_cents, tier.rate_bps);
    CommissionQuote {
        tier: tier.name,
        rate_bps: tier.rate_bps,
        amount_cents,
        fee_cents,
        payout_cents: amount_cents - fee_cents,
    }
}

fn fee_for(amount_cents: u64, rate_bps: u32) -> u64 {
    let scaled = u128::from(amount_cents) * u128::from(rate_bps.min(FULL_RATE_BPS));
    let fee = (scaled + u128::from(FULL_RATE_BPS / 2)) / u128::from(FULL_RATE_BPS);
    // rate is capped at 100%, so fee never exceeds amount
    fee as u64
}
