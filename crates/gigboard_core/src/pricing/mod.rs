//! Commission pricing.
//!
//! # Responsibility
//! - Map a task amount to the platform commission tier.
//! - Split an amount into platform fee and student payout.
//!
//! # Invariants
//! - Pure computation; no storage access.
//! - All money values are integer cents.

pub mod commission;

pub use commission::{
    commission_for, CommissionQuote, CommissionSchedule, CommissionTier, PricingError,
};
