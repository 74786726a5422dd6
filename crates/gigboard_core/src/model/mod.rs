//! Domain model for the project/sprint/campaign/task hierarchy.
//!
//! # Responsibility
//! - Define the canonical shapes persisted as one JSON tree per project.
//! - Provide validation used on both read and write paths.
//!
//! # Invariants
//! - Ids are generated unique; persisted duplicates load as-is.
//! - Date ranges never end before they start.

pub mod project;
pub mod task;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation failures for hierarchy entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Name or title is blank after trim.
    BlankName { entity: &'static str },
    /// `end_date` is earlier than `start_date`.
    InvalidDateRange { entity: &'static str, id: Uuid },
    /// Review rating is outside `1..=5`.
    RatingOutOfRange(u8),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName { entity } => write!(f, "{entity} name must not be blank"),
            Self::InvalidDateRange { entity, id } => {
                write!(f, "{entity} {id} ends before it starts")
            }
            Self::RatingOutOfRange(rating) => {
                write!(f, "review rating must be between 1 and 5, got {rating}")
            }
        }
    }
}

impl Error for ModelValidationError {}
