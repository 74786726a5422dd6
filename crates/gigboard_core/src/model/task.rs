//! Task, recurrence and review records.
//!
//! # Invariants
//! - `completed_at` is set exactly when `status == Completed`.
//! - Review ratings stay within `1..=5`.

use super::ModelValidationError;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type ReviewId = Uuid;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Lowest accepted review rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted review rating.
pub const MAX_RATING: u8 = 5;

/// Task lifecycle state.
///
/// Transitions are not guarded; any status may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Posted and waiting for work.
    #[default]
    Open,
    /// A student is working on it.
    InProgress,
    /// Work handed in, waiting for the employer.
    Submitted,
    /// Accepted by the employer.
    Completed,
    /// Withdrawn; recurrence never revives it.
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Recurrence window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    /// One calendar month in UTC; the day clamps to the month end.
    Monthly,
}

impl Frequency {
    /// Returns the window boundary following `from_ms`.
    ///
    /// Returns `None` when the result leaves the representable range.
    pub fn advance(self, from_ms: i64) -> Option<i64> {
        match self {
            Self::Daily => from_ms.checked_add(DAY_MS),
            Self::Weekly => from_ms.checked_add(7 * DAY_MS),
            Self::Monthly => DateTime::<Utc>::from_timestamp_millis(from_ms)?
                .checked_add_months(Months::new(1))
                .map(|next| next.timestamp_millis()),
        }
    }
}

/// Recurrence settings attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    /// Status restored when a window elapses.
    #[serde(default)]
    pub initial_status: TaskStatus,
    /// Epoch ms start of the current window.
    pub last_reset_at: i64,
}

impl Recurrence {
    pub fn new(frequency: Frequency, now_ms: i64) -> Self {
        Self {
            frequency,
            initial_status: TaskStatus::Open,
            last_reset_at: now_ms,
        }
    }

    /// Returns the end of the current window.
    pub fn next_reset_at(&self) -> Option<i64> {
        self.frequency.advance(self.last_reset_at)
    }
}

/// Employer review left on a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub reviewer: String,
    pub reviewee: String,
    pub rating: u8,
    pub comment: Option<String>,
    /// Epoch ms.
    pub created_at: i64,
}

impl Review {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ModelValidationError::RatingOutOfRange(self.rating));
        }
        Ok(())
    }
}

/// Unit of paid work inside a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Price offered by the employer, in cents.
    pub price_cents: u64,
    pub assignee: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub review: Option<Review>,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms; present only while completed.
    pub completed_at: Option<i64>,
}

impl Task {
    /// Creates an open task with a generated id.
    pub fn new(title: impl Into<String>, price_cents: u64, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: TaskStatus::Open,
            price_cents,
            assignee: None,
            recurrence: None,
            review: None,
            created_at: now_ms,
            completed_at: None,
        }
    }

    /// Sets status and keeps `completed_at` in step with it.
    pub fn set_status(&mut self, status: TaskStatus, now_ms: i64) {
        self.status = status;
        self.completed_at = if status == TaskStatus::Completed {
            Some(self.completed_at.unwrap_or(now_ms))
        } else {
            None
        };
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankName { entity: "task" });
        }
        if let Some(review) = &self.review {
            review.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Frequency, Task, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .expect("valid date")
            .timestamp_millis()
    }

    #[test]
    fn daily_and_weekly_add_fixed_spans() {
        let start = ms(2024, 3, 1);
        assert_eq!(Frequency::Daily.advance(start), Some(ms(2024, 3, 2)));
        assert_eq!(Frequency::Weekly.advance(start), Some(ms(2024, 3, 8)));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(
            Frequency::Monthly.advance(ms(2024, 1, 31)),
            Some(ms(2024, 2, 29))
        );
        assert_eq!(
            Frequency::Monthly.advance(ms(2023, 12, 15)),
            Some(ms(2024, 1, 15))
        );
    }

    #[test]
    fn daily_overflow_returns_none() {
        assert_eq!(Frequency::Daily.advance(i64::MAX), None);
    }

    #[test]
    fn set_status_tracks_completion_time() {
        let mut task = Task::new("Design flyer", 5_000, 10);
        task.set_status(TaskStatus::Completed, 20);
        assert_eq!(task.completed_at, Some(20));

        task.set_status(TaskStatus::Completed, 30);
        assert_eq!(task.completed_at, Some(20));

        task.set_status(TaskStatus::Open, 40);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn status_names_match_serialized_form() {
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize status");
        assert_eq!(json, "\"in_progress\"");
    }
}
