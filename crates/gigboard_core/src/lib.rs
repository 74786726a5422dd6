//! Core domain logic for the gigboard marketplace.
//! Projects, sprints, campaigns and tasks live here, together with the
//! recurrence sweep, review ranking and commission pricing.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod pricing;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::project::{Campaign, CampaignId, Project, ProjectId, Sprint, SprintId};
pub use model::task::{Frequency, Recurrence, Review, ReviewId, Task, TaskId, TaskStatus};
pub use model::ModelValidationError;
pub use pricing::{
    commission_for, CommissionQuote, CommissionSchedule, CommissionTier, PricingError,
};
pub use repo::project_repo::{KvProjectRepository, ProjectRepository, RepoError, RepoResult};
pub use service::project_service::{
    system_clock, CampaignDraft, Clock, HierarchyError, ProjectService, ProjectTotals,
    ReviewDraft, SprintDraft, TaskDraft, TaskPath,
};
pub use service::recurrence_service::{
    RecurrenceEngine, RecurrenceScheduler, SchedulerHandle, SweepReport,
};
pub use service::review_service::{
    ReviewEntry, ReviewPage, ReviewQuery, ReviewService, ReviewSummary,
};
pub use storage::{get_json, set_json, KvStore, SqliteKvStore, StorageError, StorageResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
