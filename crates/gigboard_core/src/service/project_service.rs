//! Project hierarchy use-case service.
//!
//! # Responsibility
//! - CRUD for projects, sprints, campaigns and tasks.
//! - Task status changes, review attachment and commission quotes.
//!
//! # Invariants
//! - Every mutation rewrites the whole project tree and bumps `updated_at`.
//! - Names are trimmed and must not be blank.
//! - Reviews attach only to completed tasks.

use crate::model::project::{Campaign, CampaignId, Project, ProjectId, Sprint, SprintId};
use crate::model::task::{Frequency, Recurrence, Review, Task, TaskId, TaskStatus};
use crate::model::ModelValidationError;
use crate::pricing::{CommissionQuote, CommissionSchedule, PricingError};
use crate::repo::project_repo::{ProjectRepository, RepoError};
use chrono::{NaiveDate, Utc};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Returns the current time in epoch milliseconds.
pub type Clock = fn() -> i64;

/// Wall clock in epoch milliseconds.
pub fn system_clock() -> i64 {
    Utc::now().timestamp_millis()
}

/// Errors from hierarchy service operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Name/title is blank after trim.
    InvalidName(&'static str),
    /// End date precedes start date.
    InvalidDateRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// Review rating outside `1..=5`.
    InvalidRating(u8),
    ProjectNotFound(ProjectId),
    SprintNotFound(SprintId),
    CampaignNotFound(CampaignId),
    TaskNotFound(TaskId),
    /// Reviews require a completed task.
    TaskNotCompleted {
        task_id: TaskId,
        status: TaskStatus,
    },
    /// Commission schedule cannot quote.
    Pricing(PricingError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(entity) => write!(f, "{entity} name must not be blank"),
            Self::InvalidDateRange {
                start_date,
                end_date,
            } => write!(f, "end date {end_date} is before start date {start_date}"),
            Self::InvalidRating(rating) => {
                write!(f, "review rating must be between 1 and 5, got {rating}")
            }
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::SprintNotFound(id) => write!(f, "sprint not found: {id}"),
            Self::CampaignNotFound(id) => write!(f, "campaign not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskNotCompleted { task_id, status } => write!(
                f,
                "task {task_id} is `{}`; only completed tasks can be reviewed",
                status.as_str()
            ),
            Self::Pricing(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pricing(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HierarchyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ProjectNotFound(id),
            RepoError::Validation(err) => err.into(),
            other => Self::Repo(other),
        }
    }
}

impl From<PricingError> for HierarchyError {
    fn from(value: PricingError) -> Self {
        Self::Pricing(value)
    }
}

impl From<ModelValidationError> for HierarchyError {
    fn from(value: ModelValidationError) -> Self {
        match value {
            ModelValidationError::BlankName { entity } => Self::InvalidName(entity),
            ModelValidationError::RatingOutOfRange(rating) => Self::InvalidRating(rating),
            other => Self::Repo(RepoError::Validation(other)),
        }
    }
}

/// Input for creating or updating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Input for creating or updating a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Input for creating or updating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: u64,
    pub assignee: Option<String>,
    /// `None` makes the task one-off.
    pub recurrence: Option<Frequency>,
}

/// Input for reviewing a completed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub reviewer: String,
    pub reviewee: String,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Full address of one task inside the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskPath {
    pub project_id: ProjectId,
    pub sprint_id: SprintId,
    pub campaign_id: CampaignId,
    pub task_id: TaskId,
}

/// Money and progress totals across one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectTotals {
    pub task_count: usize,
    pub completed_count: usize,
    /// Sum of non-cancelled task prices.
    pub gross_cents: u64,
    pub fee_cents: u64,
    pub payout_cents: u64,
}

/// Hierarchy service facade over a project repository.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
    schedule: CommissionSchedule,
    clock: Clock,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates a service with the default commission schedule and wall clock.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            schedule: CommissionSchedule::default(),
            clock: system_clock,
        }
    }

    /// Replaces the commission schedule used by quotes and totals.
    pub fn with_schedule(mut self, schedule: CommissionSchedule) -> Result<Self, PricingError> {
        schedule.validate()?;
        self.schedule = schedule;
        Ok(self)
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn create_project(
        &self,
        owner: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Project, HierarchyError> {
        let name = normalize_name(name.into(), "project")?;
        let mut project = Project::new(owner, name, (self.clock)());
        project.description = normalize_optional(description);
        self.repo.save_project(&project)?;
        info!(
            "event=project_create module=service status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> Result<Option<Project>, HierarchyError> {
        self.repo.load_project(id).map_err(Into::into)
    }

    /// Lists projects, newest update first, optionally for one owner.
    pub fn list_projects(&self, owner: Option<&str>) -> Result<Vec<Project>, HierarchyError> {
        let mut projects = self.repo.list_projects()?;
        if let Some(owner) = owner {
            projects.retain(|project| project.owner == owner);
        }
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    pub fn update_project(
        &self,
        id: ProjectId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Project, HierarchyError> {
        let name = normalize_name(name.into(), "project")?;
        let description = normalize_optional(description);
        self.mutate(id, |project, _| {
            project.name = name;
            project.description = description;
            Ok(())
        })
        .map(|(project, ())| project)
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<(), HierarchyError> {
        self.repo.delete_project(id)?;
        info!("event=project_delete module=service status=ok project_id={id}");
        Ok(())
    }

    pub fn add_sprint(
        &self,
        project_id: ProjectId,
        draft: SprintDraft,
    ) -> Result<Sprint, HierarchyError> {
        let name = normalize_name(draft.name, "sprint")?;
        ensure_date_range(draft.start_date, draft.end_date)?;
        let sprint = Sprint::new(name, draft.start_date, draft.end_date);
        self.mutate(project_id, |project, _| {
            project.sprints.push(sprint.clone());
            Ok(())
        })?;
        Ok(sprint)
    }

    pub fn update_sprint(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
        draft: SprintDraft,
    ) -> Result<Sprint, HierarchyError> {
        let name = normalize_name(draft.name, "sprint")?;
        ensure_date_range(draft.start_date, draft.end_date)?;
        self.mutate(project_id, |project, _| {
            let sprint = find_sprint(project, sprint_id)?;
            sprint.name = name;
            sprint.start_date = draft.start_date;
            sprint.end_date = draft.end_date;
            Ok(sprint.clone())
        })
        .map(|(_, sprint)| sprint)
    }

    pub fn remove_sprint(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
    ) -> Result<(), HierarchyError> {
        self.mutate(project_id, |project, _| {
            let before = project.sprints.len();
            project.sprints.retain(|sprint| sprint.id != sprint_id);
            if project.sprints.len() == before {
                return Err(HierarchyError::SprintNotFound(sprint_id));
            }
            Ok(())
        })?;
        Ok(())
    }

    pub fn add_campaign(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
        draft: CampaignDraft,
    ) -> Result<Campaign, HierarchyError> {
        let name = normalize_name(draft.name, "campaign")?;
        ensure_date_range(draft.start_date, draft.end_date)?;
        let campaign = Campaign::new(name, draft.start_date, draft.end_date);
        self.mutate(project_id, |project, _| {
            find_sprint(project, sprint_id)?
                .campaigns
                .push(campaign.clone());
            Ok(())
        })?;
        Ok(campaign)
    }

    pub fn update_campaign(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
        campaign_id: CampaignId,
        draft: CampaignDraft,
    ) -> Result<Campaign, HierarchyError> {
        let name = normalize_name(draft.name, "campaign")?;
        ensure_date_range(draft.start_date, draft.end_date)?;
        self.mutate(project_id, |project, _| {
            let campaign = find_campaign(project, sprint_id, campaign_id)?;
            campaign.name = name;
            campaign.start_date = draft.start_date;
            campaign.end_date = draft.end_date;
            Ok(campaign.clone())
        })
        .map(|(_, campaign)| campaign)
    }

    pub fn remove_campaign(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
        campaign_id: CampaignId,
    ) -> Result<(), HierarchyError> {
        self.mutate(project_id, |project, _| {
            let sprint = find_sprint(project, sprint_id)?;
            let before = sprint.campaigns.len();
            sprint.campaigns.retain(|campaign| campaign.id != campaign_id);
            if sprint.campaigns.len() == before {
                return Err(HierarchyError::CampaignNotFound(campaign_id));
            }
            Ok(())
        })?;
        Ok(())
    }

    pub fn add_task(
        &self,
        project_id: ProjectId,
        sprint_id: SprintId,
        campaign_id: CampaignId,
        draft: TaskDraft,
    ) -> Result<Task, HierarchyError> {
        let title = normalize_name(draft.title, "task")?;
        self.mutate(project_id, |project, now_ms| {
            let campaign = find_campaign(project, sprint_id, campaign_id)?;
            let mut task = Task::new(title, draft.price_cents, now_ms);
            task.description = normalize_optional(draft.description);
            task.assignee = normalize_optional(draft.assignee);
            task.recurrence = draft
                .recurrence
                .map(|frequency| Recurrence::new(frequency, now_ms));
            campaign.tasks.push(task.clone());
            Ok(task)
        })
        .map(|(_, task)| task)
    }

    /// Replaces task fields from `draft`.
    ///
    /// Keeping the same frequency keeps the current recurrence window;
    /// a new frequency starts a fresh window now.
    pub fn update_task(&self, path: TaskPath, draft: TaskDraft) -> Result<Task, HierarchyError> {
        let title = normalize_name(draft.title, "task")?;
        self.mutate(path.project_id, |project, now_ms| {
            let task = find_task(project, &path)?;
            task.title = title;
            task.description = normalize_optional(draft.description);
            task.price_cents = draft.price_cents;
            task.assignee = normalize_optional(draft.assignee);
            task.recurrence = match (draft.recurrence, task.recurrence) {
                (Some(frequency), Some(current)) if current.frequency == frequency => {
                    Some(current)
                }
                (Some(frequency), _) => Some(Recurrence::new(frequency, now_ms)),
                (None, _) => None,
            };
            Ok(task.clone())
        })
        .map(|(_, task)| task)
    }

    pub fn remove_task(&self, path: TaskPath) -> Result<(), HierarchyError> {
        self.mutate(path.project_id, |project, _| {
            let campaign = find_campaign(project, path.sprint_id, path.campaign_id)?;
            let before = campaign.tasks.len();
            campaign.tasks.retain(|task| task.id != path.task_id);
            if campaign.tasks.len() == before {
                return Err(HierarchyError::TaskNotFound(path.task_id));
            }
            Ok(())
        })?;
        Ok(())
    }

    pub fn get_task(&self, path: TaskPath) -> Result<Task, HierarchyError> {
        let project = self.load_required(path.project_id)?;
        project
            .sprint(path.sprint_id)
            .ok_or(HierarchyError::SprintNotFound(path.sprint_id))?
            .campaign(path.campaign_id)
            .ok_or(HierarchyError::CampaignNotFound(path.campaign_id))?
            .task(path.task_id)
            .cloned()
            .ok_or(HierarchyError::TaskNotFound(path.task_id))
    }

    /// Sets task status without transition guards.
    pub fn set_task_status(
        &self,
        path: TaskPath,
        status: TaskStatus,
    ) -> Result<Task, HierarchyError> {
        let (_, task) = self.mutate(path.project_id, |project, now_ms| {
            let task = find_task(project, &path)?;
            task.set_status(status, now_ms);
            Ok(task.clone())
        })?;
        info!(
            "event=task_status_set module=service status=ok project_id={} task_id={} task_status={}",
            path.project_id,
            path.task_id,
            status.as_str()
        );
        Ok(task)
    }

    /// Attaches (or replaces) the review on a completed task.
    pub fn attach_review(
        &self,
        path: TaskPath,
        draft: ReviewDraft,
    ) -> Result<Review, HierarchyError> {
        let reviewer = normalize_name(draft.reviewer, "reviewer")?;
        let reviewee = normalize_name(draft.reviewee, "reviewee")?;
        let (_, review) = self.mutate(path.project_id, |project, now_ms| {
            let task = find_task(project, &path)?;
            if task.status != TaskStatus::Completed {
                return Err(HierarchyError::TaskNotCompleted {
                    task_id: task.id,
                    status: task.status,
                });
            }
            let review = Review {
                id: Uuid::new_v4(),
                reviewer,
                reviewee,
                rating: draft.rating,
                comment: normalize_optional(draft.comment),
                created_at: now_ms,
            };
            review.validate()?;
            task.review = Some(review.clone());
            Ok(review)
        })?;
        info!(
            "event=review_attach module=service status=ok project_id={} task_id={} rating={}",
            path.project_id, path.task_id, review.rating
        );
        Ok(review)
    }

    /// Quotes the commission on one task's price.
    pub fn quote_task(&self, path: TaskPath) -> Result<CommissionQuote, HierarchyError> {
        let task = self.get_task(path)?;
        self.quote(task.price_cents)
    }

    /// Sums prices and commissions over all non-cancelled tasks.
    pub fn project_totals(&self, project_id: ProjectId) -> Result<ProjectTotals, HierarchyError> {
        let project = self.load_required(project_id)?;
        let mut totals = ProjectTotals::default();
        for task in project.tasks() {
            totals.task_count += 1;
            if task.status == TaskStatus::Completed {
                totals.completed_count += 1;
            }
            if task.status == TaskStatus::Cancelled {
                continue;
            }
            let quote = self.quote(task.price_cents)?;
            totals.gross_cents = totals.gross_cents.saturating_add(quote.amount_cents);
            totals.fee_cents = totals.fee_cents.saturating_add(quote.fee_cents);
            totals.payout_cents = totals.payout_cents.saturating_add(quote.payout_cents);
        }
        Ok(totals)
    }

    fn quote(&self, amount_cents: u64) -> Result<CommissionQuote, HierarchyError> {
        self.schedule
            .quote(amount_cents)
            .ok_or(HierarchyError::Pricing(PricingError::EmptySchedule))
    }

    fn load_required(&self, id: ProjectId) -> Result<Project, HierarchyError> {
        self.repo
            .load_project(id)?
            .ok_or(HierarchyError::ProjectNotFound(id))
    }

    /// Loads, edits and rewrites one project tree.
    fn mutate<T>(
        &self,
        project_id: ProjectId,
        edit: impl FnOnce(&mut Project, i64) -> Result<T, HierarchyError>,
    ) -> Result<(Project, T), HierarchyError> {
        let mut project = self.load_required(project_id)?;
        let now_ms = (self.clock)();
        let output = edit(&mut project, now_ms)?;
        project.updated_at = now_ms.max(project.updated_at);
        self.repo.save_project(&project)?;
        Ok((project, output))
    }
}

fn find_sprint(project: &mut Project, sprint_id: SprintId) -> Result<&mut Sprint, HierarchyError> {
    project
        .sprint_mut(sprint_id)
        .ok_or(HierarchyError::SprintNotFound(sprint_id))
}

fn find_campaign(
    project: &mut Project,
    sprint_id: SprintId,
    campaign_id: CampaignId,
) -> Result<&mut Campaign, HierarchyError> {
    find_sprint(project, sprint_id)?
        .campaign_mut(campaign_id)
        .ok_or(HierarchyError::CampaignNotFound(campaign_id))
}

fn find_task<'p>(project: &'p mut Project, path: &TaskPath) -> Result<&'p mut Task, HierarchyError> {
    find_campaign(project, path.sprint_id, path.campaign_id)?
        .task_mut(path.task_id)
        .ok_or(HierarchyError::TaskNotFound(path.task_id))
}

fn normalize_name(value: String, entity: &'static str) -> Result<String, HierarchyError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HierarchyError::InvalidName(entity));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn ensure_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), HierarchyError> {
    if end_date < start_date {
        return Err(HierarchyError::InvalidDateRange {
            start_date,
            end_date,
        });
    }
    Ok(())
}
