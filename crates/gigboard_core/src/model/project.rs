//! Project → Sprint → Campaign tree.
//!
//! One `Project` is persisted as a single JSON document containing every
//! nested sprint, campaign and task.

use super::task::Task;
use super::ModelValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type SprintId = Uuid;
pub type CampaignId = Uuid;

/// Root of one persisted hierarchy tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Employer account that posted the project.
    pub owner: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms; bumped by every mutation.
    pub updated_at: i64,
}

/// Time-boxed slice of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: SprintId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

/// Group of related tasks inside a sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Creates an empty project with a generated id.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner: owner.into(),
            description: None,
            sprints: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Validates names and date ranges across the whole tree.
    ///
    /// Sibling ids are not checked; lookups by id return the first match.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankName { entity: "project" });
        }
        for sprint in &self.sprints {
            sprint.validate()?;
        }
        Ok(())
    }

    pub fn sprint(&self, id: SprintId) -> Option<&Sprint> {
        self.sprints.iter().find(|sprint| sprint.id == id)
    }

    pub fn sprint_mut(&mut self, id: SprintId) -> Option<&mut Sprint> {
        self.sprints.iter_mut().find(|sprint| sprint.id == id)
    }

    /// Iterates every task in tree order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.sprints
            .iter()
            .flat_map(|sprint| sprint.campaigns.iter())
            .flat_map(|campaign| campaign.tasks.iter())
    }

    /// Iterates every task mutably in tree order.
    pub fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.sprints
            .iter_mut()
            .flat_map(|sprint| sprint.campaigns.iter_mut())
            .flat_map(|campaign| campaign.tasks.iter_mut())
    }
}

impl Sprint {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
            campaigns: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_named_range("sprint", self.id, &self.name, self.start_date, self.end_date)?;
        for campaign in &self.campaigns {
            campaign.validate()?;
        }
        Ok(())
    }

    pub fn campaign(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns.iter().find(|campaign| campaign.id == id)
    }

    pub fn campaign_mut(&mut self, id: CampaignId) -> Option<&mut Campaign> {
        self.campaigns.iter_mut().find(|campaign| campaign.id == id)
    }
}

impl Campaign {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
            tasks: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_named_range("campaign", self.id, &self.name, self.start_date, self.end_date)?;
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }
}

fn validate_named_range(
    entity: &'static str,
    id: Uuid,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), ModelValidationError> {
    if name.trim().is_empty() {
        return Err(ModelValidationError::BlankName { entity });
    }
    if end_date < start_date {
        return Err(ModelValidationError::InvalidDateRange { entity, id });
    }
    Ok(())
}
