//! Project repository contracts and key-value implementation.
//!
//! # Invariants
//! - Key layout is `project:<uuid>`; nothing else uses that prefix.
//! - Single loads reject invalid persisted trees instead of masking them.
//! - Bulk listing skips invalid trees and keeps going.
//! - Saves overwrite the full tree (last write wins).

use crate::model::project::{Project, ProjectId};
use crate::model::ModelValidationError;
use crate::storage::{get_json, set_json, KvStore, StorageError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PROJECT_KEY_PREFIX: &str = "project:";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for project persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Storage(StorageError),
    NotFound(ProjectId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Serde { key, source } => {
                Self::InvalidData(format!("key `{key}`: {source}"))
            }
            other => Self::Storage(other),
        }
    }
}

/// Repository interface for whole-tree project persistence.
pub trait ProjectRepository {
    /// Inserts or overwrites one project tree.
    fn save_project(&self, project: &Project) -> RepoResult<()>;
    fn load_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Loads every readable project in key order; unreadable trees are
    /// skipped so one bad document cannot hide the rest.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

/// Project repository backed by any `KvStore`.
pub struct KvProjectRepository<S: KvStore> {
    store: S,
}

impl<S: KvStore> KvProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KvStore> ProjectRepository for KvProjectRepository<S> {
    fn save_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        set_json(&self.store, &project_key(project.id), project)?;
        Ok(())
    }

    fn load_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let key = project_key(id);
        let Some(project) = get_json::<Project, _>(&self.store, &key)? else {
            return Ok(None);
        };
        if project.id != id {
            return Err(RepoError::InvalidData(format!(
                "key `{key}` holds project {}",
                project.id
            )));
        }
        project.validate().map_err(|err| {
            RepoError::InvalidData(format!("key `{key}`: {err}"))
        })?;
        Ok(Some(project))
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut projects = Vec::new();
        for key in self.store.keys_with_prefix(PROJECT_KEY_PREFIX)? {
            let Some(id) = parse_project_key(&key) else {
                warn!("event=project_list module=repo status=skip reason=unparsable_key");
                continue;
            };
            match self.load_project(id) {
                Ok(Some(project)) => projects.push(project),
                Ok(None) => {}
                Err(RepoError::InvalidData(_)) => {
                    warn!("event=project_list module=repo status=skip reason=invalid_data");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(projects)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        if !self.store.remove(&project_key(id))? {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn project_key(id: ProjectId) -> String {
    format!("{PROJECT_KEY_PREFIX}{id}")
}

fn parse_project_key(key: &str) -> Option<ProjectId> {
    key.strip_prefix(PROJECT_KEY_PREFIX)
        .and_then(|raw| ProjectId::parse_str(raw).ok())
}
