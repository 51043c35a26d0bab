use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ids::{Clock, new_id},
    models::{project::Project, store::AppData},
    services::{commit, non_blank},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum CreateProjectError {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default)]
pub struct CreateProjectParameters {
    pub name: String,
    pub description: String,
}

pub fn create_project(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    parameters: CreateProjectParameters,
) -> Result<Project, CreateProjectError> {
    let name = non_blank(parameters.name).ok_or(CreateProjectError::EmptyName)?;
    let project = Project::new(new_id(), name, parameters.description, clock.now());

    let project = commit(store, storage, |next| {
        Ok::<_, CreateProjectError>(next.add_project(project).clone())
    })?;

    debug!(project_id = %project.id, name = %project.name, "created project");
    Ok(project)
}

#[derive(Debug, Error)]
pub enum UpdateProjectError {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct UpdateProjectParameters {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

pub fn update_project(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    parameters: UpdateProjectParameters,
) -> Result<Project, UpdateProjectError> {
    let name = non_blank(parameters.name).ok_or(UpdateProjectError::EmptyName)?;
    let id = parameters.id;

    let project = commit(store, storage, |next| {
        next.update_project(id, name, parameters.description, clock.now())
            .map(Project::clone)
            .map_err(|_| UpdateProjectError::ProjectNotFound(id))
    })?;

    debug!(project_id = %project.id, "updated project");
    Ok(project)
}

#[derive(Debug, Error)]
pub enum DeleteProjectError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteProjectParameters {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteProjectResult {
    pub project: Project,
    pub cascaded_todos_count: usize,
}

/// Deletes the project and, in the same snapshot, every todo it owns
pub fn delete_project(
    store: &mut AppData,
    storage: &impl Storage,
    parameters: DeleteProjectParameters,
) -> Result<DeleteProjectResult, DeleteProjectError> {
    let id = parameters.id;

    let removed = commit(store, storage, |next| {
        next.delete_project(id)
            .map_err(|_| DeleteProjectError::ProjectNotFound(id))
    })?;

    debug!(
        project_id = %id,
        cascaded_todos = removed.todos.len(),
        "deleted project"
    );
    Ok(DeleteProjectResult {
        project: removed.project,
        cascaded_todos_count: removed.todos.len(),
    })
}
