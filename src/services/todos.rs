use jiff::civil::Date;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ids::{Clock, new_id},
    models::{
        store::{AppData, StoreError},
        todo::{NewTodo, Priority, Todo, TodoChanges},
    },
    services::{commit, non_blank},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum AddTodoError {
    #[error("Todo title cannot be empty")]
    EmptyTitle,

    #[error("Select a project before adding todos")]
    NoActiveProject,

    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Invalid deadline date '{0}': {1}")]
    InvalidDeadline(String, String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default)]
pub struct AddTodoParameters {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// `YYYY-MM-DD`; blank means no deadline
    pub deadline: Option<String>,
    pub tags: Vec<String>,
}

/// Adds a todo at the end of `project_id`'s manual order
pub fn add_todo(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    project_id: Option<Uuid>,
    parameters: AddTodoParameters,
) -> Result<Todo, AddTodoError> {
    let project_id = project_id.ok_or(AddTodoError::NoActiveProject)?;
    let title = non_blank(parameters.title).ok_or(AddTodoError::EmptyTitle)?;
    let deadline = parse_deadline(parameters.deadline.as_deref())
        .map_err(|(input, e)| AddTodoError::InvalidDeadline(input, e))?;

    let fields = NewTodo {
        title,
        description: parameters.description,
        priority: parameters.priority,
        deadline,
        tags: normalize_tags(parameters.tags),
    };

    let todo = commit(store, storage, |next| {
        next.add_todo(new_id(), Some(project_id), fields, clock.now())
            .map(Todo::clone)
            .map_err(|e| match e {
                StoreError::NoActiveProject => AddTodoError::NoActiveProject,
                _ => AddTodoError::ProjectNotFound(project_id),
            })
    })?;

    debug!(todo_id = %todo.id, project_id = %project_id, position = todo.position, "added todo");
    Ok(todo)
}

#[derive(Debug, Error)]
pub enum UpdateTodoError {
    #[error("Todo title cannot be empty")]
    EmptyTitle,

    #[error("Todo '{0}' not found")]
    TodoNotFound(Uuid),

    #[error("Invalid deadline date '{0}': {1}")]
    InvalidDeadline(String, String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fields to merge into an existing todo; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoParameters {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// `YYYY-MM-DD` sets the deadline, a blank string clears it
    pub deadline: Option<String>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
}

pub fn update_todo(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    parameters: UpdateTodoParameters,
) -> Result<Todo, UpdateTodoError> {
    let id = parameters.id;
    let title = match parameters.title {
        Some(title) => Some(non_blank(title).ok_or(UpdateTodoError::EmptyTitle)?),
        None => None,
    };
    let deadline = match parameters.deadline {
        Some(input) => Some(
            parse_deadline(Some(input.as_str()))
                .map_err(|(input, e)| UpdateTodoError::InvalidDeadline(input, e))?,
        ),
        None => None,
    };

    let changes = TodoChanges {
        title,
        description: parameters.description,
        priority: parameters.priority,
        deadline,
        tags: parameters.tags.map(normalize_tags),
        completed: parameters.completed,
    };

    let todo = commit(store, storage, |next| {
        next.update_todo(id, changes, clock.now())
            .map(Todo::clone)
            .map_err(|_| UpdateTodoError::TodoNotFound(id))
    })?;

    debug!(todo_id = %id, "updated todo");
    Ok(todo)
}

#[derive(Debug, Error)]
pub enum DeleteTodoError {
    #[error("Todo '{0}' not found")]
    TodoNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteTodoParameters {
    pub id: Uuid,
}

pub fn delete_todo(
    store: &mut AppData,
    storage: &impl Storage,
    parameters: DeleteTodoParameters,
) -> Result<Todo, DeleteTodoError> {
    let id = parameters.id;

    let todo = commit(store, storage, |next| {
        next.delete_todo(id)
            .map_err(|_| DeleteTodoError::TodoNotFound(id))
    })?;

    debug!(todo_id = %id, "deleted todo");
    Ok(todo)
}

#[derive(Debug, Error)]
pub enum ToggleTodoError {
    #[error("Todo '{0}' not found")]
    TodoNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
pub struct ToggleTodoParameters {
    pub id: Uuid,
}

pub fn toggle_todo(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    parameters: ToggleTodoParameters,
) -> Result<Todo, ToggleTodoError> {
    let id = parameters.id;

    let todo = commit(store, storage, |next| {
        next.toggle_todo(id, clock.now())
            .map(Todo::clone)
            .map_err(|_| ToggleTodoError::TodoNotFound(id))
    })?;

    debug!(todo_id = %id, completed = todo.completed, "toggled todo");
    Ok(todo)
}

#[derive(Debug, Error)]
pub enum ReorderTodosError {
    #[error("Todo '{0}' not found")]
    TodoNotFound(Uuid),

    #[error("Cannot move todo '{dragged}' onto '{target}': they belong to different projects")]
    CrossProject { dragged: Uuid, target: Uuid },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
pub struct ReorderTodosParameters {
    pub dragged_id: Uuid,
    pub target_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderTodosResult {
    /// Todos whose position changed
    pub moved: usize,
}

/// Drops `dragged_id` onto `target_id` within their shared project.
///
/// This only renumbers positions. Switching the visible list to manual order
/// is the caller's job, see [`crate::services::app::App::dispatch`].
pub fn reorder_todos(
    store: &mut AppData,
    storage: &impl Storage,
    clock: &impl Clock,
    parameters: ReorderTodosParameters,
) -> Result<ReorderTodosResult, ReorderTodosError> {
    let ReorderTodosParameters {
        dragged_id,
        target_id,
    } = parameters;

    let moved = commit(store, storage, |next| {
        next.reorder_todos(dragged_id, target_id, clock.now())
            .map_err(|e| match e {
                StoreError::CrossProjectReorder { dragged, target } => {
                    ReorderTodosError::CrossProject { dragged, target }
                }
                StoreError::TodoNotFound(id) => ReorderTodosError::TodoNotFound(id),
                _ => ReorderTodosError::TodoNotFound(dragged_id),
            })
    })?;

    debug!(dragged = %dragged_id, target = %target_id, moved, "reordered todos");
    Ok(ReorderTodosResult { moved })
}

/// Parses an optional `YYYY-MM-DD` input; blank input means no deadline
fn parse_deadline(input: Option<&str>) -> Result<Option<Date>, (String, String)> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<Date>()
            .map(Some)
            .map_err(|e| (text.to_string(), e.to_string())),
    }
}

/// Trims tags and drops blanks and repeats, keeping first occurrence order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}
