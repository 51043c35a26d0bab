use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ids::touch;
use crate::models::{
    project::Project,
    todo::{NewTodo, Todo, TodoChanges},
};

/// Current schema version
pub const CURRENT_VERSION: u32 = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Todo '{0}' not found")]
    TodoNotFound(Uuid),

    #[error("No project is selected")]
    NoActiveProject,

    #[error("Cannot move todo '{dragged}' onto '{target}': they belong to different projects")]
    CrossProjectReorder { dragged: Uuid, target: Uuid },
}

/// The complete set of projects and todos.
///
/// Every mutation validates its preconditions before touching any field, so a
/// returned error always leaves the snapshot exactly as it was.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppData {
    pub version: u32,
    pub projects: Vec<Project>,
    pub todos: Vec<Todo>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            projects: vec![],
            todos: vec![],
        }
    }
}

/// What a cascading project delete removed
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedProject {
    pub project: Project,
    pub todos: Vec<Todo>,
}

impl AppData {
    pub fn get_project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn get_project_mut(&mut self, id: Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn get_todo(&self, id: Uuid) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    fn get_todo_mut(&mut self, id: Uuid) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    pub fn get_todos_for_project(&self, project_id: Uuid) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(move |t| t.project_id == project_id)
    }

    /// One past the highest position in the project, or 0 when it has no todos
    pub fn next_position(&self, project_id: Uuid) -> u32 {
        self.get_todos_for_project(project_id)
            .map(|t| t.position.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn add_project(&mut self, project: Project) -> &Project {
        self.projects.push(project);
        &self.projects[self.projects.len() - 1]
    }

    pub fn update_project(
        &mut self,
        id: Uuid,
        name: String,
        description: String,
        now: Timestamp,
    ) -> Result<&Project, StoreError> {
        let project = self
            .get_project_mut(id)
            .ok_or(StoreError::ProjectNotFound(id))?;
        project.name = name;
        project.description = description;
        project.updated_at = touch(project.updated_at, now);
        Ok(project)
    }

    /// Removes the project together with every todo that references it
    pub fn delete_project(&mut self, id: Uuid) -> Result<RemovedProject, StoreError> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::ProjectNotFound(id))?;

        let project = self.projects.remove(index);
        let (removed, kept): (Vec<Todo>, Vec<Todo>) = std::mem::take(&mut self.todos)
            .into_iter()
            .partition(|t| t.project_id == id);
        self.todos = kept;

        Ok(RemovedProject {
            project,
            todos: removed,
        })
    }

    /// Appends a todo to the end of the project's manual order
    pub fn add_todo(
        &mut self,
        id: Uuid,
        project_id: Option<Uuid>,
        fields: NewTodo,
        now: Timestamp,
    ) -> Result<&Todo, StoreError> {
        let project_id = project_id.ok_or(StoreError::NoActiveProject)?;
        if self.get_project(project_id).is_none() {
            return Err(StoreError::ProjectNotFound(project_id));
        }

        let todo = Todo {
            id,
            project_id,
            title: fields.title,
            description: fields.description,
            completed: false,
            priority: fields.priority,
            deadline: fields.deadline,
            tags: fields.tags,
            position: self.next_position(project_id),
            created_at: now,
            updated_at: now,
        };
        self.todos.push(todo);
        Ok(&self.todos[self.todos.len() - 1])
    }

    pub fn update_todo(
        &mut self,
        id: Uuid,
        changes: TodoChanges,
        now: Timestamp,
    ) -> Result<&Todo, StoreError> {
        let todo = self.get_todo_mut(id).ok_or(StoreError::TodoNotFound(id))?;
        todo.apply(changes);
        todo.updated_at = touch(todo.updated_at, now);
        Ok(todo)
    }

    pub fn delete_todo(&mut self, id: Uuid) -> Result<Todo, StoreError> {
        let index = self
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TodoNotFound(id))?;
        Ok(self.todos.remove(index))
    }

    pub fn toggle_todo(&mut self, id: Uuid, now: Timestamp) -> Result<&Todo, StoreError> {
        let todo = self.get_todo_mut(id).ok_or(StoreError::TodoNotFound(id))?;
        todo.completed = !todo.completed;
        todo.updated_at = touch(todo.updated_at, now);
        Ok(todo)
    }

    /// Moves `dragged_id` to the slot `target_id` occupied before the drop.
    ///
    /// The project's todos are taken in position order, the dragged one is pulled
    /// out and reinserted at the target's original index, then every todo of the
    /// project is renumbered 0..n. Todos whose position changed get a new
    /// `updated_at`. Returns the number of todos whose position changed.
    pub fn reorder_todos(
        &mut self,
        dragged_id: Uuid,
        target_id: Uuid,
        now: Timestamp,
    ) -> Result<usize, StoreError> {
        let dragged = self
            .get_todo(dragged_id)
            .ok_or(StoreError::TodoNotFound(dragged_id))?;
        let target = self
            .get_todo(target_id)
            .ok_or(StoreError::TodoNotFound(target_id))?;
        if dragged.project_id != target.project_id {
            return Err(StoreError::CrossProjectReorder {
                dragged: dragged_id,
                target: target_id,
            });
        }
        if dragged_id == target_id {
            return Ok(0);
        }
        let project_id = dragged.project_id;

        let mut ordered: Vec<(u32, Uuid)> = self
            .get_todos_for_project(project_id)
            .map(|t| (t.position, t.id))
            .collect();
        // Stable, so duplicate positions keep their stored order
        ordered.sort_by_key(|(position, _)| *position);
        let mut ordered: Vec<Uuid> = ordered.into_iter().map(|(_, id)| id).collect();

        let target_index = ordered
            .iter()
            .position(|id| *id == target_id)
            .ok_or(StoreError::TodoNotFound(target_id))?;
        ordered.retain(|id| *id != dragged_id);
        ordered.insert(target_index.min(ordered.len()), dragged_id);

        let mut changed = 0;
        for (index, id) in ordered.into_iter().enumerate() {
            let position = index as u32;
            if let Some(todo) = self.get_todo_mut(id)
                && todo.position != position
            {
                todo.position = position;
                todo.updated_at = touch(todo.updated_at, now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Todos whose project no longer exists. Always empty unless the
    /// cascading delete was bypassed, e.g. by a hand-edited data file.
    pub fn orphaned_todos(&self) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|t| self.get_project(t.project_id).is_none())
            .collect()
    }
}
