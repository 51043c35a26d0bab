//! The application context handed to the view layer.
//!
//! One [`App`] is built at startup and passed around explicitly. The view layer
//! reads from it and expresses every change as a [`Command`]; `dispatch` runs
//! each command to completion before returning.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    ids::{Clock, SystemClock},
    models::{
        filter::FilterSpec,
        project::Project,
        store::{AppData, StoreError},
        todo::Todo,
    },
    query::{filter_todos, tags::all_tags},
    services::{
        debounce::Debouncer,
        projects::{
            CreateProjectError, CreateProjectParameters, DeleteProjectError,
            DeleteProjectParameters, DeleteProjectResult, UpdateProjectError,
            UpdateProjectParameters, create_project, delete_project, update_project,
        },
        todos::{
            AddTodoError, AddTodoParameters, DeleteTodoError, DeleteTodoParameters,
            ReorderTodosError, ReorderTodosParameters, ToggleTodoError, ToggleTodoParameters,
            UpdateTodoError, UpdateTodoParameters, add_todo, delete_todo, reorder_todos,
            toggle_todo, update_todo,
        },
    },
    storage::{Storage, StorageError},
};

/// An intent issued by the view layer
#[derive(Debug, Clone)]
pub enum Command {
    AddProject(CreateProjectParameters),
    UpdateProject(UpdateProjectParameters),
    DeleteProject(DeleteProjectParameters),
    /// Added to the active project
    AddTodo(AddTodoParameters),
    UpdateTodo(UpdateTodoParameters),
    DeleteTodo(DeleteTodoParameters),
    ToggleTodo(ToggleTodoParameters),
    ReorderTodos(ReorderTodosParameters),
}

/// What a successful command changed
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    ProjectAdded(Project),
    ProjectUpdated(Project),
    ProjectDeleted {
        result: DeleteProjectResult,
        /// The deleted project was the active one and the selection was cleared
        cleared_active: bool,
    },
    TodoAdded(Todo),
    TodoUpdated(Todo),
    TodoDeleted(Todo),
    TodoToggled(Todo),
    TodosReordered {
        moved: usize,
        /// The filters were switched to manual order (position, ascending)
        sort_reset: bool,
    },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    CreateProject(#[from] CreateProjectError),
    #[error(transparent)]
    UpdateProject(#[from] UpdateProjectError),
    #[error(transparent)]
    DeleteProject(#[from] DeleteProjectError),
    #[error(transparent)]
    AddTodo(#[from] AddTodoError),
    #[error(transparent)]
    UpdateTodo(#[from] UpdateTodoError),
    #[error(transparent)]
    DeleteTodo(#[from] DeleteTodoError),
    #[error(transparent)]
    ToggleTodo(#[from] ToggleTodoError),
    #[error(transparent)]
    ReorderTodos(#[from] ReorderTodosError),
}

impl CommandError {
    /// True when the command referenced an id that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommandError::UpdateProject(UpdateProjectError::ProjectNotFound(_))
                | CommandError::DeleteProject(DeleteProjectError::ProjectNotFound(_))
                | CommandError::AddTodo(AddTodoError::ProjectNotFound(_))
                | CommandError::UpdateTodo(UpdateTodoError::TodoNotFound(_))
                | CommandError::DeleteTodo(DeleteTodoError::TodoNotFound(_))
                | CommandError::ToggleTodo(ToggleTodoError::TodoNotFound(_))
                | CommandError::ReorderTodos(ReorderTodosError::TodoNotFound(_))
        )
    }
}

pub struct App<S: Storage, C: Clock = SystemClock> {
    data: AppData,
    storage: S,
    clock: C,
    active_project_id: Option<Uuid>,
    filters: FilterSpec,
    search_input: Debouncer<String>,
    sidebar_open: bool,
}

impl<S: Storage> App<S, SystemClock> {
    /// Loads the persisted data set and starts with no project selected
    pub fn open(storage: S) -> Result<Self, StorageError> {
        Self::open_with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> App<S, C> {
    pub fn open_with_clock(storage: S, clock: C) -> Result<Self, StorageError> {
        let data = storage.load()?;
        Ok(Self::new(data, storage, clock))
    }

    pub fn new(data: AppData, storage: S, clock: C) -> Self {
        for orphan in data.orphaned_todos() {
            error!(
                todo_id = %orphan.id,
                project_id = %orphan.project_id,
                "todo references a project that does not exist"
            );
        }

        Self {
            data,
            storage,
            clock,
            active_project_id: None,
            filters: FilterSpec::default(),
            search_input: Debouncer::default(),
            sidebar_open: false,
        }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    pub fn todos(&self) -> &[Todo] {
        &self.data.todos
    }

    pub fn active_project_id(&self) -> Option<Uuid> {
        self.active_project_id
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id
            .and_then(|id| self.data.get_project(id))
    }

    /// Selects the project whose todos are listed; `None` clears the selection
    pub fn set_active_project(&mut self, id: Option<Uuid>) -> Result<(), StoreError> {
        if let Some(id) = id
            && self.data.get_project(id).is_none()
        {
            return Err(StoreError::ProjectNotFound(id));
        }
        self.active_project_id = id;
        Ok(())
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterSpec) {
        self.filters = filters;
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
    }

    /// Visible todos of the active project under the current filters
    pub fn filtered_todos(&self) -> Vec<&Todo> {
        filter_todos(&self.data.todos, self.active_project_id, &self.filters)
    }

    /// Tags used in the active project, for the tag filter menu
    pub fn all_tags(&self) -> Vec<String> {
        match self.active_project_id {
            Some(id) => all_tags(self.data.get_todos_for_project(id)),
            None => vec![],
        }
    }

    /// Records typed search text; it is applied by [`App::flush_search`] once
    /// typing pauses.
    pub fn input_search(&mut self, text: impl Into<String>, at: Instant) {
        self.search_input.push(text.into(), at);
    }

    /// The search text as typed, which may not be applied yet
    pub fn search_input(&self) -> &str {
        self.search_input
            .pending()
            .map(String::as_str)
            .unwrap_or(&self.filters.search)
    }

    /// Applies typed search text whose quiet period elapsed. Returns whether the
    /// filters changed.
    pub fn flush_search(&mut self, now: Instant) -> bool {
        match self.search_input.poll(now) {
            Some(text) if text != self.filters.search => {
                self.filters.search = text;
                true
            }
            _ => false,
        }
    }

    /// Applies typed search text right away, without waiting for the quiet period.
    /// Returns whether the filters changed.
    pub fn commit_search(&mut self) -> bool {
        match self.search_input.flush() {
            Some(text) if text != self.filters.search => {
                self.filters.search = text;
                true
            }
            _ => false,
        }
    }

    /// Applies one command.
    ///
    /// Besides the data change, some commands touch view state:
    /// - `AddProject` selects the new project.
    /// - `DeleteProject` clears the selection if it pointed at the deleted project.
    /// - `AddTodo` targets the selected project and fails without one.
    /// - `ReorderTodos` switches the filters to manual order so the drop is
    ///   visible where the user made it.
    ///
    /// A failed command changes neither the data nor the view state.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, CommandError> {
        let storage = &self.storage;
        let clock = &self.clock;
        let store = &mut self.data;

        let outcome = match command {
            Command::AddProject(parameters) => {
                let project = create_project(store, storage, clock, parameters)?;
                self.active_project_id = Some(project.id);
                Outcome::ProjectAdded(project)
            }
            Command::UpdateProject(parameters) => {
                Outcome::ProjectUpdated(update_project(store, storage, clock, parameters)?)
            }
            Command::DeleteProject(parameters) => {
                let result = delete_project(store, storage, parameters)?;
                let cleared_active = self.active_project_id == Some(result.project.id);
                if cleared_active {
                    self.active_project_id = None;
                }
                Outcome::ProjectDeleted {
                    result,
                    cleared_active,
                }
            }
            Command::AddTodo(parameters) => Outcome::TodoAdded(add_todo(
                store,
                storage,
                clock,
                self.active_project_id,
                parameters,
            )?),
            Command::UpdateTodo(parameters) => {
                Outcome::TodoUpdated(update_todo(store, storage, clock, parameters)?)
            }
            Command::DeleteTodo(parameters) => {
                Outcome::TodoDeleted(delete_todo(store, storage, parameters)?)
            }
            Command::ToggleTodo(parameters) => {
                Outcome::TodoToggled(toggle_todo(store, storage, clock, parameters)?)
            }
            Command::ReorderTodos(parameters) => {
                let result = reorder_todos(store, storage, clock, parameters)?;
                let sort_reset = !self.filters.is_manual_order();
                self.filters.use_manual_order();
                Outcome::TodosReordered {
                    moved: result.moved,
                    sort_reset,
                }
            }
        };

        debug!(?outcome, "command applied");
        Ok(outcome)
    }
}
