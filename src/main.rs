use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tdo_manager::{
    config::Config,
    models::{
        filter::{FilterSpec, SortField, SortOrder, StatusFilter},
        todo::Priority,
    },
    services::{
        app::{App, Command, Outcome},
        projects::{CreateProjectParameters, DeleteProjectParameters, UpdateProjectParameters},
        todos::{
            AddTodoParameters, DeleteTodoParameters, ReorderTodosParameters, ToggleTodoParameters,
            UpdateTodoParameters,
        },
    },
    storage::{Storage, json::JsonFileStorage},
    ui,
};

#[derive(Parser)]
#[command(
    name = "tdo-manager",
    about = "Projects and todos with priorities, deadlines, tags and manual ordering"
)]
struct Cli {
    /// Data file to use instead of the default location
    #[arg(long, global = true, env = "TDO_MANAGER_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Project to work in (name or id prefix, case-insensitive)
    #[arg(short, long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List todos of the project (default)
    List(ListArgs),

    /// Add a new todo to the project
    Add {
        /// Todo title
        title: String,

        /// Add a description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Priority: high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Add tags (can be used multiple times)
        #[arg(short, long, action = clap::ArgAction::Append)]
        tag: Vec<String>,
    },

    /// Edit a todo
    Edit {
        /// Todo id prefix
        todo: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<Priority>,

        /// New deadline (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,

        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,

        /// Replace the tags (can be used multiple times)
        #[arg(short, long, action = clap::ArgAction::Append, conflicts_with = "clear_tags")]
        tag: Vec<String>,

        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },

    /// Toggle a todo between open and completed
    Done { todo: String },

    /// Delete a todo
    Delete { todo: String },

    /// Move a todo to the slot of another one (switches the list to manual order)
    Move {
        /// Todo to move
        todo: String,
        /// Todo whose slot it takes
        onto: String,
    },

    /// List the tags used in the project
    Tags,

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(Args, Default)]
struct ListArgs {
    /// all, active or completed
    #[arg(long)]
    status: Option<StatusFilter>,

    /// Only show this priority
    #[arg(long)]
    priority: Option<Priority>,

    /// Only show todos with this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Case-insensitive text to look for in title and description
    #[arg(short, long)]
    search: Option<String>,

    /// position, createdAt, updatedAt, priority, deadline or title
    #[arg(long)]
    sort: Option<SortField>,

    /// asc or desc
    #[arg(long)]
    order: Option<SortOrder>,
}

#[derive(Debug, Subcommand)]
enum ProjectCommands {
    /// Create a new project
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename or describe a project
    Edit {
        /// Project name or id prefix
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a project and all of its todos
    Delete { project: String },
    /// List all projects
    List,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Finds a project by id prefix or case-insensitive name
fn resolve_project<S: Storage>(app: &App<S>, query: &str) -> Result<Uuid, String> {
    let query_lower = query.to_lowercase();

    if let Some(project) = app
        .projects()
        .iter()
        .find(|p| p.name.to_lowercase() == query_lower)
    {
        return Ok(project.id);
    }

    let matching: Vec<_> = app
        .projects()
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query_lower)
                || p.id.simple().to_string().starts_with(&query_lower)
        })
        .collect();

    match matching.len() {
        0 => {
            let mut message = format!("Project '{}' not found", query);
            if !app.projects().is_empty() {
                message.push_str("\n\nAvailable projects:");
                for project in app.projects() {
                    message.push_str(&format!("\n  - {}", project.name));
                }
            }
            Err(message)
        }
        1 => Ok(matching[0].id),
        _ => {
            let names: Vec<_> = matching.iter().map(|p| p.name.as_str()).collect();
            Err(format!(
                "Project name is ambiguous. Multiple projects found: {}",
                names.join(", ")
            ))
        }
    }
}

/// Finds a todo of the active project by id prefix
fn resolve_todo<S: Storage>(app: &App<S>, prefix: &str) -> Result<Uuid, String> {
    let prefix = prefix.trim_start_matches('#').to_lowercase();
    let Some(project_id) = app.active_project_id() else {
        return Err(String::from(
            "No project selected. Use --project <name> to pick one.",
        ));
    };

    let matching: Vec<_> = app
        .data()
        .get_todos_for_project(project_id)
        .filter(|t| t.id.simple().to_string().starts_with(&prefix))
        .collect();

    match matching.len() {
        0 => Err(format!("Todo '{}' not found", prefix)),
        1 => Ok(matching[0].id),
        _ => {
            let titles: Vec<_> = matching.iter().map(|t| t.title.as_str()).collect();
            Err(format!(
                "Todo id is ambiguous. Multiple todos found: {}",
                titles.join(", ")
            ))
        }
    }
}

fn run<S: Storage>(app: &mut App<S>, command: Command) -> Outcome {
    app.dispatch(command).unwrap_or_else(|e| fail(e))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_file);

    // Create parent directory if it doesn't exist
    if let Some(parent) = config.data_file.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            fail(format!("Failed to create data directory: {}", e));
        });
    }

    let storage = JsonFileStorage::new(config.data_file).with_max_backups(config.max_backups);
    let mut app = App::open(storage).unwrap_or_else(|e| fail(format!("Failed to load data: {}", e)));

    // Select the requested project, or the only one when there is exactly one
    let selected = match &cli.project {
        Some(query) => Some(resolve_project(&app, query).unwrap_or_else(|e| fail(e))),
        None if app.projects().len() == 1 => Some(app.projects()[0].id),
        None => None,
    };
    if let Err(e) = app.set_active_project(selected) {
        fail(e);
    }

    let today = jiff::Zoned::now().date();

    match cli.command.unwrap_or(Commands::List(ListArgs::default())) {
        Commands::List(args) => {
            let Some(project) = app.active_project() else {
                if app.projects().is_empty() {
                    println!("No projects yet. Create one with `tdo-manager project new <name>`.");
                } else {
                    println!("Pick a project with --project <name>:");
                    for project in app.projects() {
                        println!("  - {}", project.name);
                    }
                }
                return;
            };
            let project_name = project.name.clone();

            let defaults = FilterSpec::default();
            app.set_filters(FilterSpec {
                status: args.status.unwrap_or(defaults.status),
                priority: args.priority,
                tag: args.tag.unwrap_or_default(),
                search: String::new(),
                sort_field: args.sort.unwrap_or(defaults.sort_field),
                sort_order: args.order.unwrap_or(defaults.sort_order),
            });
            if let Some(search) = args.search {
                app.input_search(search, Instant::now());
                app.commit_search();
            }

            let todos = app.filtered_todos();
            if todos.is_empty() {
                println!("No todos in '{}' ({})", project_name, ui::describe_filters(app.filters()));
            } else {
                ui::render_view_header(&project_name, todos.len());
                println!("  {}\n", ui::describe_filters(app.filters()).dimmed());
                for todo in todos {
                    ui::render_todo_line(todo, today);
                }
                println!();
            }
        }
        Commands::Add {
            title,
            description,
            priority,
            deadline,
            tag,
        } => {
            let params = AddTodoParameters {
                title,
                description,
                priority,
                deadline,
                tags: tag,
            };

            if let Outcome::TodoAdded(todo) = run(&mut app, Command::AddTodo(params)) {
                println!("✓ Todo added: {}", todo.title);
                println!("  #{}", ui::short_id(todo.id));
                if let Some(project) = app.active_project() {
                    println!("  Project: {}", project.name);
                }
            }
        }
        Commands::Edit {
            todo,
            title,
            description,
            priority,
            deadline,
            clear_deadline,
            tag,
            clear_tags,
        } => {
            let id = resolve_todo(&app, &todo).unwrap_or_else(|e| fail(e));
            let tags = if clear_tags {
                Some(vec![])
            } else if tag.is_empty() {
                None
            } else {
                Some(tag)
            };
            let params = UpdateTodoParameters {
                id,
                title,
                description,
                priority,
                deadline: if clear_deadline { Some(String::new()) } else { deadline },
                tags,
                completed: None,
            };

            if let Outcome::TodoUpdated(todo) = run(&mut app, Command::UpdateTodo(params)) {
                println!("✓ Todo updated: {}", todo.title);
            }
        }
        Commands::Done { todo } => {
            let id = resolve_todo(&app, &todo).unwrap_or_else(|e| fail(e));
            if let Outcome::TodoToggled(todo) =
                run(&mut app, Command::ToggleTodo(ToggleTodoParameters { id }))
            {
                if todo.completed {
                    println!("✓ Todo completed: {}", todo.title);
                } else {
                    println!("○ Todo reopened: {}", todo.title);
                }
            }
        }
        Commands::Delete { todo } => {
            let id = resolve_todo(&app, &todo).unwrap_or_else(|e| fail(e));
            if let Outcome::TodoDeleted(todo) =
                run(&mut app, Command::DeleteTodo(DeleteTodoParameters { id }))
            {
                println!("✓ Todo deleted: {}", todo.title);
            }
        }
        Commands::Move { todo, onto } => {
            let dragged_id = resolve_todo(&app, &todo).unwrap_or_else(|e| fail(e));
            let target_id = resolve_todo(&app, &onto).unwrap_or_else(|e| fail(e));

            let outcome = run(
                &mut app,
                Command::ReorderTodos(ReorderTodosParameters {
                    dragged_id,
                    target_id,
                }),
            );
            if let Outcome::TodosReordered { moved, .. } = outcome {
                println!("✓ Moved ({} {} renumbered)", moved, if moved == 1 { "todo" } else { "todos" });
                let todos = app.filtered_todos();
                if let Some(project) = app.active_project() {
                    ui::render_view_header(&project.name, todos.len());
                }
                for todo in todos {
                    ui::render_todo_line(todo, today);
                }
            }
        }
        Commands::Tags => {
            if app.active_project().is_none() {
                fail("No project selected. Use --project <name> to pick one.");
            }
            ui::render_tags(&app.all_tags());
        }
        Commands::Project(ProjectCommands::New { name, description }) => {
            let params = CreateProjectParameters { name, description };
            if let Outcome::ProjectAdded(project) = run(&mut app, Command::AddProject(params)) {
                println!("✓ Project created: {}", project.name);
                println!("  #{}", ui::short_id(project.id));
            }
        }
        Commands::Project(ProjectCommands::Edit {
            project,
            name,
            description,
        }) => {
            let id = resolve_project(&app, &project).unwrap_or_else(|e| fail(e));
            let Some(current) = app.data().get_project(id).cloned() else {
                fail(format!("Project '{}' not found", project));
            };
            let params = UpdateProjectParameters {
                id,
                name: name.unwrap_or(current.name),
                description: description.unwrap_or(current.description),
            };
            if let Outcome::ProjectUpdated(project) = run(&mut app, Command::UpdateProject(params))
            {
                println!("✓ Project updated: {}", project.name);
            }
        }
        Commands::Project(ProjectCommands::Delete { project }) => {
            let id = resolve_project(&app, &project).unwrap_or_else(|e| fail(e));
            if let Outcome::ProjectDeleted { result, .. } =
                run(&mut app, Command::DeleteProject(DeleteProjectParameters { id }))
            {
                println!("✓ Project deleted: {}", result.project.name);
                if result.cascaded_todos_count > 0 {
                    println!(
                        "  {} {} deleted with it",
                        result.cascaded_todos_count,
                        if result.cascaded_todos_count == 1 {
                            "todo"
                        } else {
                            "todos"
                        }
                    );
                }
            }
        }
        Commands::Project(ProjectCommands::List) => {
            let mut projects: Vec<_> = app.projects().iter().collect();

            if projects.is_empty() {
                println!("No projects found");
            } else {
                // Sort alphabetically by name (case-insensitive)
                projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

                println!(
                    "{} ({} {})\n",
                    "PROJECTS".cyan(),
                    projects.len(),
                    if projects.len() == 1 {
                        "project"
                    } else {
                        "projects"
                    }
                );

                for project in projects {
                    let todos: Vec<_> = app.data().get_todos_for_project(project.id).collect();
                    let open = todos.iter().filter(|t| !t.completed).count();
                    let active = app.active_project_id() == Some(project.id);
                    ui::render_project_line(project, open, todos.len(), active);
                    println!("    {}", "─".repeat(30).dimmed());
                    println!();
                }
            }
        }
    }
}
