use colored::*;
use jiff::civil::Date;

use crate::models::{
    filter::{FilterSpec, StatusFilter},
    project::Project,
    todo::{Priority, Todo},
};

/// Characters of the UUID shown to identify a todo or project
pub const SHORT_ID_LEN: usize = 8;

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Leading characters of an id, enough to reference it on the command line
pub fn short_id(id: uuid::Uuid) -> String {
    id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

/// Get the appropriate status glyph for a todo
pub fn get_status_glyph(todo: &Todo, is_overdue: bool) -> ColoredString {
    if todo.completed {
        "✓".dimmed()
    } else if is_overdue {
        "●".red()
    } else {
        "○".normal()
    }
}

fn priority_label(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".blue(),
    }
}

/// Format a deadline relative to today (e.g., "Today", "Tomorrow", "Mar 01")
pub fn format_deadline(date: Date, today: Date) -> String {
    if date == today {
        "Today".to_string()
    } else if today.tomorrow().is_ok_and(|tomorrow| tomorrow == date) {
        "Tomorrow".to_string()
    } else if today.yesterday().is_ok_and(|yesterday| yesterday == date) {
        "Yesterday".to_string()
    } else if date.year() == today.year() {
        date.strftime("%b %d").to_string()
    } else {
        date.strftime("%b %d %Y").to_string()
    }
}

/// Right hand side of a todo line: deadline and tags
pub fn get_todo_context(todo: &Todo, today: Date) -> Option<String> {
    let mut parts = vec![];

    if let Some(deadline) = todo.deadline {
        let prefix = if todo.is_overdue(today) { "overdue " } else { "due " };
        parts.push(format!("{}{}", prefix, format_deadline(deadline, today)));
    }

    if !todo.tags.is_empty() {
        parts.push(
            todo.tags
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("  ·  "))
    }
}

/// Render a single todo line with id, glyph, title, priority and right-aligned context
pub fn render_todo_line(todo: &Todo, today: Date) {
    let terminal_width = get_terminal_width();
    let is_overdue = todo.is_overdue(today);

    let id_str = short_id(todo.id);
    let glyph = get_status_glyph(todo, is_overdue);
    let left_section = format!("  {}  {}  {}", id_str, glyph, todo.title);
    let styled_left = if todo.completed {
        left_section.dimmed()
    } else {
        left_section.bold()
    };
    let priority = priority_label(todo.priority);

    match get_todo_context(todo, today) {
        Some(context) => {
            let left_visible_len = format!("  {}  {}  {} {}", id_str, " ", todo.title, todo.priority)
                .chars()
                .count();
            let right_visible_len = context.chars().count();
            let total_content = left_visible_len + right_visible_len;
            let right = if is_overdue {
                context.red()
            } else {
                context.dimmed()
            };

            if total_content + 4 < terminal_width {
                let padding = terminal_width - total_content - 2;
                println!("{} {}{}{}", styled_left, priority, " ".repeat(padding), right);
            } else {
                // Not enough space for right alignment, just print normally
                println!("{} {}", styled_left, priority);
                println!("        {}", right);
            }
        }
        None => println!("{} {}", styled_left, priority),
    }

    if !todo.description.is_empty() {
        println!("        {}", todo.description.dimmed());
    }
}

/// Render a project with its todo counts
pub fn render_project_line(project: &Project, open: usize, total: usize, active: bool) {
    let marker = if active { "●".green() } else { "•".normal() };
    println!(
        "{} {}  {}",
        marker,
        project.name.bold(),
        short_id(project.id).dimmed()
    );
    if !project.description.is_empty() {
        println!("    {}", project.description);
    }
    println!(
        "    {}",
        format!("{open} open / {total} {}", if total == 1 { "todo" } else { "todos" }).dimmed()
    );
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let todo_word = if count == 1 { "todo" } else { "todos" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, todo_word);
}

/// Describe active filters (e.g., "active · high · #home · sorted by title asc")
pub fn describe_filters(filters: &FilterSpec) -> String {
    let mut parts = vec![];
    match filters.status {
        StatusFilter::All => {}
        StatusFilter::Active => parts.push(String::from("active")),
        StatusFilter::Completed => parts.push(String::from("completed")),
    }
    if let Some(priority) = filters.priority {
        parts.push(priority.to_string());
    }
    if !filters.tag.is_empty() {
        parts.push(format!("#{}", filters.tag));
    }
    if !filters.search.is_empty() {
        parts.push(format!("\"{}\"", filters.search));
    }
    parts.push(format!(
        "sorted by {} {}",
        filters.sort_field, filters.sort_order
    ));
    parts.join(" · ")
}

/// Render the distinct tags of a project
pub fn render_tags(tags: &[String]) {
    if tags.is_empty() {
        println!("No tags in this project");
        return;
    }
    for tag in tags {
        println!("  {}", format!("#{tag}").blue());
    }
}
