//! Derives the visible todo list from the full collection and a [`FilterSpec`].

use std::cmp::Ordering;

use uuid::Uuid;

use crate::models::{
    filter::{FilterSpec, SortField, SortOrder, StatusFilter},
    todo::Todo,
};

pub mod tags;

/// Todos of `active_project_id` that pass every criterion of `filters`, in the
/// requested order. With no active project the result is empty.
///
/// The sort is stable, so todos with equal keys keep their stored order.
pub fn filter_todos<'a>(
    todos: &'a [Todo],
    active_project_id: Option<Uuid>,
    filters: &FilterSpec,
) -> Vec<&'a Todo> {
    let Some(project_id) = active_project_id else {
        return vec![];
    };

    let search = filters.search.to_lowercase();

    let mut visible: Vec<&Todo> = todos
        .iter()
        .filter(|t| t.project_id == project_id)
        .filter(|t| matches_status(t, filters.status))
        .filter(|t| filters.priority.is_none_or(|p| t.priority == p))
        .filter(|t| filters.tag.is_empty() || t.tags.iter().any(|tag| *tag == filters.tag))
        .filter(|t| search.is_empty() || matches_search(t, &search))
        .collect();

    visible.sort_by(|a, b| {
        let ordering = compare_by(a, b, filters.sort_field);
        match filters.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    visible
}

fn matches_status(todo: &Todo, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Active => !todo.completed,
        StatusFilter::Completed => todo.completed,
    }
}

/// `query` must already be lowercased
fn matches_search(todo: &Todo, query: &str) -> bool {
    todo.title.to_lowercase().contains(query) || todo.description.to_lowercase().contains(query)
}

/// Ascending comparison of two todos on a single field
pub fn compare_by(a: &Todo, b: &Todo, field: SortField) -> Ordering {
    match field {
        SortField::Position => a.position.cmp(&b.position),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        // A missing deadline sorts after every real one
        SortField::Deadline => match (a.deadline, b.deadline) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortField::Title => compare_titles(&a.title, &b.title),
    }
}

/// Case-insensitive ordering, falling back to the raw strings to keep it total
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
