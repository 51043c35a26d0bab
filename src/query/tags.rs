use std::collections::BTreeSet;

use crate::models::todo::Todo;

/// Distinct tags used by `todos`, in lexicographic order
pub fn all_tags<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> Vec<String> {
    todos
        .into_iter()
        .flat_map(|t| t.tags.iter())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}
