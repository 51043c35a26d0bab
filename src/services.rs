use crate::{
    models::store::AppData,
    storage::{Storage, StorageError},
};

pub mod app;
pub mod debounce;
pub mod projects;
pub mod todos;

/// Applies `mutate` to a copy of the snapshot, persists the copy and only then
/// swaps it in. On any error `store` is left exactly as it was.
pub(crate) fn commit<T, E>(
    store: &mut AppData,
    storage: &impl Storage,
    mutate: impl FnOnce(&mut AppData) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StorageError>,
{
    let mut next = store.clone();
    let value = mutate(&mut next)?;

    if next != *store {
        storage.save(&next)?;
        *store = next;
    }

    Ok(value)
}

/// Trims a user supplied name, rejecting names that are blank
pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
