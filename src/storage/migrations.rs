use std::path::Path;

use serde_json::Value;

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Returns 1 if version field is missing (the legacy unversioned layout)
pub fn detect_version(value: &Value, origin: &Path) -> Result<u32, StorageError> {
    match value.get("version") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::InvalidVersion {
                path: origin.to_path_buf(),
                found: v.to_string(),
            }),
        None => Ok(1),
    }
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let migration_idx = version.checked_sub(1).map(|i| i as usize); // v1→v2 is at index 0

        let Some(migration) = migration_idx.and_then(|i| migrations.get(i)) else {
            return Err(StorageError::UnsupportedVersion(version));
        };

        data = migration(data)?;
    }

    Ok(data)
}

/// Legacy records have no `position` on their todos: each one takes its index
/// in stored order.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, StorageError> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".to_string(), Value::from(2));

        if let Some(todos) = obj.get_mut("todos").and_then(|t| t.as_array_mut()) {
            for (index, todo) in todos.iter_mut().enumerate() {
                if let Some(todo_obj) = todo.as_object_mut()
                    && todo_obj.get("position").is_none_or(Value::is_null)
                {
                    todo_obj.insert("position".to_string(), Value::from(index));
                }
            }
        }
    }

    Ok(value)
}
