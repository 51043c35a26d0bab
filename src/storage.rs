use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::models::store::{AppData, CURRENT_VERSION};
use crate::storage::migrations::{apply_migrations, detect_version};

pub mod json;
pub mod memory;
pub mod migrations;

/// Name of the durable slot holding the serialized [`AppData`]
pub const STORAGE_KEY: &str = "tdo-manager-data";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load data from '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Data in '{path}' has an invalid version field: {found}")]
    InvalidVersion { path: PathBuf, found: String },

    #[error("Failed to save data to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Data file was created by a newer version of tdo-manager (version {0}). Please upgrade tdo-manager to open this file."
    )]
    FutureVersion(u32),

    #[error("Data file has unsupported version {0}. This version of tdo-manager cannot read this file.")]
    UnsupportedVersion(u32),
}

pub trait Storage {
    fn load(&self) -> Result<AppData, StorageError>;
    fn save(&self, data: &AppData) -> Result<(), StorageError>;
}

/// Parses a stored record, migrating it to [`CURRENT_VERSION`]
pub fn decode(content: &str, origin: &Path) -> Result<AppData, StorageError> {
    let mut value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| StorageError::ParseFailed {
            path: origin.to_path_buf(),
            source: e,
        })?;

    let version = detect_version(&value, origin)?;
    if version > CURRENT_VERSION {
        return Err(StorageError::FutureVersion(version));
    }
    if version < CURRENT_VERSION {
        value = apply_migrations(value, version, CURRENT_VERSION)?;
    }

    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
    }

    serde_json::from_value(value).map_err(|e| StorageError::ParseFailed {
        path: origin.to_path_buf(),
        source: e,
    })
}

/// Like [`decode`], but malformed content yields an empty data set.
///
/// Records written by a newer version are still refused so they are never
/// overwritten by an empty default.
pub fn decode_or_default(content: &str, origin: &Path) -> Result<AppData, StorageError> {
    match decode(content, origin) {
        Ok(data) => Ok(data),
        Err(e @ (StorageError::FutureVersion(_) | StorageError::UnsupportedVersion(_))) => Err(e),
        Err(e) => {
            warn!(path = %origin.display(), error = %e, "stored data is malformed, starting empty");
            Ok(AppData::default())
        }
    }
}

pub fn encode(data: &AppData) -> Result<String, StorageError> {
    serde_json::to_string_pretty(data).map_err(|e| StorageError::SerializeFailed { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_or_default_on_garbage() {
        let data = decode_or_default("{ not json", Path::new("<test>")).unwrap();
        assert_eq!(data, AppData::default());

        let data = decode_or_default("null", Path::new("<test>")).unwrap();
        assert_eq!(data, AppData::default());

        let data = decode_or_default(r#"{"projects": 3, "todos": []}"#, Path::new("<test>")).unwrap();
        assert_eq!(data, AppData::default());
    }

    #[test]
    fn test_decode_or_default_refuses_future_versions() {
        let result = decode_or_default(
            r#"{"version": 999, "projects": [], "todos": []}"#,
            Path::new("<test>"),
        );
        assert!(matches!(result, Err(StorageError::FutureVersion(999))));
    }

    #[test]
    fn test_encode_then_decode_is_fixed_point() {
        let content = r#"{
            "version": 2,
            "projects": [{
                "id": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "name": "Work",
                "description": "",
                "createdAt": "2025-01-01T09:00:00Z",
                "updatedAt": "2025-01-02T09:00:00Z"
            }],
            "todos": [{
                "id": "0b6e3f3a-1d0e-4c44-a1a3-7b1c4d2e9f00",
                "projectId": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "title": "Buy milk",
                "description": "",
                "completed": false,
                "priority": "low",
                "deadline": "2025-02-01",
                "tags": ["errand"],
                "position": 0,
                "createdAt": "2025-01-01T10:00:00Z",
                "updatedAt": "2025-01-01T10:00:00Z"
            }]
        }"#;

        let loaded = decode(content, Path::new("<test>")).unwrap();
        let reloaded = decode(&encode(&loaded).unwrap(), Path::new("<test>")).unwrap();

        assert_eq!(loaded, reloaded);
        assert_eq!(reloaded.todos[0].tags, vec![String::from("errand")]);
    }

    #[test]
    fn test_legacy_record_with_timestamp_deadlines_is_kept() {
        let content = r#"{
            "projects": [{
                "id": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "name": "Home",
                "description": "Chores",
                "createdAt": "2025-01-01T09:00:00.000Z",
                "updatedAt": "2025-01-01T09:00:00.000Z"
            }],
            "todos": [{
                "id": "0b6e3f3a-1d0e-4c44-a1a3-7b1c4d2e9f00",
                "projectId": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "title": "Pay rent",
                "description": "",
                "completed": false,
                "priority": "high",
                "deadline": "2025-03-01T00:00:00.000Z",
                "tags": ["bills"],
                "createdAt": "2025-01-02T08:15:30.123Z",
                "updatedAt": "2025-01-02T08:15:30.123Z"
            }, {
                "id": "7c2a9e11-3b4f-4d5e-8f60-1a2b3c4d5e6f",
                "projectId": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "title": "Water plants",
                "description": "",
                "completed": true,
                "priority": "low",
                "deadline": null,
                "tags": [],
                "createdAt": "2025-01-03T08:15:30.123Z",
                "updatedAt": "2025-01-04T08:15:30.123Z"
            }]
        }"#;

        let data = decode_or_default(content, Path::new("<test>")).unwrap();

        assert_eq!(data.version, CURRENT_VERSION);
        assert_eq!(data.projects.len(), 1);
        assert_eq!(data.todos.len(), 2);
        assert_eq!(data.todos[0].deadline, Some("2025-03-01".parse().unwrap()));
        assert_eq!(data.todos[1].deadline, None);
        assert_eq!(
            data.todos.iter().map(|t| t.position).collect::<Vec<_>>(),
            vec![0, 1]
        );

        let saved: serde_json::Value = serde_json::from_str(&encode(&data).unwrap()).unwrap();
        assert_eq!(saved["todos"][0]["deadline"], serde_json::json!("2025-03-01"));
    }

    #[test]
    fn test_encode_uses_camel_case_literals() {
        let content = encode(&AppData::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["version"], serde_json::json!(CURRENT_VERSION));
        assert!(value["projects"].is_array());
        assert!(value["todos"].is_array());
    }
}
