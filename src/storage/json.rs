use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::store::AppData,
    storage::{Storage, StorageError, decode_or_default, encode},
};

/// Number of rotated backups kept next to the data file
pub const DEFAULT_MAX_BACKUPS: usize = 5;

pub struct JsonFileStorage {
    path: PathBuf,
    max_backups: usize,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists || self.max_backups == 0 {
            return Ok(0);
        }

        let backups_dir = self.get_backup_dir();
        fs::create_dir_all(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;

        let backup_path = self.get_backup_path();
        fs::copy(&self.path, &backup_path).map_err(|e| StorageError::BackupFailed {
            path: backup_path,
            source: e,
        })
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let prefix = self.backup_prefix();
        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        // Backup names embed a zero-padded timestamp, so name order is age order
        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(self.max_backups);
        if number_of_files_to_delete == 0 {
            return Ok(());
        }

        for file_path in &file_entries[0..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        debug!(removed = number_of_files_to_delete, "pruned old backups");
        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn backup_prefix(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("data"));
        format!("{file_name}-")
    }

    fn get_backup_path(&self) -> PathBuf {
        let nanos = jiff::Timestamp::now().as_nanosecond();
        let filename = format!("{}{:020}", self.backup_prefix(), nanos);

        self.get_backup_dir().join(filename)
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<AppData, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let data = decode_or_default(&content, &self.path)?;
                debug!(
                    path = %self.path.display(),
                    projects = data.projects.len(),
                    todos = data.todos.len(),
                    "loaded data"
                );
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no data file yet, starting empty");
                Ok(AppData::default())
            }
            Err(e) => Err(StorageError::LoadFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, data: &AppData) -> Result<(), StorageError> {
        let json = encode(data)?;

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(
            path = %self.path.display(),
            projects = data.projects.len(),
            todos = data.todos.len(),
            "saved data"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{Clock, ManualClock, new_id};
    use crate::models::{project::Project, store::CURRENT_VERSION, todo::NewTodo};

    fn sample_data() -> AppData {
        let clock = ManualClock::ticking();
        let mut data = AppData::default();
        let project_id = data
            .add_project(Project::new(
                new_id(),
                String::from("Some Project"),
                String::new(),
                clock.now(),
            ))
            .id;
        data.add_todo(
            new_id(),
            Some(project_id),
            NewTodo {
                title: String::from("Some Todo"),
                ..NewTodo::default()
            },
            clock.now(),
        )
        .unwrap();
        data
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));
        let data = sample_data();

        storage.save(&data).unwrap();

        assert_eq!(storage.load().unwrap(), data);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));

        assert_eq!(storage.load().unwrap(), AppData::default());
    }

    #[test]
    fn test_load_invalid_json_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let storage = JsonFileStorage::new(path);

        assert_eq!(storage.load().unwrap(), AppData::default());
    }

    #[test]
    fn test_load_legacy_record_without_version_or_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let old_json = r#"{
            "projects": [{
                "id": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                "name": "Work",
                "description": "",
                "createdAt": "2025-01-01T09:00:00Z",
                "updatedAt": "2025-01-01T09:00:00Z"
            }],
            "todos": [
                {
                    "id": "0b6e3f3a-1d0e-4c44-a1a3-7b1c4d2e9f00",
                    "projectId": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                    "title": "First",
                    "description": "",
                    "completed": false,
                    "priority": "high",
                    "deadline": null,
                    "tags": [],
                    "createdAt": "2025-01-01T10:00:00Z",
                    "updatedAt": "2025-01-01T10:00:00Z"
                },
                {
                    "id": "7c2a9d55-0e43-4a8e-9a0b-51f4f0d6a2b7",
                    "projectId": "5f8d0f5e-8f5a-4f39-9a53-2d3c5f0b8c11",
                    "title": "Second",
                    "description": "",
                    "completed": true,
                    "priority": "low",
                    "deadline": "2025-03-01",
                    "tags": ["home"],
                    "createdAt": "2025-01-01T11:00:00Z",
                    "updatedAt": "2025-01-01T12:00:00Z"
                }
            ]
        }"#;
        fs::write(&path, old_json).unwrap();

        let data = JsonFileStorage::new(path).load().unwrap();

        assert_eq!(data.version, CURRENT_VERSION);
        assert_eq!(data.todos[0].position, 0);
        assert_eq!(data.todos[1].position, 1);
        assert!(data.todos[1].completed);
    }

    #[test]
    fn test_load_future_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        let future_json = r#"{
            "version": 999,
            "projects": [],
            "todos": []
        }"#;
        fs::write(&path, future_json).unwrap();

        let result = JsonFileStorage::new(path).load();

        assert!(matches!(result, Err(StorageError::FutureVersion(999))));
    }

    #[test]
    fn test_backup_creation_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));

        let mut data = sample_data();
        for i in 1..=7 {
            data.projects[0].description = format!("revision {i}");
            storage.save(&data).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let backup_count = fs::read_dir(dir.path().join("backups"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count();

        assert_eq!(backup_count, DEFAULT_MAX_BACKUPS, "Should keep exactly 5 backups");
        assert_eq!(
            storage.load().unwrap().projects[0].description,
            "revision 7"
        );
    }

    #[test]
    fn test_backup_directory_created_on_second_save() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json"));
        let backups_dir = dir.path().join("backups");

        storage.save(&AppData::default()).unwrap();
        assert!(
            !backups_dir.exists(),
            "Backups dir should not exist after first save"
        );

        storage.save(&sample_data()).unwrap();
        assert!(backups_dir.is_dir(), "Backups dir should be created on second save");
    }

    #[test]
    fn test_no_backups_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("store.json")).with_max_backups(0);

        storage.save(&AppData::default()).unwrap();
        storage.save(&sample_data()).unwrap();

        assert!(!dir.path().join("backups").exists());
    }
}
