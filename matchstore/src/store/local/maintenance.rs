use crate::codec::{format_timestamp, DecodeReport};
use crate::common::util::current_file_name_timestamp;
use crate::common::{
    COLLECTION_FILE_EXTENSION, EXPORT_DATABASE_NAME, EXPORT_FILE_PREFIX, EXPORT_FORMAT_VERSION,
    FULL_BACKUP_PREFIX, PRE_IMPORT_BACKUP_PREFIX,
};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::local::persistence::{
    decode_collection, encode_collection, read_json, unique_file, write_json_atomic,
};
use crate::store::local::store::ReplacedCollection;
use crate::store::local::validation::validate_collection;
use crate::store::local::LocalStore;
use crate::store::{validate_collection_name, StoreAdministration, StoreEvent, StoreStats};
use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Portable dump of a local data directory.
///
/// ```json
/// {
///   "version": "1.0.0",
///   "exportDate": "2024-05-01T10:22:03.125Z",
///   "database": "local",
///   "collections": { "users": { "<id>": { ... } } }
/// }
/// ```
///
/// Collections are in the same encoded form as the collection files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    pub export_date: String,
    pub database: String,
    pub collections: Map<String, serde_json::Value>,
}

/// A file in the backup directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

impl LocalStore {
    /// Lists every collection: the ones in memory plus any collection file in
    /// the data directory that has not been loaded yet. Sorted by name.
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let mut names = self.loaded_collections();
        for entry in fs::read_dir(self.config().data_dir())? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_collection_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names.into_iter().sorted().dedup().collect())
    }

    /// Encodes every collection to `{ name: { id: document } }`.
    fn snapshot(&self) -> StoreResult<Map<String, serde_json::Value>> {
        let mut snapshot = Map::new();
        for name in self.collection_names()? {
            let handle = self.collection(&name)?;
            let documents = handle.read();
            snapshot.insert(name, encode_collection(&documents));
        }
        Ok(snapshot)
    }

    fn write_snapshot(&self, prefix: &str) -> StoreResult<PathBuf> {
        let backup_dir = self.config().backup_dir();
        fs::create_dir_all(&backup_dir)?;
        let path = unique_file(
            &backup_dir,
            &format!("{}-{}", prefix, current_file_name_timestamp()),
        );
        let snapshot = self.snapshot()?;
        write_json_atomic(&path, &serde_json::Value::Object(snapshot))?;
        Ok(path)
    }

    /// Decodes `{ name: { id: document } }` without touching the store.
    fn decode_snapshot(
        &self,
        collections: &Map<String, serde_json::Value>,
    ) -> StoreResult<Vec<ReplacedCollection>> {
        let mut replaced = Vec::with_capacity(collections.len());
        for (name, content) in collections {
            validate_collection_name(name)?;
            let mut report = DecodeReport::new();
            let documents = decode_collection(content, name, &mut report)?;
            replaced.push(ReplacedCollection {
                name: name.clone(),
                documents,
                fallbacks: report.into_fallbacks(),
            });
        }
        Ok(replaced)
    }

    /// Writes an [ExportEnvelope] of every collection to `target`, or to
    /// `matchstore-export-<timestamp>.json` in the current directory.
    pub fn export_data(&self, target: Option<&Path>) -> StoreResult<PathBuf> {
        let path = match target {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(format!(
                "{}-{}.{}",
                EXPORT_FILE_PREFIX,
                current_file_name_timestamp(),
                COLLECTION_FILE_EXTENSION
            )),
        };

        let envelope = ExportEnvelope {
            version: EXPORT_FORMAT_VERSION.to_string(),
            export_date: format_timestamp(&Utc::now()),
            database: EXPORT_DATABASE_NAME.to_string(),
            collections: self.snapshot()?,
        };
        write_json_atomic(&path, &serde_json::to_value(&envelope)?)?;
        log::info!("Data exported to: {}", path.display());
        Ok(path)
    }

    /// Loads an [ExportEnvelope] and replaces the collections it contains.
    ///
    /// The file is fully decoded before anything changes, then a
    /// `pre-import-backup` snapshot is taken. Collections not present in
    /// the file are left alone. Returns the names of the imported
    /// collections. Refused in production mode.
    pub fn import_data(&self, source: &Path) -> StoreResult<Vec<String>> {
        self.ensure_not_production("Data import")?;
        if !source.exists() {
            return Err(StoreError::new(
                &format!("Import file not found: {}", source.display()),
                ErrorKind::FileNotFound,
            ));
        }

        let json = read_json(source)?;
        let collections = json
            .get("collections")
            .and_then(|c| c.as_object())
            .ok_or_else(|| {
                StoreError::new(
                    "Invalid import file format: missing 'collections' object",
                    ErrorKind::EncodingError,
                )
            })?;
        let replaced = self.decode_snapshot(collections)?;

        let backup = self.write_snapshot(PRE_IMPORT_BACKUP_PREFIX)?;
        log::info!("Pre-import backup created: {}", backup.display());

        let names: Vec<String> = replaced.iter().map(|c| c.name.clone()).collect();
        for collection in &replaced {
            log::info!(
                "Importing {}: {} documents",
                collection.name,
                collection.documents.len()
            );
        }
        self.replace_collections(replaced)?;
        log::info!("Import completed from {}", source.display());
        Ok(names)
    }

    /// Lists the `*.json` files of the backup directory, newest first.
    pub fn list_backups(&self) -> StoreResult<Vec<BackupFile>> {
        let backup_dir = self.config().backup_dir();
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_FILE_EXTENSION) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupFile {
                path,
                modified: metadata.modified()?,
                size: metadata.len(),
            });
        }
        backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
        Ok(backups)
    }

    /// Deletes all but the `keep` most recent backups and returns the paths
    /// removed.
    pub fn cleanup_backups(&self, keep: usize) -> StoreResult<Vec<PathBuf>> {
        let backups = self.list_backups()?;
        if backups.len() <= keep {
            log::info!("{} backups found, no cleanup needed", backups.len());
            return Ok(Vec::new());
        }

        let mut removed = Vec::with_capacity(backups.len() - keep);
        for backup in backups.into_iter().skip(keep) {
            fs::remove_file(&backup.path)?;
            log::info!("Deleted old backup: {}", backup.path.display());
            removed.push(backup.path);
        }
        log::info!("Cleanup completed, kept {} most recent backups", keep);
        Ok(removed)
    }
}

impl StoreAdministration for LocalStore {
    fn stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats::new();
        for name in self.collection_names()? {
            let handle = self.collection(&name)?;
            let count = handle.read().len();
            stats.insert(name, count);
        }
        Ok(stats)
    }

    fn validate_database(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let names = match self.collection_names() {
            Ok(names) => names,
            Err(e) => {
                issues.push(format!("Unable to list collections: {}", e));
                self.loaded_collections()
            }
        };

        for name in names {
            match self.collection(&name) {
                Ok(handle) => {
                    let documents = handle.read();
                    validate_collection(&name, &documents, &self.fallbacks_of(&name), &mut issues);
                }
                Err(e) => issues.push(format!("Unable to load collection {}: {}", name, e)),
            }
        }

        if issues.is_empty() {
            log::info!("Database validation passed");
        } else {
            log::warn!("Database validation found {} issues:", issues.len());
            for issue in &issues {
                log::warn!("  - {}", issue);
            }
        }
        issues
    }

    fn create_full_backup(&self) -> StoreResult<PathBuf> {
        let path = self.write_snapshot(FULL_BACKUP_PREFIX).map_err(|e| {
            log::error!("Failed to create full backup: {}", e);
            e
        })?;
        log::info!("Full backup created: {}", path.display());
        self.emit(StoreEvent::BackupCreated { path: path.clone() });
        Ok(path)
    }

    fn restore_from_backup(&self, path: &Path) -> StoreResult<()> {
        self.ensure_not_production("Backup restoration")?;

        let json = read_json(path)?;
        let collections = json.as_object().ok_or_else(|| {
            StoreError::new(
                &format!("Backup {} is not a JSON object", path.display()),
                ErrorKind::EncodingError,
            )
        })?;
        let replaced = self.decode_snapshot(collections)?;

        self.create_full_backup()?;

        let names: Vec<String> = replaced.iter().map(|c| c.name.clone()).collect();
        self.replace_collections(replaced)?;
        log::info!("Database restored from backup: {}", path.display());
        self.emit(StoreEvent::Restored {
            path: path.to_path_buf(),
            collections: names,
        });
        Ok(())
    }

    fn clear_all_data(&self) -> StoreResult<()> {
        self.ensure_not_production("Clearing all data")?;

        self.create_full_backup()?;
        let emptied = self
            .collection_names()?
            .into_iter()
            .map(|name| ReplacedCollection {
                name,
                documents: Default::default(),
                fallbacks: Vec::new(),
            })
            .collect();
        self.replace_collections(emptied)?;
        log::info!("All data cleared from local store");
        self.emit(StoreEvent::Cleared);
        Ok(())
    }
}
