use crate::codec::{decode_document_at, encode_document, DecodeReport, TimestampFallback};
use crate::common::util::current_file_name_timestamp;
use crate::common::{COLLECTION_FILE_EXTENSION, TEMP_FILE_SUFFIX};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::DocumentMap;
use serde_json::Map;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result of reading one collection file.
#[derive(Debug, Default)]
pub(crate) struct LoadedCollection {
    pub(crate) documents: DocumentMap,
    pub(crate) fallbacks: Vec<TimestampFallback>,
    /// Set when the file was unreadable and copied to the backup directory.
    pub(crate) quarantined: Option<PathBuf>,
}

pub(crate) fn collection_file(data_dir: &Path, collection: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", collection, COLLECTION_FILE_EXTENSION))
}

fn temp_file(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

/// Loads a collection file.
///
/// A missing file is an empty collection. A file that is not a JSON object
/// of JSON objects is copied to `backup_dir` as
/// `<collection>-error-<timestamp>.json` and the collection starts empty,
/// even when that copy cannot be made. Only a failure to read the file at
/// all is returned as an error.
pub(crate) fn load_collection(
    data_dir: &Path,
    backup_dir: &Path,
    collection: &str,
) -> StoreResult<LoadedCollection> {
    let path = collection_file(data_dir, collection);
    if !path.exists() {
        log::debug!("Collection {} has no file yet, starting empty", collection);
        return Ok(LoadedCollection::default());
    }

    let bytes = fs::read(&path)?;
    match parse_collection(&bytes, collection) {
        Ok(loaded) => {
            log::info!(
                "Loaded {} documents from {}",
                loaded.documents.len(),
                collection
            );
            Ok(loaded)
        }
        Err(e) => {
            log::warn!("Error loading {}: {}", collection, e);
            let quarantined = match quarantine(&path, backup_dir, collection) {
                Ok(backup) => Some(backup),
                Err(e) => {
                    log::error!("{}, {} starts empty without a copy", e, collection);
                    None
                }
            };
            Ok(LoadedCollection {
                quarantined,
                ..LoadedCollection::default()
            })
        }
    }
}

/// Parses collection file content into decoded documents.
pub(crate) fn parse_collection(bytes: &[u8], collection: &str) -> StoreResult<LoadedCollection> {
    let json: serde_json::Value = serde_json::from_slice(bytes)?;
    let mut report = DecodeReport::new();
    let documents = decode_collection(&json, collection, &mut report)?;
    Ok(LoadedCollection {
        documents,
        fallbacks: report.into_fallbacks(),
        quarantined: None,
    })
}

/// Decodes the `{ id: { field: value } }` form of one collection.
///
/// Fallback paths are recorded as `<id>.<field path>`.
pub(crate) fn decode_collection(
    json: &serde_json::Value,
    collection: &str,
    report: &mut DecodeReport,
) -> StoreResult<DocumentMap> {
    let entries = json.as_object().ok_or_else(|| {
        StoreError::new(
            &format!("Collection {} is not a JSON object", collection),
            ErrorKind::CorruptCollectionFile,
        )
    })?;

    let mut documents = DocumentMap::with_capacity(entries.len());
    for (id, value) in entries {
        let document = decode_document_at(value, id, report).map_err(|e| {
            StoreError::new_with_cause(
                &format!("Document {}/{} is not a JSON object", collection, id),
                ErrorKind::CorruptCollectionFile,
                e,
            )
        })?;
        documents.insert(id.clone(), document);
    }
    Ok(documents)
}

/// Encodes one collection to its `{ id: { field: value } }` form.
pub(crate) fn encode_collection(documents: &DocumentMap) -> serde_json::Value {
    let encoded: Map<String, serde_json::Value> = documents
        .iter()
        .map(|(id, document)| (id.clone(), encode_document(document)))
        .collect();
    serde_json::Value::Object(encoded)
}

fn quarantine(path: &Path, backup_dir: &Path, collection: &str) -> StoreResult<PathBuf> {
    let backup = unique_file(
        backup_dir,
        &format!("{}-error-{}", collection, current_file_name_timestamp()),
    );
    fs::copy(path, &backup).map_err(|e| {
        StoreError::new_with_cause(
            &format!("Failed to create error backup for {}", collection),
            ErrorKind::IOError,
            e.into(),
        )
    })?;
    log::warn!("Created error backup: {}", backup.display());
    Ok(backup)
}

/// Returns `<dir>/<stem>.json`, or `<dir>/<stem>-<n>.json` for the first `n`
/// that does not exist yet.
pub(crate) fn unique_file(dir: &Path, stem: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", stem, COLLECTION_FILE_EXTENSION));
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, counter, COLLECTION_FILE_EXTENSION));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
pub(crate) struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    /// Writes `json` next to `target` without touching `target` itself.
    pub(crate) fn write(target: PathBuf, json: &serde_json::Value) -> StoreResult<StagedFile> {
        let temp = temp_file(&target);
        let staged = StagedFile { temp, target };
        if let Err(e) = staged.write_temp(json) {
            staged.discard();
            return Err(e);
        }
        Ok(staged)
    }

    fn write_temp(&self, json: &serde_json::Value) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(json)?;
        let mut file = File::create(&self.temp)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Atomically replaces the target with the temporary file.
    pub(crate) fn commit(self) -> StoreResult<()> {
        fs::rename(&self.temp, &self.target).map_err(|e| {
            let err = StoreError::new_with_cause(
                &format!("Failed to replace {}", self.target.display()),
                ErrorKind::IOError,
                e.into(),
            );
            self.discard();
            err
        })
    }

    pub(crate) fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.temp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", self.temp.display(), e);
            }
        }
    }
}

/// Writes `json` to `target` through a temporary file and a rename.
pub(crate) fn write_json_atomic(target: &Path, json: &serde_json::Value) -> StoreResult<()> {
    StagedFile::write(target.to_path_buf(), json)?.commit()
}

/// Reads a JSON file written by [write_json_atomic] or by hand.
pub(crate) fn read_json(path: &Path) -> StoreResult<serde_json::Value> {
    let bytes = fs::read(path).map_err(|e| {
        StoreError::new_with_cause(
            &format!("Failed to read {}", path.display()),
            ErrorKind::IOError,
            e.into(),
        )
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
