use std::path::Path;

use chrono::{DateTime, Utc};
use matchstore::store::local::LocalStore;
use matchstore::store::StoreAdministration;
use matchstore::{RuntimeMode, StoreBuilder, StoreResult};

/// Exit code of a finished command.
type Result = StoreResult<i32>;

/// Opens the local store from the environment plus command-line overrides.
pub fn open_store(data_dir: Option<&Path>, mode: Option<RuntimeMode>) -> StoreResult<LocalStore> {
    let mut builder = StoreBuilder::from_env();
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(mode) = mode {
        builder = builder.runtime_mode(mode);
    }
    LocalStore::open(&builder.build_config()?)
}

/// `matchstore stats`
pub fn stats(store: &LocalStore) -> Result {
    let stats = store.stats()?;
    println!("Data directory: {}", store.config().data_dir().display());
    println!();
    println!("  {:<20} {:>10}", "Collection", "Documents");
    println!("  {}", "-".repeat(31));
    let mut total = 0;
    for (collection, count) in &stats {
        println!("  {:<20} {:>10}", collection, count);
        total += count;
    }
    println!("  {}", "-".repeat(31));
    println!("  {:<20} {:>10}", "Total", total);
    Ok(0)
}

/// `matchstore validate`: exit code 1 when issues are found.
pub fn validate(store: &LocalStore) -> Result {
    let issues = store.validate_database();
    if issues.is_empty() {
        println!("Database validation passed");
        return Ok(0);
    }
    println!("Database validation found {} issue(s):", issues.len());
    for issue in &issues {
        println!("  - {}", issue);
    }
    Ok(1)
}

/// `matchstore backup`
pub fn backup(store: &LocalStore) -> Result {
    let path = store.create_full_backup()?;
    println!("Backup written to {}", path.display());
    Ok(0)
}

/// `matchstore restore <file>`
pub fn restore(store: &LocalStore, file: &Path) -> Result {
    store.restore_from_backup(file)?;
    println!("Restored from {}", file.display());
    Ok(0)
}

/// `matchstore export [file]`
pub fn export(store: &LocalStore, file: Option<&Path>) -> Result {
    let path = store.export_data(file)?;
    println!("Exported to {}", path.display());
    Ok(0)
}

/// `matchstore import <file>`
pub fn import(store: &LocalStore, file: &Path) -> Result {
    let collections = store.import_data(file)?;
    println!(
        "Imported {} collection(s): {}",
        collections.len(),
        collections.join(", ")
    );
    Ok(0)
}

/// `matchstore cleanup [--keep N]`
pub fn cleanup(store: &LocalStore, keep: usize) -> Result {
    let removed = store.cleanup_backups(keep)?;
    for path in &removed {
        println!("Removed {}", path.display());
    }
    println!("Removed {} backup(s), kept at most {}", removed.len(), keep);
    Ok(0)
}

/// `matchstore clear`
pub fn clear(store: &LocalStore) -> Result {
    store.clear_all_data()?;
    println!("All collections cleared");
    Ok(0)
}

/// `matchstore backups`
pub fn backups(store: &LocalStore) -> Result {
    let backups = store.list_backups()?;
    if backups.is_empty() {
        println!("  (no backups)");
        return Ok(0);
    }
    for backup in &backups {
        let modified: DateTime<Utc> = backup.modified.into();
        println!(
            "  {}  {:>10}  {}",
            modified.format("%Y-%m-%d %H:%M:%S"),
            format_bytes(backup.size),
            backup.path.display()
        );
    }
    Ok(0)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchstore::doc;
    use matchstore::store::DocumentStore;
    use tempfile::tempdir;

    #[test]
    fn validate_exit_codes() {
        let dir = tempdir().unwrap();
        let store = open_store(Some(dir.path()), None).unwrap();
        assert_eq!(validate(&store).unwrap(), 0);

        DocumentStore::new(store.clone())
            .collection("users")
            .doc("u1")
            .set(doc! { username: "alice" })
            .unwrap();
        assert_eq!(validate(&store).unwrap(), 1);
    }

    #[test]
    fn production_flag_blocks_clear() {
        let dir = tempdir().unwrap();
        let store = open_store(Some(dir.path()), Some(RuntimeMode::Production)).unwrap();
        assert!(clear(&store).is_err());
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
