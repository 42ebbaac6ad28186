//! Local backend: one JSON file per collection under a data directory.

mod maintenance;
mod persistence;
mod store;
mod validation;

pub use maintenance::{BackupFile, ExportEnvelope};
pub use store::LocalStore;
