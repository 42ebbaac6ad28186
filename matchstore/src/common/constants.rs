/// Collections loaded eagerly when a local store opens.
pub const KNOWN_COLLECTIONS: [&str; 8] = [
    "users",
    "tournaments",
    "entries",
    "teams",
    "settings",
    "series",
    "matchResults",
    "sessions",
];

pub const BACKUP_DIR_NAME: &str = "backups";
pub const COLLECTION_FILE_EXTENSION: &str = "json";
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
pub const FULL_BACKUP_PREFIX: &str = "full-backup";
pub const PRE_IMPORT_BACKUP_PREFIX: &str = "pre-import-backup";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BACKUP_RETENTION: usize = 10;

// Tagged storage representation of timestamps
pub const TYPE_TAG: &str = "__type";
pub const DATE_TYPE_NAME: &str = "Date";
pub const TAGGED_VALUE_FIELD: &str = "value";

// Export envelope
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";
pub const EXPORT_FILE_PREFIX: &str = "matchstore-export";
pub const EXPORT_DATABASE_NAME: &str = "local";

// Environment
pub const ENV_DATA_DIR: &str = "MATCHSTORE_DATA_DIR";
pub const ENV_RUNTIME_MODE: &str = "MATCHSTORE_ENV";
pub const ENV_REMOTE_ENABLED: &str = "MATCHSTORE_REMOTE_ENABLED";
pub const ENV_REMOTE_CREDENTIALS: &str = "MATCHSTORE_REMOTE_CREDENTIALS";
pub const ENV_REMOTE_URL: &str = "MATCHSTORE_REMOTE_URL";

pub const DEFAULT_REMOTE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_REMOTE_DATABASE: &str = "(default)";
