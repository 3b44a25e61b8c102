mod hash;

pub use hash::compute_hash;

use chrono::{DateTime, Utc};

/// Default name of the collection holding migration results
pub const DEFAULT_RESULTS_COLLECTION: &str = "migrations";

/// Default directory scanned for migration files
pub const DEFAULT_MIGRATIONS_DIR: &str = "./migrations";

/// Separator between the version and description parts of a filename
pub const FILENAME_SEPARATOR: &str = "__";

/// Get the current wall-clock time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    now().to_rfc3339()
}

/// Name of the user running the migrations
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extension of a filename without the leading dot
pub fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default()
}
