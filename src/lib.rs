pub mod catalog;
pub mod config;
pub mod history;
pub mod intercept;
pub mod migration;
pub mod source;
pub mod store;
pub mod utils;
pub mod version;

// Re-export commonly used types
pub use catalog::{discover, sort_by_version, MigrationFile};
pub use config::{read_config, ConfigError, MigrateConfig};
pub use history::HistoryStore;
pub use intercept::{
    CollectionRef, Database, DocumentRef, SetOptions, WriteBatch, WriteCounts, WriteKind,
    WriteStats,
};
pub use migration::{
    run_migrations, AppHandle, DeclarativeLoader, LoadError, MigrationContext, MigrationError,
    MigrationExecutor, MigrationResult, MigrationScript, RunStatistics, ScriptLoader,
    ScriptRegistry,
};
pub use source::{FsMigrationSource, MigrationSource};
pub use store::{
    Direction, Document, DocumentSnapshot, DocumentStore, FileStore, MemoryStore, Query,
    StoreError, Write,
};
pub use version::{parse_filename, ParsedName, SemVer, VersionError};
