//! Storage gateway: named document collections behind an object-safe store
//! trait, plus connection settings and index setup.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Store handle shared by every request for the lifetime of the process.
pub type SharedStore = Arc<dyn DocumentStore>;

// ============================================================================
// Collections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    ContactMessages,
    Projects,
    Experiences,
    TechnicalExpertise,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Self::ContactMessages,
        Self::Projects,
        Self::Experiences,
        Self::TechnicalExpertise,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::ContactMessages => "contact_messages",
            Collection::Projects => "projects",
            Collection::Experiences => "experiences",
            Collection::TechnicalExpertise => "technical_expertise",
        }
    }

    /// Fields carrying a secondary index, matching the query patterns served.
    pub fn indexed_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::ContactMessages => &["timestamp", "status"],
            Collection::Projects => &["category", "created_at"],
            Collection::Experiences => &["company"],
            Collection::TechnicalExpertise => &["category"],
        }
    }

    pub fn index_name(&self, field: &str) -> String {
        format!("idx_{}_{}", self.name(), field)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Exact match of a top-level string field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: &'static str,
    pub value: String,
}

/// Options for [`DocumentStore::find`]. Sorting compares the stored string
/// value of the field lexically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub filter: Option<Filter>,
    pub sort: Option<(&'static str, SortDirection)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.filter = Some(Filter {
            field,
            value: value.into(),
        });
        self
    }

    pub fn sort_desc(mut self, field: &'static str) -> Self {
        self.sort = Some((field, SortDirection::Descending));
        self
    }

    pub fn sort_asc(mut self, field: &'static str) -> Self {
        self.sort = Some((field, SortDirection::Ascending));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("write to {0} was not acknowledged")]
    NotAcknowledged(Collection),
    #[error("document in {0} has no string `id` field")]
    MissingId(Collection),
    #[error("duplicate id `{id}` in {collection}")]
    DuplicateId { collection: Collection, id: String },
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid database configuration: {0}")]
    Config(String),
}

// ============================================================================
// Store trait
// ============================================================================

/// A document store holding the four portfolio collections.
///
/// Documents are JSON objects with a unique string `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: Collection, doc: Value) -> Result<(), StoreError>;

    /// Inserts all documents, returning how many were written.
    async fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<u64, StoreError>;

    async fn find(&self, collection: Collection, options: FindOptions) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    /// Sets one top-level field on the document with `id`; returns the number
    /// of documents matched.
    async fn set_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<u64, StoreError>;

    async fn delete_all(&self, collection: Collection) -> Result<u64, StoreError>;

    async fn count(&self, collection: Collection) -> Result<u64, StoreError>;

    /// Distinct non-null values of a top-level field, sorted.
    async fn distinct(&self, collection: Collection, field: &str) -> Result<Vec<Value>, StoreError>;

    /// Ensures the collection exists and carries an index on `field`;
    /// returns the index name.
    async fn create_index(&self, collection: Collection, field: &'static str) -> Result<String, StoreError>;

    /// Round-trip to the backend.
    async fn ping(&self) -> Result<Duration, StoreError>;

    /// Releases the underlying connection. Called once at shutdown.
    async fn close(&self);
}

/// Creates every collection index. Failures are logged and skipped so the
/// service can still start in a degraded state. Returns the indexes ensured.
pub async fn init_database(store: &dyn DocumentStore) -> Vec<String> {
    tracing::info!("Initializing database indexes...");

    let mut ensured = Vec::new();
    let mut failed = 0usize;
    for collection in Collection::ALL {
        for &field in collection.indexed_fields() {
            match store.create_index(collection, field).await {
                Ok(name) => ensured.push(name),
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        collection = %collection,
                        field = %field,
                        error = %e,
                        "Failed to create index"
                    );
                }
            }
        }
    }

    if failed == 0 {
        tracing::info!(indexes = ensured.len(), "Database initialized successfully");
    } else {
        tracing::warn!(
            indexes = ensured.len(),
            failed,
            "Database initialized with errors; continuing in degraded mode"
        );
    }

    ensured
}

// ============================================================================
// Configuration
// ============================================================================

lazy_static::lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    /// Logical database name; each collection lives under this schema.
    pub database_name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/portfolio".to_string()),
            database_name: std::env::var("DB_NAME").unwrap_or_else(|_| "portfolio_db".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

impl DbConfig {
    /// Rejects settings that cannot be used safely, such as a database name
    /// that is not a plain SQL identifier.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !IDENTIFIER_REGEX.is_match(&self.database_name) {
            return Err(StoreError::Config(format!(
                "DB_NAME `{}` must be a letter or underscore followed by letters, digits or underscores",
                self.database_name
            )));
        }
        if self.max_connections == 0 {
            return Err(StoreError::Config("DB_POOL_MAX must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Connection URL with credentials masked, for logging.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***{}", &self.url[..scheme_end], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}
