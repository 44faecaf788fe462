//! Services: the operations behind each route, holding an injected store
//! handle, clock and id generator.

pub mod contact;
pub mod portfolio;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::StoreError;
use crate::error::ApiError;

pub use contact::ContactService;
pub use portfolio::{DeploymentProfile, PortfolioService};

/// Page size used when the caller does not pass `limit`.
pub const DEFAULT_LIMIT: u64 = 50;

/// Source of fresh, unique document ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, StoreError> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}

/// Logs a store failure with its context and turns it into an opaque
/// server error.
fn store_failure(context: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        ApiError::Internal(e)
    }
}
