//! Contact messages: create, list, fetch and status updates.

use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

use super::{decode_all, store_failure, IdGenerator};
use crate::db::models::{ContactMessage, MessageStatus, NewContactMessage};
use crate::db::{Collection, FindOptions, SharedStore, StoreError};
use crate::error::ApiError;

const NOT_FOUND: &str = "Contact message not found";

#[derive(Clone)]
pub struct ContactService {
    store: SharedStore,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ContactService {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Persists a new unread message and returns it as stored.
    pub async fn create(&self, input: NewContactMessage) -> Result<ContactMessage, ApiError> {
        let message = ContactMessage::new(input, self.ids.generate(), self.clock.utc());
        let doc = serde_json::to_value(&message)
            .map_err(StoreError::from)
            .map_err(store_failure("Error serializing contact message"))?;

        self.store
            .insert_one(Collection::ContactMessages, doc)
            .await
            .map_err(store_failure("Error creating contact message"))?;

        tracing::info!(id = %message.id, "Contact message created");
        Ok(message)
    }

    /// Newest first.
    pub async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ContactMessage>, ApiError> {
        let options = FindOptions::new().sort_desc("timestamp").skip(skip).limit(limit);
        let docs = self
            .store
            .find(Collection::ContactMessages, options)
            .await
            .map_err(store_failure("Error fetching contact messages"))?;

        decode_all(docs).map_err(store_failure("Error decoding contact messages"))
    }

    pub async fn get(&self, id: &str) -> Result<ContactMessage, ApiError> {
        let doc = self
            .store
            .find_by_id(Collection::ContactMessages, id)
            .await
            .map_err(store_failure("Error fetching contact message"))?
            .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

        serde_json::from_value(doc)
            .map_err(StoreError::from)
            .map_err(store_failure("Error decoding contact message"))
    }

    /// Rejects anything outside the status enum before touching the store.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<MessageStatus, ApiError> {
        let status = status
            .parse::<MessageStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let matched = self
            .store
            .set_field(
                Collection::ContactMessages,
                id,
                "status",
                Value::String(status.as_str().to_string()),
            )
            .await
            .map_err(store_failure("Error updating message status"))?;

        if matched == 0 {
            return Err(ApiError::NotFound(NOT_FOUND.to_string()));
        }

        tracing::info!(id = %id, status = %status, "Contact message status updated");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing::{fixture_time, SequentialIds, SteppingClock};
    use crate::services::DEFAULT_LIMIT;
    use serde_json::json;

    fn service() -> (ContactService, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let service = ContactService::new(
            store.clone(),
            Arc::new(SteppingClock::new()),
            Arc::new(SequentialIds::default()),
        );
        (service, store)
    }

    fn input(subject: &str) -> NewContactMessage {
        NewContactMessage {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            subject: subject.to_string(),
            message: "This is a sufficiently long test message.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_fills_server_fields() {
        let (service, store) = service();
        let created = service.create(input("Hello there")).await.unwrap();

        assert_eq!(created.id, "msg-1");
        assert_eq!(created.status, MessageStatus::Unread);
        assert_eq!(created.timestamp, fixture_time());

        let stored = store
            .find_by_id(Collection::ContactMessages, "msg-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["status"], "unread");
        assert_eq!(stored["subject"], "Hello there");
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_paging() {
        let (service, _) = service();
        for subject in ["First subject", "Second subject", "Third subject"] {
            service.create(input(subject)).await.unwrap();
        }

        let all = service.list(0, DEFAULT_LIMIT).await.unwrap();
        let subjects: Vec<&str> = all.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Third subject", "Second subject", "First subject"]);

        let page = service.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].subject, "Second subject");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (service, _) = service();
        let err = service.get("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_status_round_trip() {
        let (service, _) = service();
        let created = service.create(input("Hello there")).await.unwrap();

        for status in ["read", "replied", "unread"] {
            service.update_status(&created.id, status).await.unwrap();
            let fetched = service.get(&created.id).await.unwrap();
            assert_eq!(fetched.status.as_str(), status);
        }
    }

    #[tokio::test]
    async fn test_update_status_rejects_invalid_value_without_writing() {
        let (service, _) = service();
        let created = service.create(input("Hello there")).await.unwrap();

        let err = service.update_status(&created.id, "archived").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(
            service.get(&created.id).await.unwrap().status,
            MessageStatus::Unread
        );
    }

    #[tokio::test]
    async fn test_update_status_missing_id_is_not_found() {
        let (service, _) = service();
        let err = service.update_status("nope", "read").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_server_error() {
        let (service, store) = service();
        store
            .insert_one(
                Collection::ContactMessages,
                json!({ "id": "bad", "status": "archived" }),
            )
            .await
            .unwrap();

        assert!(matches!(
            service.get("bad").await.unwrap_err(),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            service.list(0, DEFAULT_LIMIT).await.unwrap_err(),
            ApiError::Internal(_)
        ));
    }
}
