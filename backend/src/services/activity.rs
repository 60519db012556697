//! Best-effort activity log

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::store::{ActivityEntry, WarehouseStore};

/// Writes audit entries. A failed write is logged and never reaches the caller.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn WarehouseStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self { store }
    }

    pub async fn log(
        &self,
        action: &str,
        resource_type: &str,
        resource_id: impl ToString,
        details: Value,
    ) {
        let entry = ActivityEntry {
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            details,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_activity(&entry).await {
            tracing::warn!(
                action = %entry.action,
                resource_id = %entry.resource_id,
                "Failed to write activity log: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_records_entry() {
        let store = Arc::new(MemoryStore::new());
        let log = ActivityLog::new(store.clone());

        log.log("stock_exit", "warehouse_item", "abc", json!({ "weight": "10" }))
            .await;

        let entries = store.activities().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "stock_exit");
        assert_eq!(entries[0].resource_id, "abc");
    }

    #[tokio::test]
    async fn test_failed_write_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_activity_writes(true);
        let log = ActivityLog::new(store.clone());

        log.log("stock_exit", "warehouse_item", "abc", Value::Null).await;

        assert!(store.activities().await.is_empty());
    }
}
