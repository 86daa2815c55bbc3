//! Multi-document replica of the catalog collection

use crate::error::{ReplicaError, ReplicaResult};
use crate::subscription::{spawn_feed, Feed};
use chrono::Utc;
use dipto_store::{CollectionSnapshot, DocumentPath, DocumentStore, WriteBatch};
use dipto_types::{seed_catalog, CatalogDraft, CatalogItem, DecodeError, ItemId, PublishStatus};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const CATALOG_COLLECTION: &str = "courses";

fn item_path(id: &ItemId) -> DocumentPath {
    DocumentPath::new(CATALOG_COLLECTION, id.as_str())
}

/// Decode every well-formed document, in snapshot order.
fn decode_snapshot(snapshot: CollectionSnapshot) -> Vec<CatalogItem> {
    snapshot
        .documents
        .into_iter()
        .filter_map(|doc| match CatalogItem::decode(&doc.id, doc.data) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "Malformed catalog document skipped");
                None
            }
        })
        .collect()
}

fn seed_batch(items: &[CatalogItem]) -> ReplicaResult<WriteBatch> {
    items.iter().try_fold(WriteBatch::new(), |batch, item| {
        Ok(batch.set(item_path(&item.id), item.encode()?))
    })
}

#[derive(Clone)]
pub struct CatalogReplica {
    store: Arc<dyn DocumentStore>,
}

impl CatalogReplica {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Attach to the catalog collection.
    ///
    /// If the very first snapshot is empty the seed set is written in one
    /// batch and delivered at once. Later empty snapshots are delivered as
    /// they are. A transport error ends the feed; only when nothing has been
    /// delivered yet is the seed set handed out first.
    pub fn subscribe(&self) -> Feed<Vec<CatalogItem>> {
        let store = self.store.clone();

        spawn_feed(move |publisher| async move {
            let mut listener = store.listen_collection(CATALOG_COLLECTION).await;
            let mut first = true;

            loop {
                let delivery = tokio::select! {
                    _ = publisher.cancelled() => break,
                    delivery = listener.next() => delivery,
                };

                let items = match delivery {
                    None => {
                        debug!("Catalog listener closed");
                        break;
                    }
                    Some(Ok(snapshot)) if first && snapshot.is_empty() => {
                        info!("Catalog empty on first observation, seeding");
                        let seed = seed_catalog();
                        seed_collection(store.clone(), &seed);
                        seed
                    }
                    Some(Ok(snapshot)) => {
                        debug!(documents = snapshot.len(), "Catalog snapshot");
                        decode_snapshot(snapshot)
                    }
                    Some(Err(e)) if first => {
                        warn!(error = %e, "Catalog channel failed, using built-in items");
                        publisher.publish(seed_catalog());
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Catalog channel failed, keeping last snapshot");
                        break;
                    }
                };
                first = false;

                if !publisher.publish(items) {
                    break;
                }
            }
        })
    }

    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn create(&self, item: &CatalogItem) -> ReplicaResult<()> {
        self.write(item).await?;
        info!("Catalog item created");
        Ok(())
    }

    /// Replace the full record stored under the item's id.
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn update(&self, item: &CatalogItem) -> ReplicaResult<()> {
        self.write(item).await?;
        info!("Catalog item updated");
        Ok(())
    }

    /// Change only the status, reading the current record first.
    ///
    /// The stored document is written back as read with just `status`
    /// replaced, so fields this replica does not model survive untouched.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: &ItemId, status: PublishStatus) -> ReplicaResult<CatalogItem> {
        let path = item_path(id);
        let mut current = self
            .store
            .get_document(&path)
            .await
            .map_err(|e| ReplicaError::write_failed(&path, e))?
            .ok_or_else(|| ReplicaError::ItemNotFound(id.clone()))?;

        let item = CatalogItem::decode(id.as_str(), current.clone())?.with_status(status);
        replace_status(id, &mut current, status)?;
        self.store.set_document(&path, current).await.map_err(|e| {
            warn!(path = %path, error = %e, "Catalog status write failed");
            ReplicaError::write_failed(&path, e)
        })?;
        info!(?status, "Catalog item status changed");
        Ok(item)
    }

    /// Flip between published and draft.
    pub async fn toggle_status(&self, item: &CatalogItem) -> ReplicaResult<CatalogItem> {
        self.set_status(&item.id, item.status.toggled()).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ItemId) -> ReplicaResult<()> {
        let path = item_path(id);
        self.store
            .delete_document(&path)
            .await
            .map_err(|e| {
                warn!(error = %e, "Catalog delete failed");
                ReplicaError::write_failed(&path, e)
            })?;
        info!("Catalog item deleted");
        Ok(())
    }

    /// Build an item from an editor draft and write it.
    ///
    /// With `existing` the draft replaces that item; otherwise a new item is created.
    pub async fn save_draft(
        &self,
        draft: CatalogDraft,
        existing: Option<&CatalogItem>,
    ) -> ReplicaResult<CatalogItem> {
        let item = draft.into_item(existing, Utc::now())?;
        match existing {
            Some(_) => self.update(&item).await?,
            None => self.create(&item).await?,
        }
        Ok(item)
    }

    async fn write(&self, item: &CatalogItem) -> ReplicaResult<()> {
        let path = item_path(&item.id);
        let data = item.encode()?;
        self.store.set_document(&path, data).await.map_err(|e| {
            warn!(path = %path, error = %e, "Catalog write failed");
            ReplicaError::write_failed(&path, e)
        })
    }
}

fn replace_status(id: &ItemId, document: &mut Value, status: PublishStatus) -> ReplicaResult<()> {
    let status = serde_json::to_value(status).map_err(|e| DecodeError::Encode(e.to_string()))?;
    let fields = document.as_object_mut().ok_or_else(|| DecodeError::Malformed {
        record: id.to_string(),
        reason: "document is not an object".to_string(),
    })?;
    fields.insert("status".to_string(), status);
    Ok(())
}

fn seed_collection(store: Arc<dyn DocumentStore>, items: &[CatalogItem]) {
    let batch = match seed_batch(items) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(error = %e, "Seed catalog failed to encode");
            return;
        }
    };
    tokio::spawn(async move {
        if let Err(e) = store.commit(batch).await {
            warn!(error = %e, "Seeding catalog failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipto_store::memory::InMemoryDocumentStore;
    use dipto_store::StoreError;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next(feed: &mut Feed<Vec<CatalogItem>>) -> Option<Vec<CatalogItem>> {
        timeout(Duration::from_secs(1), feed.next())
            .await
            .expect("feed stalled")
    }

    fn ids(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_malformed_documents_are_skipped() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let good = seed_catalog().remove(0);
        store.preload(&item_path(&good.id), good.encode().unwrap()).unwrap();
        store
            .preload(&DocumentPath::new(CATALOG_COLLECTION, "bad"), json!({"title": 1}))
            .unwrap();

        let replica = CatalogReplica::new(store);
        let mut feed = replica.subscribe();
        let items = next(&mut feed).await.unwrap();
        assert_eq!(ids(&items), vec!["1"]);
    }

    #[tokio::test]
    async fn test_mismatched_key_is_rejected() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let item = seed_catalog().remove(0);
        store
            .preload(&DocumentPath::new(CATALOG_COLLECTION, "other"), item.encode().unwrap())
            .unwrap();
        store.preload(&item_path(&item.id), item.encode().unwrap()).unwrap();

        let replica = CatalogReplica::new(store);
        let mut feed = replica.subscribe();
        assert_eq!(ids(&next(&mut feed).await.unwrap()), vec!["1"]);
    }

    #[tokio::test]
    async fn test_transport_error_falls_back_to_seed() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.fail_reads(CATALOG_COLLECTION, "offline").unwrap();

        let replica = CatalogReplica::new(store.clone());
        let mut feed = replica.subscribe();
        assert_eq!(ids(&next(&mut feed).await.unwrap()), vec!["1", "2"]);
        assert_eq!(next(&mut feed).await, None);
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_after_delivery_keeps_catalog() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let item = seed_catalog().remove(1);
        store.preload(&item_path(&item.id), item.encode().unwrap()).unwrap();

        let replica = CatalogReplica::new(store.clone());
        let mut feed = replica.subscribe();
        assert_eq!(ids(&next(&mut feed).await.unwrap()), vec!["2"]);

        store.fail_reads(CATALOG_COLLECTION, "offline").unwrap();
        assert_eq!(next(&mut feed).await, None);
    }

    #[tokio::test]
    async fn test_set_status_leaves_other_fields_as_stored() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let mut document = seed_catalog().remove(0).encode().unwrap();
        document["price"] = json!(10);
        document["tags"] = json!(["x"]);
        store.preload(&item_path(&ItemId::new("1")), document.clone()).unwrap();

        let replica = CatalogReplica::new(store.clone());
        let item = replica
            .set_status(&ItemId::new("1"), PublishStatus::Draft)
            .await
            .unwrap();
        assert_eq!(item.status, PublishStatus::Draft);
        assert_eq!(item.price, Decimal::from(10));

        let stored = store.get_document(&item_path(&item.id)).await.unwrap().unwrap();
        document["status"] = json!("Draft");
        assert_eq!(stored, document);
        assert!(stored["price"].is_u64());
    }

    #[tokio::test]
    async fn test_set_status_on_missing_item() {
        let replica = CatalogReplica::new(Arc::new(InMemoryDocumentStore::new()));
        let err = replica
            .set_status(&ItemId::new("nope"), PublishStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplicaError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_save_draft_creates_then_edits() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let replica = CatalogReplica::new(store.clone());

        let draft = CatalogDraft {
            title: "Rust for Services".into(),
            description: "Async Rust end to end.".into(),
            image_ref: "https://example.com/rust.png".into(),
            ..CatalogDraft::default()
        };
        let created = replica.save_draft(draft, None).await.unwrap();
        assert!(created.id.as_str().starts_with("course-"));
        assert_eq!(created.student_count, 0);

        let mut edit = CatalogDraft::from_item(&created);
        edit.price = Decimal::new(1999, 2);
        let edited = replica.save_draft(edit, Some(&created)).await.unwrap();
        assert_eq!(edited.id, created.id);

        let stored = store.get_document(&item_path(&created.id)).await.unwrap().unwrap();
        let stored = CatalogItem::decode(created.id.as_str(), stored).unwrap();
        assert_eq!(stored.price, Decimal::new(1999, 2));
        assert_eq!(store.document_ids(CATALOG_COLLECTION).len(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_draft_writes_nothing() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let replica = CatalogReplica::new(store.clone());
        let err = replica
            .save_draft(CatalogDraft::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplicaError::Draft(_)));
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.fail_writes(StoreError::PermissionDenied("read only".into())).unwrap();
        let replica = CatalogReplica::new(store);
        let err = replica.delete(&ItemId::new("1")).await.unwrap_err();
        assert!(err.is_write_failure());
    }
}
