//! Document storage over SQLite.
//!
//! `DocumentStore` exposes point reads/writes, field updates (including
//! dotted paths like `lastMessage.readBy`), set-semantics array operations,
//! equality and array-membership queries with ordering, and transactional
//! write batches.

use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{ChatError, ChatResult};
use crate::store::events::{StoreEvent, StoreEventBroadcast, StoreEventKind};

/// Capacity of the store event channel. Slow subscribers that fall further
/// behind than this lose events and must re-read.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A document read back from the store.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

impl Document {
    /// Deserialize the document body into a typed record.
    pub fn to<T: DeserializeOwned>(&self) -> ChatResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Handle to the document store.
///
/// Cheap to clone; clones share the pool and the event channel.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    events: StoreEventBroadcast,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { pool, events }
    }

    /// The underlying connection pool (identity accounts share it).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Subscribe to change events for all collections.
    ///
    /// The subscription lives until the receiver is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Point read. Returns `None` when the document does not exist.
    pub async fn get(&self, collection: &str, id: &str) -> ChatResult<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// Point read that fails with `NotFound` when the document is missing.
    pub async fn get_required(&self, collection: &str, id: &str) -> ChatResult<Value> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| ChatError::not_found(format!("{collection}/{id}")))
    }

    /// Full overwrite (upsert) of a single document.
    pub async fn set(&self, collection: &str, id: &str, body: Value) -> ChatResult<()> {
        self.batch().set(collection, id, body).commit().await
    }

    /// Insert a new document under a generated UUID id and return the id.
    pub async fn create(&self, collection: &str, body: Value) -> ChatResult<String> {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, body).await?;
        Ok(id)
    }

    /// Shallow field merge into an existing document.
    ///
    /// `fields` must be a JSON object. Keys may be dotted paths
    /// (`lastMessage.readBy`), which replace the nested field only.
    /// Fails with `NotFound` when the document does not exist.
    pub async fn update(&self, collection: &str, id: &str, fields: Value) -> ChatResult<()> {
        self.batch().update(collection, id, fields).commit().await
    }

    /// Add an element to an array field if not already present.
    pub async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> ChatResult<()> {
        self.batch()
            .array_union(collection, id, field, value)
            .commit()
            .await
    }

    /// Remove an element from an array field if present.
    pub async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> ChatResult<()> {
        self.batch()
            .array_remove(collection, id, field, value)
            .commit()
            .await
    }

    /// Delete a document. Deleting a missing document is a no-op.
    pub async fn delete(&self, collection: &str, id: &str) -> ChatResult<()> {
        self.batch().delete(collection, id).commit().await
    }

    /// All documents in a collection whose string field equals `value`.
    pub async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> ChatResult<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body FROM documents
            WHERE collection = ?1 AND json_extract(body, '$.' || ?2) = ?3
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_document).collect()
    }

    /// All documents whose array field contains `value`, ordered by another
    /// field. This is the chat-list / group-list query shape.
    pub async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        order_by: &str,
        order: Order,
    ) -> ChatResult<Vec<Document>> {
        let sql = match order {
            Order::Asc => {
                r#"
                SELECT id, body FROM documents
                WHERE collection = ?1
                  AND EXISTS (
                    SELECT 1 FROM json_each(documents.body, '$.' || ?2) je
                    WHERE je.value = ?3
                  )
                ORDER BY json_extract(body, '$.' || ?4) ASC
                "#
            }
            Order::Desc => {
                r#"
                SELECT id, body FROM documents
                WHERE collection = ?1
                  AND EXISTS (
                    SELECT 1 FROM json_each(documents.body, '$.' || ?2) je
                    WHERE je.value = ?3
                  )
                ORDER BY json_extract(body, '$.' || ?4) DESC
                "#
            }
        };

        let rows = sqlx::query(sql)
            .bind(collection)
            .bind(field)
            .bind(value)
            .bind(order_by)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_document).collect()
    }

    /// All documents in a collection, ordered by a field. `limit` of `None`
    /// returns everything.
    pub async fn list(
        &self,
        collection: &str,
        order_by: &str,
        order: Order,
        limit: Option<i64>,
    ) -> ChatResult<Vec<Document>> {
        let sql = match order {
            Order::Asc => {
                r#"
                SELECT id, body FROM documents
                WHERE collection = ?1
                ORDER BY json_extract(body, '$.' || ?2) ASC
                LIMIT ?3
                "#
            }
            Order::Desc => {
                r#"
                SELECT id, body FROM documents
                WHERE collection = ?1
                ORDER BY json_extract(body, '$.' || ?2) DESC
                LIMIT ?3
                "#
            }
        };

        let rows = sqlx::query(sql)
            .bind(collection)
            .bind(order_by)
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_document).collect()
    }

    /// Start a transactional write batch.
    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch {
            store: self,
            ops: Vec::new(),
        }
    }
}

fn row_to_document(row: SqliteRow) -> ChatResult<Document> {
    let body: String = row.get("body");
    Ok(Document {
        id: row.get("id"),
        body: serde_json::from_str(&body)?,
    })
}

/// A single operation inside a write batch.
#[derive(Debug)]
enum BatchOp {
    Set {
        collection: String,
        id: String,
        body: Value,
    },
    Update {
        collection: String,
        id: String,
        fields: Value,
    },
    ArrayUnion {
        collection: String,
        id: String,
        field: String,
        value: Value,
    },
    ArrayRemove {
        collection: String,
        id: String,
        field: String,
        value: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// A collected set of writes committed in one transaction.
///
/// Either every operation applies or none does. An `update` targeting a
/// missing document aborts the whole batch with `NotFound`. Events are
/// published only after a successful commit.
#[must_use = "a write batch does nothing until committed"]
pub struct WriteBatch<'a> {
    store: &'a DocumentStore,
    ops: Vec<BatchOp>,
}

impl<'a> WriteBatch<'a> {
    pub fn set(mut self, collection: &str, id: &str, body: Value) -> Self {
        self.ops.push(BatchOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            body,
        });
        self
    }

    pub fn update(mut self, collection: &str, id: &str, fields: Value) -> Self {
        self.ops.push(BatchOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn array_union(mut self, collection: &str, id: &str, field: &str, value: Value) -> Self {
        self.ops.push(BatchOp::ArrayUnion {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn array_remove(mut self, collection: &str, id: &str, field: &str, value: Value) -> Self {
        self.ops.push(BatchOp::ArrayRemove {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn delete(mut self, collection: &str, id: &str) -> Self {
        self.ops.push(BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Commit every collected operation in one transaction.
    pub async fn commit(self) -> ChatResult<()> {
        let mut tx = self.store.pool.begin().await?;
        let mut events = Vec::with_capacity(self.ops.len());

        for op in self.ops {
            match op {
                BatchOp::Set {
                    collection,
                    id,
                    body,
                } => {
                    let existed = read_document(&mut tx, &collection, &id).await?.is_some();
                    write_document(&mut tx, &collection, &id, &body).await?;
                    let kind = if existed {
                        StoreEventKind::Updated
                    } else {
                        StoreEventKind::Created
                    };
                    events.push(StoreEvent::new(collection, id, kind));
                }
                BatchOp::Update {
                    collection,
                    id,
                    fields,
                } => {
                    let mut body = read_required(&mut tx, &collection, &id).await?;
                    merge_fields(&mut body, &fields)?;
                    write_document(&mut tx, &collection, &id, &body).await?;
                    events.push(StoreEvent::new(collection, id, StoreEventKind::Updated));
                }
                BatchOp::ArrayUnion {
                    collection,
                    id,
                    field,
                    value,
                } => {
                    let mut body = read_required(&mut tx, &collection, &id).await?;
                    let array = array_at_path(&mut body, &field);
                    if !array.contains(&value) {
                        array.push(value);
                    }
                    write_document(&mut tx, &collection, &id, &body).await?;
                    events.push(StoreEvent::new(collection, id, StoreEventKind::Updated));
                }
                BatchOp::ArrayRemove {
                    collection,
                    id,
                    field,
                    value,
                } => {
                    let mut body = read_required(&mut tx, &collection, &id).await?;
                    let array = array_at_path(&mut body, &field);
                    array.retain(|v| v != &value);
                    write_document(&mut tx, &collection, &id, &body).await?;
                    events.push(StoreEvent::new(collection, id, StoreEventKind::Updated));
                }
                BatchOp::Delete { collection, id } => {
                    let result =
                        sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
                            .bind(&collection)
                            .bind(&id)
                            .execute(&mut *tx)
                            .await?;
                    if result.rows_affected() > 0 {
                        events.push(StoreEvent::new(collection, id, StoreEventKind::Deleted));
                    }
                }
            }
        }

        tx.commit().await?;

        for event in events {
            // Nobody listening is fine.
            let _ = self.store.events.send(event);
        }

        Ok(())
    }
}

async fn read_document(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &str,
    id: &str,
) -> ChatResult<Option<Value>> {
    let row = sqlx::query("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(row) => {
            let body: String = row.get("body");
            Ok(Some(serde_json::from_str(&body)?))
        }
        None => Ok(None),
    }
}

async fn read_required(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &str,
    id: &str,
) -> ChatResult<Value> {
    read_document(tx, collection, id)
        .await?
        .ok_or_else(|| ChatError::not_found(format!("{collection}/{id}")))
}

async fn write_document(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &str,
    id: &str,
    body: &Value,
) -> ChatResult<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
        ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(body.to_string())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Merge an object of field updates into a document body. Keys may be
/// dotted paths; intermediate objects are created as needed.
fn merge_fields(body: &mut Value, fields: &Value) -> ChatResult<()> {
    let fields = fields
        .as_object()
        .ok_or_else(|| ChatError::invalid("update fields must be a JSON object"))?;

    for (path, value) in fields {
        set_path(body, path, value.clone());
    }
    Ok(())
}

fn set_path(body: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let mut cur = body;

    for part in &parts[..parts.len() - 1] {
        let map = match cur {
            Value::Object(map) => map,
            _ => return,
        };
        cur = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !cur.is_object() {
            *cur = Value::Object(serde_json::Map::new());
        }
    }

    if let Value::Object(map) = cur {
        map.insert(parts[parts.len() - 1].to_string(), value);
    }
}

/// Navigate to an array field (dotted paths allowed), creating it — and any
/// intermediate objects — when missing.
fn array_at_path<'v>(body: &'v mut Value, path: &str) -> &'v mut Vec<Value> {
    let parts: Vec<&str> = path.split('.').collect();
    let mut cur = body;

    for part in &parts[..parts.len() - 1] {
        let map = match cur {
            Value::Object(map) => map,
            _ => unreachable!("document bodies are always objects"),
        };
        cur = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !cur.is_object() {
            *cur = Value::Object(serde_json::Map::new());
        }
    }

    let map = match cur {
        Value::Object(map) => map,
        _ => unreachable!("document bodies are always objects"),
    };
    let slot = map
        .entry(parts[parts.len() - 1].to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut().expect("slot was just made an array")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> DocumentStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        DocumentStore::new(pool)
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = memory_store().await;
        store
            .set("users", "u1", json!({"name": "Alice", "verified": false}))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Alice");
        assert_eq!(doc["verified"], false);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = memory_store().await;
        assert!(store.get("users", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = memory_store().await;
        let err = store
            .update("users", "ghost", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_other_fields() {
        let store = memory_store().await;
        store
            .set("users", "u1", json!({"name": "Alice", "bio": "hi"}))
            .await
            .unwrap();
        store
            .update("users", "u1", json!({"bio": "hello"}))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Alice");
        assert_eq!(doc["bio"], "hello");
    }

    #[tokio::test]
    async fn test_dotted_path_update() {
        let store = memory_store().await;
        store
            .set("chats", "c1", json!({"lastMessage": {"text": "hi", "readBy": ["a"]}}))
            .await
            .unwrap();
        store
            .array_union("chats", "c1", "lastMessage.readBy", json!("b"))
            .await
            .unwrap();

        let doc = store.get("chats", "c1").await.unwrap().unwrap();
        assert_eq!(doc["lastMessage"]["readBy"], json!(["a", "b"]));
        assert_eq!(doc["lastMessage"]["text"], "hi");
    }

    #[tokio::test]
    async fn test_array_union_is_idempotent() {
        let store = memory_store().await;
        store
            .set("groups", "g1", json!({"members": ["a"]}))
            .await
            .unwrap();

        store
            .array_union("groups", "g1", "members", json!("b"))
            .await
            .unwrap();
        store
            .array_union("groups", "g1", "members", json!("b"))
            .await
            .unwrap();

        let doc = store.get("groups", "g1").await.unwrap().unwrap();
        assert_eq!(doc["members"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_array_remove_absent_is_noop() {
        let store = memory_store().await;
        store
            .set("groups", "g1", json!({"members": ["a"]}))
            .await
            .unwrap();
        store
            .array_remove("groups", "g1", "members", json!("z"))
            .await
            .unwrap();

        let doc = store.get("groups", "g1").await.unwrap().unwrap();
        assert_eq!(doc["members"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_query_eq() {
        let store = memory_store().await;
        store
            .set("chats", "c1", json!({"pairKey": "a:b"}))
            .await
            .unwrap();
        store
            .set("chats", "c2", json!({"pairKey": "a:c"}))
            .await
            .unwrap();

        let found = store.query_eq("chats", "pairKey", "a:b").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c1");
    }

    #[tokio::test]
    async fn test_query_array_contains_with_order() {
        let store = memory_store().await;
        store
            .set(
                "chats",
                "older",
                json!({"participants": ["a", "b"], "lastMessageAt": "2024-01-01T00:00:00Z"}),
            )
            .await
            .unwrap();
        store
            .set(
                "chats",
                "newer",
                json!({"participants": ["a", "c"], "lastMessageAt": "2024-06-01T00:00:00Z"}),
            )
            .await
            .unwrap();
        store
            .set(
                "chats",
                "other",
                json!({"participants": ["x", "y"], "lastMessageAt": "2024-12-01T00:00:00Z"}),
            )
            .await
            .unwrap();

        let chats = store
            .query_array_contains("chats", "participants", "a", "lastMessageAt", Order::Desc)
            .await
            .unwrap();
        let ids: Vec<&str> = chats.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_list_with_limit() {
        let store = memory_store().await;
        for i in 0..5 {
            store
                .set(
                    "globalChat",
                    &format!("m{i}"),
                    json!({"createdAt": format!("2024-01-0{}T00:00:00Z", i + 1)}),
                )
                .await
                .unwrap();
        }

        let latest = store
            .list("globalChat", "createdAt", Order::Desc, Some(2))
            .await
            .unwrap();
        let ids: Vec<&str> = latest.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["m4", "m3"]);
    }

    #[tokio::test]
    async fn test_batch_rolls_back_on_missing_update() {
        let store = memory_store().await;

        let err = store
            .batch()
            .set("chats/c1/messages", "m1", json!({"text": "hi"}))
            .update("chats", "c1", json!({"lastMessageAt": "now"}))
            .commit()
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));

        // The set in the same batch must not have been applied.
        assert!(store
            .get("chats/c1/messages", "m1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let store = memory_store().await;
        let mut rx = store.subscribe();

        store.set("users", "u1", json!({"name": "a"})).await.unwrap();
        store.set("users", "u1", json!({"name": "b"})).await.unwrap();
        store.delete("users", "u1").await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, StoreEventKind::Created);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, StoreEventKind::Updated);
        let third = rx.recv().await.unwrap();
        assert_eq!(third.kind, StoreEventKind::Deleted);
        assert_eq!(third.collection, "users");
        assert_eq!(third.id, "u1");
    }
}
