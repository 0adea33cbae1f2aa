//! Schema-less JSON document store with live collection snapshots.
//!
//! Documents live in hierarchical collections addressed by slash separated
//! paths. A document path is its collection path followed by the document id.
//! Every write notifies subscribers of the touched collection, and each
//! subscriber re-reads the whole collection, so consumers always receive a
//! complete snapshot and never a delta.

use std::{
    pin::Pin,
    str::FromStr,
    sync::Arc,
    task::{Context, Poll},
};

use futures_util::{stream::BoxStream, Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid document path: {0}")]
    BadPath(String),
    #[error("document data must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserializes the document with its id folded into the data as `id`.
    pub fn decode<T: DeserializeOwned>(self) -> StoreResult<T> {
        let mut data = self.data;
        if let Value::Object(map) = &mut data {
            map.insert("id".to_owned(), Value::String(self.id));
        }
        Ok(serde_json::from_value(data)?)
    }
}

pub fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> StoreResult<Vec<T>> {
    docs.into_iter().map(Document::decode).collect()
}

/// Serializes `data` into a JSON object, dropping any `id` key: ids belong to the path.
fn to_object<T: Serialize + ?Sized>(data: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(data)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        _ => Err(StoreError::NotAnObject),
    }
}

fn split_path(path: &str) -> StoreResult<(&str, &str)> {
    match path.rsplit_once('/') {
        Some((collection, id)) if !collection.is_empty() && !id.is_empty() => Ok((collection, id)),
        _ => Err(StoreError::BadPath(path.to_owned())),
    }
}

#[derive(Clone)]
pub struct DocStore {
    pool: SqlitePool,
    app_id: Arc<str>,
    tx: broadcast::Sender<String>,
}

impl DocStore {
    pub async fn connect(database_url: &str, app_id: &str) -> StoreResult<DocStore> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // each in-memory connection is its own database, so keep exactly one alive
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(16)
                .connect_with(options)
                .await?
        };

        DocStore::open(pool, app_id).await
    }

    pub async fn memory(app_id: &str) -> StoreResult<DocStore> {
        DocStore::connect("sqlite::memory:", app_id).await
    }

    pub async fn open(pool: SqlitePool, app_id: &str) -> StoreResult<DocStore> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(DocStore {
            pool,
            app_id: Arc::from(app_id),
            tx: broadcast::channel(256).0,
        })
    }

    /// Collection shared by every user.
    pub fn public(&self, name: &str) -> String {
        format!("artifacts/{}/public/data/{name}", self.app_id)
    }

    /// Collection private to one system identity.
    pub fn private(&self, uid: &str, name: &str) -> String {
        format!("artifacts/{}/users/{uid}/{name}", self.app_id)
    }

    pub async fn get(&self, path: &str) -> StoreResult<Option<Document>> {
        let (collection, id) = split_path(path)?;
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection=? AND id=?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((data,)) => Ok(Some(Document {
                id: id.to_owned(),
                data: serde_json::from_str(&data)?,
            })),
            None => Ok(None),
        }
    }

    /// Creates or replaces the document at `path`.
    pub async fn set<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> StoreResult<()> {
        let (collection, id) = split_path(path)?;
        let data = Value::Object(to_object(data)?).to_string();
        sqlx::query(
            "INSERT INTO documents (collection,id,data) VALUES (?,?,?)
             ON CONFLICT (collection,id) DO UPDATE SET data=excluded.data",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .execute(&self.pool)
        .await?;

        self.notify(collection);
        Ok(())
    }

    /// Merges the top-level fields of `partial` into an existing document.
    pub async fn update<T: Serialize + ?Sized>(&self, path: &str, partial: &T) -> StoreResult<()> {
        let (collection, id) = split_path(path)?;
        let patch = Value::Object(to_object(partial)?).to_string();
        let result = sqlx::query(
            "UPDATE documents SET data=json_patch(data, ?) WHERE collection=? AND id=?",
        )
        .bind(patch)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(path.to_owned()));
        }

        self.notify(collection);
        Ok(())
    }

    /// Like [`DocStore::update`], but only applies while `field` still equals
    /// `expected`. Returns whether the document was changed.
    pub async fn update_if<T: Serialize + ?Sized>(
        &self,
        path: &str,
        field: &str,
        expected: &str,
        partial: &T,
    ) -> StoreResult<bool> {
        let (collection, id) = split_path(path)?;
        let patch = Value::Object(to_object(partial)?).to_string();
        let result = sqlx::query(
            "UPDATE documents SET data=json_patch(data, ?)
             WHERE collection=? AND id=? AND json_extract(data, ?)=?",
        )
        .bind(patch)
        .bind(collection)
        .bind(id)
        .bind(format!("$.{field}"))
        .bind(expected)
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        if changed {
            self.notify(collection);
        }
        Ok(changed)
    }

    pub async fn delete(&self, path: &str) -> StoreResult<()> {
        let (collection, id) = split_path(path)?;
        sqlx::query("DELETE FROM documents WHERE collection=? AND id=?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.notify(collection);
        Ok(())
    }

    /// Creates a document under a fresh id and returns that id.
    pub async fn add<T: Serialize + ?Sized>(&self, collection: &str, data: &T) -> StoreResult<String> {
        let id = Uuid::now_v7().to_string();
        self.set(&format!("{collection}/{id}"), data).await?;
        Ok(id)
    }

    /// Every document of a collection, in no particular order.
    pub async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id,data FROM documents WHERE collection=?")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(id, data)| Ok(Document { id, data: serde_json::from_str(&data)? }))
            .collect()
    }

    /// Live snapshots of `collection`. The current snapshot is delivered
    /// immediately, then again after every change to the collection.
    pub fn subscribe(&self, collection: &str) -> Subscription {
        let state = SubscriptionState {
            store: self.clone(),
            rx: self.tx.subscribe(),
            collection: collection.to_owned(),
            primed: false,
        };

        let inner = futures_util::stream::unfold(state, |mut state| async move {
            if state.primed {
                loop {
                    match state.rx.recv().await {
                        Ok(changed) if changed == state.collection => break,
                        Ok(_) => continue,
                        // missed notifications are harmless, the next read is a full snapshot
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
            state.primed = true;
            let snapshot = state.store.list(&state.collection).await;
            Some((snapshot, state))
        })
        .boxed();

        Subscription {
            collection: collection.to_owned(),
            inner,
        }
    }

    fn notify(&self, collection: &str) {
        // no receivers is fine
        let _ = self.tx.send(collection.to_owned());
    }
}

struct SubscriptionState {
    store: DocStore,
    rx: broadcast::Receiver<String>,
    collection: String,
    primed: bool,
}

/// Handle to a live collection. Dropping it tears the subscription down.
pub struct Subscription {
    collection: String,
    inner: BoxStream<'static, StoreResult<Vec<Document>>>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn next_snapshot(&mut self) -> Option<StoreResult<Vec<Document>>> {
        self.inner.next().await
    }

    pub fn unsubscribe(self) {
        tracing::trace!(collection = %self.collection, "unsubscribed");
    }
}

impl Stream for Subscription {
    type Item = StoreResult<Vec<Document>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
