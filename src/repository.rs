use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::store::DocumentStore;
use crate::utils::shallow_merge;

/// A record type stored as one collection in the [`DocumentStore`].
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages ("Group not found")
    const LABEL: &'static str;

    fn id(&self) -> i64;

    /// Re-derives cached fields after a record was built from raw fields.
    fn normalize(&mut self) {}
}

/// CRUD over one collection. Every call reloads the collection from disk.
pub struct Repository<T> {
    store: DocumentStore,
    _entity: PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        Ok(self.store.load(T::COLLECTION).await?)
    }

    pub async fn find(&self, id: i64) -> Result<T, ApiError> {
        self.list()
            .await?
            .into_iter()
            .find(|record| record.id() == id)
            .ok_or(ApiError::NotFound(T::LABEL))
    }

    /// Appends a record built from the caller's fields and a fresh id.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<T, ApiError> {
        let _guard = self.store.lock().await;
        let mut records: Vec<T> = self.store.load(T::COLLECTION).await?;

        let id = fresh_id(&self.store, &records);
        let record = build_record::<T>(id, fields)?;
        records.push(record.clone());
        self.store.save(T::COLLECTION, &records).await?;

        tracing::info!(collection = T::COLLECTION, id, "record created");
        Ok(record)
    }

    /// Shallow-merges `patch` onto the stored record.
    pub async fn update(&self, id: i64, patch: Map<String, Value>) -> Result<T, ApiError> {
        let _guard = self.store.lock().await;
        let mut records: Vec<T> = self.store.load(T::COLLECTION).await?;

        let index = position(&records, id).ok_or(ApiError::NotFound(T::LABEL))?;
        let updated = merge_record(&records[index], patch)?;
        records[index] = updated.clone();
        self.store.save(T::COLLECTION, &records).await?;

        tracing::info!(collection = T::COLLECTION, id, "record updated");
        Ok(updated)
    }

    /// Removes the record and returns it.
    pub async fn delete(&self, id: i64) -> Result<T, ApiError> {
        let _guard = self.store.lock().await;
        let mut records: Vec<T> = self.store.load(T::COLLECTION).await?;

        let index = position(&records, id).ok_or(ApiError::NotFound(T::LABEL))?;
        let removed = records.remove(index);
        self.store.save(T::COLLECTION, &records).await?;

        tracing::info!(collection = T::COLLECTION, id, "record deleted");
        Ok(removed)
    }
}

pub fn position<T: Entity>(records: &[T], id: i64) -> Option<usize> {
    records.iter().position(|record| record.id() == id)
}

/// Next store id that is not already taken in `records`.
pub fn fresh_id<T: Entity>(store: &DocumentStore, records: &[T]) -> i64 {
    loop {
        let id = store.next_id();
        if position(records, id).is_none() {
            return id;
        }
    }
}

/// The assigned id always wins over an `id` supplied by the caller.
pub fn build_record<T: Entity>(id: i64, mut fields: Map<String, Value>) -> Result<T, ApiError> {
    fields.insert("id".to_string(), Value::from(id));
    from_fields(fields)
}

pub fn merge_record<T: Entity>(existing: &T, mut patch: Map<String, Value>) -> Result<T, ApiError> {
    patch.remove("id");
    let mut fields = to_fields(existing)?;
    shallow_merge(&mut fields, patch);
    from_fields(fields)
}

/// A stored record as a JSON object. Failing here is a server-side bug, not
/// bad input.
pub fn to_fields<T: Entity>(record: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::Internal(format!(
            "{} did not encode as a JSON object",
            T::LABEL
        ))),
        Err(e) => Err(ApiError::Internal(format!(
            "failed to encode {}: {}",
            T::LABEL.to_lowercase(),
            e
        ))),
    }
}

pub fn from_fields<T: Entity>(fields: Map<String, Value>) -> Result<T, ApiError> {
    let mut record: T = serde_json::from_value(Value::Object(fields)).map_err(|e| {
        ApiError::Validation(format!("Invalid {} data: {}", T::LABEL.to_lowercase(), e))
    })?;
    record.normalize();
    Ok(record)
}
