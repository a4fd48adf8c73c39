use bson::{doc, oid::ObjectId, Document};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("BSON deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),
    #[error("Entity not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Invalid transition from {current} via {attempted}")]
    InvalidTransition { current: String, attempted: String },
    #[error("Capacity reached: {0}")]
    Capacity(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type DaoResult<T> = Result<T, DaoError>;

pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<T>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<T> {
        self.collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_one(&self, filter: Document) -> DaoResult<Option<T>> {
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> DaoResult<Vec<T>> {
        self.find_limited(filter, sort, None).await
    }

    pub async fn find_limited(
        &self,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    ) -> DaoResult<Vec<T>> {
        let mut action = self.collection.find(filter);
        if let Some(sort) = sort {
            action = action.sort(sort);
        }
        if let Some(limit) = limit {
            action = action.limit(limit);
        }
        let mut cursor = action.await?;

        let mut results = Vec::new();
        use futures::TryStreamExt;
        while let Some(doc) = cursor.try_next().await? {
            results.push(doc);
        }
        Ok(results)
    }

    pub async fn insert_one(&self, doc: &T) -> DaoResult<ObjectId> {
        let result = self.collection.insert_one(doc).await.map_err(map_write_error)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DaoError::Validation("inserted_id is not an ObjectId".to_string()))?;
        debug!(?id, "Inserted document");
        Ok(id)
    }

    /// Applies `update`, stamping `updated_at` into its `$set`.
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> DaoResult<bool> {
        let result = self
            .collection
            .update_one(filter, with_timestamp(update))
            .await
            .map_err(map_write_error)?;
        Ok(result.modified_count > 0)
    }

    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> DaoResult<u64> {
        let result = self
            .collection
            .update_many(filter, with_timestamp(update))
            .await?;
        Ok(result.modified_count)
    }

    pub async fn update_by_id(&self, id: ObjectId, update: Document) -> DaoResult<bool> {
        self.update_one(doc! { "_id": id }, update).await
    }

    /// Atomically updates one matching document and returns it as modified.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
    ) -> DaoResult<Option<T>> {
        Ok(self
            .collection
            .find_one_and_update(filter, with_timestamp(update))
            .return_document(mongodb::options::ReturnDocument::After)
            .await
            .map_err(map_write_error)?)
    }

    /// Like `find_one_and_update` but inserts when nothing matches.
    pub async fn upsert(&self, filter: Document, update: Document) -> DaoResult<T> {
        self.collection
            .find_one_and_update(filter, with_timestamp(update))
            .upsert(true)
            .return_document(mongodb::options::ReturnDocument::After)
            .await
            .map_err(map_write_error)?
            .ok_or(DaoError::NotFound)
    }

    pub async fn hard_delete(&self, filter: Document) -> DaoResult<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    pub async fn count(&self, filter: Document) -> DaoResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }

    pub async fn exists(&self, filter: Document) -> DaoResult<bool> {
        Ok(self.count(filter).await? > 0)
    }
}

fn with_timestamp(update: Document) -> Document {
    let mut final_update = update;
    if let Ok(set_doc) = final_update.get_document_mut("$set") {
        set_doc.insert("updated_at", bson::DateTime::now());
    } else {
        final_update.insert("$set", doc! { "updated_at": bson::DateTime::now() });
    }
    final_update
}

fn map_write_error(e: mongodb::error::Error) -> DaoError {
    use mongodb::error::{ErrorKind, WriteFailure};

    let duplicate = match *e.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11000 => {
            Some(write_error.message.clone())
        }
        ErrorKind::Command(ref command_error) if command_error.code == 11000 => {
            Some(command_error.message.clone())
        }
        _ => None,
    };

    match duplicate {
        Some(message) => DaoError::DuplicateKey(message),
        None => DaoError::Mongo(e),
    }
}
