use bson::{Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("Resource not found")]
    NotFound,
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
}

pub type DaoResult<T> = Result<T, DaoError>;

/// Generic typed wrapper over one MongoDB collection. Concern-specific DAOs
/// own one or more of these and express their queries through it.
pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            collection: db.collection::<T>(collection),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    /// Inserts one document, surfacing unique-index violations as
    /// `DaoError::DuplicateKey` so callers can branch on them.
    pub async fn insert_one(&self, doc: &T) -> DaoResult<ObjectId> {
        match self.collection.insert_one(doc).await {
            Ok(res) => res
                .inserted_id
                .as_object_id()
                .ok_or_else(|| DaoError::Validation("Inserted id is not an ObjectId".to_string())),
            Err(e) if is_duplicate_key(&e) => Err(DaoError::DuplicateKey(e.to_string())),
            Err(e) => Err(DaoError::Mongo(e)),
        }
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
        let mut find = self.collection.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_with_limit(
        &self,
        filter: Document,
        sort: Option<Document>,
        limit: i64,
    ) -> DaoResult<Vec<T>> {
        let mut find = self.collection.find(filter).limit(limit);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update_one(&self, filter: Document, update: Document) -> DaoResult<bool> {
        let res = self.collection.update_one(filter, update).await?;
        Ok(res.modified_count > 0)
    }

    pub async fn update_by_id(&self, id: ObjectId, update: Document) -> DaoResult<bool> {
        self.update_one(doc! { "_id": id }, update).await
    }

    pub async fn hard_delete(&self, filter: Document) -> DaoResult<u64> {
        let res = self.collection.delete_many(filter).await?;
        Ok(res.deleted_count)
    }

    pub async fn count(&self, filter: Document) -> DaoResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }
}

/// E11000 in any of the shapes the driver reports it.
fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match &*e.kind {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        ErrorKind::Write(WriteFailure::WriteConcernError(wce)) => wce.code == 11000,
        ErrorKind::Command(ce) => ce.code == 11000,
        _ => false,
    }
}

/// Escapes regex metacharacters so user-supplied ids can be embedded in
/// `$regex` filters.
pub fn escape_regex(input: &str) -> String {
    input
        .chars()
        .flat_map(|c| {
            if ".*+?^${}()|[]\\".contains(c) {
                vec!['\\', c]
            } else {
                vec![c]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::escape_regex;

    #[test]
    fn escape_regex_leaves_plain_ids_untouched() {
        assert_eq!(escape_regex("sales-room-42"), "sales-room-42");
    }

    #[test]
    fn escape_regex_escapes_metacharacters() {
        assert_eq!(escape_regex("room.1+2"), "room\\.1\\+2");
        assert_eq!(escape_regex("a$b^c"), "a\\$b\\^c");
    }
}
