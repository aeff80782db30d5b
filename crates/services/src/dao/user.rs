use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use salesvoice_db::models::User;

use super::base::{BaseDao, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    /// Creates a directory entry. The unique `email` index turns a repeat
    /// registration into `DaoError::DuplicateKey`.
    pub async fn create(
        &self,
        email: String,
        password_hash: String,
        full_name: String,
        phone_number: Option<String>,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            password_hash,
            full_name,
            phone_number,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<User>> {
        self.base.find_one(doc! { "email": email }).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Option<User>> {
        self.base.find_one(doc! { "_id": id }).await
    }
}
