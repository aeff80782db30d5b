use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// User directory entry. The finalizer reads this collection to resolve
/// participant email/name/phone; auth routes own the writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
