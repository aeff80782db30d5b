use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use salesvoice_db::models::{SessionRecord, TranscriptEntry, Verdict};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct SessionDao {
    pub base: BaseDao<SessionRecord>,
}

impl SessionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, SessionRecord::COLLECTION),
        }
    }

    pub async fn find_by_session(&self, session_id: &str) -> DaoResult<Option<SessionRecord>> {
        self.base.find_one(doc! { "session_id": session_id }).await
    }

    /// Upsert-by-session_id snapshot. Repeatable and side-effect free on the
    /// buffer: each call overwrites `messages`, `total_messages` and
    /// `latest_analysis` for the id rather than appending a second record.
    pub async fn save_snapshot(
        &self,
        session_id: &str,
        messages: Vec<TranscriptEntry>,
        analysis: Option<Verdict>,
    ) -> DaoResult<(ObjectId, u32)> {
        let total = messages.len() as u32;
        let now = DateTime::now();

        if let Some(existing) = self.find_by_session(session_id).await? {
            let id = existing
                .id
                .ok_or_else(|| DaoError::Validation("Session record without id".to_string()))?;
            self.base
                .update_by_id(
                    id,
                    doc! {
                        "$set": {
                            "messages": bson::to_bson(&messages)?,
                            "total_messages": total,
                            "latest_analysis": bson::to_bson(&analysis)?,
                            "saved_at": now,
                        }
                    },
                )
                .await?;
            return Ok((id, total));
        }

        let record = SessionRecord {
            id: None,
            session_id: session_id.to_string(),
            messages,
            total_messages: total,
            latest_analysis: analysis,
            saved_at: now,
        };

        match self.base.insert_one(&record).await {
            Ok(id) => Ok((id, total)),
            // Two concurrent first saves: the unique index rejects one;
            // retry as an overwrite of the winner's record.
            Err(DaoError::DuplicateKey(_)) => {
                let existing = self
                    .find_by_session(session_id)
                    .await?
                    .ok_or(DaoError::NotFound)?;
                let id = existing
                    .id
                    .ok_or_else(|| DaoError::Validation("Session record without id".to_string()))?;
                self.base
                    .update_by_id(
                        id,
                        doc! {
                            "$set": {
                                "messages": bson::to_bson(&record.messages)?,
                                "total_messages": total,
                                "latest_analysis": bson::to_bson(&record.latest_analysis)?,
                                "saved_at": now,
                            }
                        },
                    )
                    .await?;
                Ok((id, total))
            }
            Err(e) => Err(e),
        }
    }

    /// Recent saved sessions, newest first, for the conversations listing.
    pub async fn list_recent(&self, limit: i64) -> DaoResult<Vec<SessionRecord>> {
        self.base
            .find_with_limit(doc! {}, Some(doc! { "saved_at": -1 }), limit)
            .await
    }
}
