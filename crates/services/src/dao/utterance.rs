use bson::doc;
use mongodb::Database;
use salesvoice_db::models::Utterance;

use super::base::{BaseDao, DaoResult, escape_regex};

pub struct UtteranceDao {
    pub base: BaseDao<Utterance>,
}

impl UtteranceDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Utterance::COLLECTION),
        }
    }

    /// Durable mirror of a buffered utterance. Callers treat failure as
    /// non-fatal; the in-memory buffer stays authoritative until finalize.
    pub async fn mirror(&self, utterance: &Utterance) -> DaoResult<()> {
        self.base.insert_one(utterance).await?;
        Ok(())
    }

    /// Fallback source of truth when the buffer is empty. Matches by
    /// anchored prefix because the externally-visible room id can be a
    /// prefix of the stored one (participant-suffix decoration); an exact
    /// id matches the same anchored pattern.
    pub async fn find_by_session_prefix(&self, session_id: &str) -> DaoResult<Vec<Utterance>> {
        let pattern = format!("^{}", escape_regex(session_id));
        self.base
            .find_many(
                doc! { "session_id": { "$regex": pattern } },
                Some(doc! { "sent_ts": 1 }),
            )
            .await
    }

    /// Most recent utterances for a session, newest first.
    pub async fn find_recent(&self, session_id: &str, limit: i64) -> DaoResult<Vec<Utterance>> {
        self.base
            .find_with_limit(
                doc! { "session_id": session_id },
                Some(doc! { "sent_ts": -1 }),
                limit,
            )
            .await
    }

    pub async fn count_by_session(&self, session_id: &str) -> DaoResult<u64> {
        self.base.count(doc! { "session_id": session_id }).await
    }
}
