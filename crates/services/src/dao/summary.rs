use bson::doc;
use mongodb::Database;
use salesvoice_db::models::CallSummary;

use super::base::{BaseDao, DaoResult};

/// Per-user aggregate counters for the dashboard view.
#[derive(Debug, Clone, Default)]
pub struct ParticipantStats {
    pub total_calls: u64,
    pub positive_calls: u64,
    pub negative_calls: u64,
}

pub struct SummaryDao {
    pub base: BaseDao<CallSummary>,
}

impl SummaryDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, CallSummary::COLLECTION),
        }
    }

    pub async fn find_by_session(&self, session_id: &str) -> DaoResult<Option<CallSummary>> {
        self.base.find_one(doc! { "session_id": session_id }).await
    }

    /// Plain insert under the unique `session_id` index. A duplicate-key
    /// error here means another process finalized first; the finalizer
    /// converts that into success.
    pub async fn insert(&self, summary: &CallSummary) -> DaoResult<bson::oid::ObjectId> {
        self.base.insert_one(summary).await
    }

    pub async fn recent_for_participant(
        &self,
        participant_id: &str,
        limit: i64,
    ) -> DaoResult<Vec<CallSummary>> {
        self.base
            .find_with_limit(
                doc! { "participant_id": participant_id },
                Some(doc! { "call_date": -1 }),
                limit,
            )
            .await
    }

    pub async fn stats_for_participant(
        &self,
        participant_id: &str,
    ) -> DaoResult<ParticipantStats> {
        let total_calls = self
            .base
            .count(doc! { "participant_id": participant_id })
            .await?;
        let positive_calls = self
            .base
            .count(doc! { "participant_id": participant_id, "experience": "Positive" })
            .await?;
        let negative_calls = self
            .base
            .count(doc! { "participant_id": participant_id, "experience": "Negative" })
            .await?;
        Ok(ParticipantStats {
            total_calls,
            positive_calls,
            negative_calls,
        })
    }
}
