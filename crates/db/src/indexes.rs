use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

/// Ensures every index the system relies on. The unique index on
/// `call_summaries.session_id` is the cross-process finalize guard: the
/// in-process latch only dedupes triggers within one agent instance, so a
/// failure to create this index must abort startup.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Utterances (durable mirror of the in-memory buffer)
    create_indexes(
        db,
        "utterances",
        vec![index(bson::doc! { "session_id": 1, "sent_ts": 1 })],
    )
    .await?;

    // Session snapshots (upsert-by-id)
    create_indexes(
        db,
        "sessions",
        vec![index_unique(bson::doc! { "session_id": 1 })],
    )
    .await?;

    // Call summaries: at most one per session, ever
    create_indexes(
        db,
        "call_summaries",
        vec![
            index_unique(bson::doc! { "session_id": 1 }),
            index(bson::doc! { "participant_id": 1, "call_date": -1 }),
        ],
    )
    .await?;

    // Users
    create_indexes(db, "users", vec![index_unique(bson::doc! { "email": 1 })]).await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<bson::Document>(collection);
    match coll.create_indexes(indexes.clone()).await {
        Ok(_) => {
            info!(collection, "Indexes created");
            Ok(())
        }
        Err(e) => {
            // IndexKeySpecsConflict (code 86): an existing index has the same
            // name but different options. Drop the conflicting indexes and
            // retry.
            if let mongodb::error::ErrorKind::Command(ref cmd_err) = *e.kind {
                if cmd_err.code == 86 {
                    tracing::warn!(
                        collection,
                        "Index conflict detected, dropping conflicting indexes and retrying"
                    );
                    coll.drop_indexes().await?;
                    coll.create_indexes(indexes).await?;
                    info!(collection, "Indexes recreated after conflict resolution");
                    return Ok(());
                }
            }
            Err(e)
        }
    }
}
