pub mod indexes;
pub mod models;

use mongodb::{Client, Database};
use salesvoice_config::MongoSettings;

/// Connects to MongoDB and verifies the server is reachable with a ping.
pub async fn connect(settings: &MongoSettings) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&settings.uri).await?;
    let db = client.database(&settings.database);
    db.run_command(bson::doc! { "ping": 1 }).await?;
    tracing::info!(database = %settings.database, "Connected to MongoDB");
    Ok(db)
}
