//! Init-db command - create the request log tables

use tracing::info;

use crate::infrastructure::request_log::{Migrator, SqliteMigrator, SqliteRequestStore};

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let store = SqliteRequestStore::connect(&config.database).await?;
    let migrator = SqliteMigrator::new(store.pool().clone());
    migrator.run().await?;

    info!(
        url = %config.database.url,
        version = ?migrator.version().await?,
        "Request log ready"
    );
    Ok(())
}
