use crate::config::Config;
use crate::db::Store;

/// Opening the store applies any pending migrations.
pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = Store::from_config(&config.general).await?;
    store.ping().await?;

    println!("Database is up to date: {}", config.general.database_url);
    Ok(())
}
