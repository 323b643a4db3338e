use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

/// Schema migrations embedded from `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Connects and brings the schema up to date
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = create_pool(database_url, max_connections).await?;

    MIGRATOR.run(&pool).await?;
    tracing::info!(max_connections, "Database connected and migrated");

    Ok(pool)
}
