// src/db.rs
use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool(database_url: &str) -> AppResult<SqlitePool> {
    tracing::info!("Ligando à base de dados: {}", database_url);

    // As regras RESTRICT / SET NULL / CASCADE dependem de foreign_keys ligado
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    tracing::info!("Executando migrações da base de dados...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrações concluídas.");
    Ok(())
}

/// Pool em memória com o esquema real, para os testes.
/// Uma única conexão: cada conexão `:memory:` teria a sua própria base.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("url sqlite válida")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("pool em memória");
    run_migrations(&pool).await.expect("migrações");
    pool
}
