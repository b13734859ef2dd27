use anyhow::Context;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use std::str::FromStr;

use crate::config::AppConfig;

/// Renders `file_name` from the templates under `migrations_dir` and executes it.
pub async fn run_migrations(
    db_pool: &sqlx::SqlitePool,
    migrations_dir: &str,
    file_name: &str,
) -> anyhow::Result<()> {
    let mut tera = tera::Tera::new(&format!("{}/**/*.sql", migrations_dir.trim_end_matches('/')))?;
    tera.autoescape_on(vec![".sql"]);

    let migration_query = tera
        .render(file_name, &tera::Context::new())
        .with_context(|| format!("failed to render migration {file_name}"))?;

    sqlx::query(&migration_query).execute(db_pool).await?;
    log::info!("migration {} applied", file_name);

    Ok(())
}

pub async fn setup_sqlite_db_pool(app_config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&app_config.db_host)?.create_if_missing(true);

    match app_config.db_pass_encrypt.as_deref() {
        Some(pass) if !pass.is_empty() => Ok(SqlitePool::connect_with(
            options
                .pragma("key", pass.to_string())
                .pragma("cipher_page_size", "1024")
                .pragma("kdf_iter", "64000")
                .pragma("cipher_hmac_algorithm", "HMAC_SHA1")
                .pragma("cipher_kdf_algorithm", "PBKDF2_HMAC_SHA1")
                .journal_mode(SqliteJournalMode::Delete),
        )
        .await?),
        _ => Ok(SqlitePool::connect_with(options.journal_mode(SqliteJournalMode::Wal)).await?),
    }
}
