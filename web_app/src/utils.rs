//! Helper functions shared by the webhook intake and the startup code.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use std::{str::FromStr, sync::LazyLock, time::Duration};

use crate::consts;

/// Opens the sqlite pool used by the persistent dedup backend.
///
/// When `pass_encrypt` is set the database is opened through sqlcipher.
pub async fn setup_sqlite_db_pool(
    db_host: &str,
    pass_encrypt: Option<&str>,
) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_host)?.create_if_missing(true);

    if let Some(pass) = pass_encrypt.filter(|pass| !pass.is_empty()) {
        return Ok(SqlitePool::connect_with(
            options
                .pragma("key", pass.to_string())
                .pragma("cipher_page_size", "1024")
                .pragma("kdf_iter", "64000")
                .pragma("cipher_hmac_algorithm", "HMAC_SHA1")
                .pragma("cipher_kdf_algorithm", "PBKDF2_HMAC_SHA1")
                .journal_mode(SqliteJournalMode::Delete),
        )
        .await?);
    }

    Ok(SqlitePool::connect_with(options.journal_mode(SqliteJournalMode::Wal)).await?)
}

fn build_request_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            logfire::error!(
                "Failed to build http client, requests have no timeout: {error}",
                error = e.to_string()
            );
            reqwest::Client::new()
        })
}

/// Client to make http requests
pub static REQUEST_CLIENT: LazyLock<reqwest::Client> =
    LazyLock::new(|| build_request_client(consts::HTTP_REQUEST_TIMEOUT));

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[ntex::test]
    async fn test_request_client_gives_up_on_stalled_server() {
        // Accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let client = build_request_client(Duration::from_millis(200));

        let error = client.get(url).send().await.unwrap_err();

        assert!(error.is_timeout());
        drop(listener);
    }
}
