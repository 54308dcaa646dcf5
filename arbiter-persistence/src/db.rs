//! Database connection setup, mirroring this codebase's own `db()` helper:
//! one environment-driven URL, one shared `Arc<Client>`.

use std::sync::Arc;
use tokio_postgres::Client;

/// Establish a database connection from the given URL. Returns an
/// `Arc<Client>` suitable for sharing across async tasks; the connection
/// future is driven on a spawned background task.
pub async fn connect(url: &str) -> Result<Arc<Client>, arbiter_core::CoreError> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .map_err(arbiter_core::CoreError::from)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::error!("database connection closed with error: {err}");
        }
    });
    Ok(Arc::new(client))
}
