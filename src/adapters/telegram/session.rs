//! Persistent grammers session and client bootstrap.

use crate::domain::DomainError;
use grammers_client::{Client, SenderPool};
use grammers_session::storages::SqliteSession;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Open (or create) the SQLite session file, creating parent directories.
pub async fn open_file_session(path: &Path) -> Result<SqliteSession, DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::Io(format!("create session directory: {}", e)))?;
    }
    SqliteSession::open(path)
        .await
        .map_err(|e| DomainError::Io(format!("open session file: {}", e)))
}

/// Client over a persistent session. The sender pool runs on its own task.
pub async fn connect_client(session_path: &Path, api_id: i32) -> Result<Client, DomainError> {
    if api_id == 0 {
        return Err(DomainError::Config(
            "api_id is not set; get one from https://my.telegram.org".into(),
        ));
    }
    let session = Arc::new(open_file_session(session_path).await?);
    let pool = SenderPool::new(session, api_id);
    let handle = pool.handle.clone();
    tokio::spawn(async move {
        pool.runner.run().await;
    });
    info!(session = %session_path.display(), "telegram client ready");
    Ok(Client::new(handle))
}
