use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::{LookupError, Result, Vendedor};

/// Salesperson table keyed by cliente id, loaded from a JSON file.
///
/// The table is created explicitly and shared through the handler state.
/// A lookup made after `ttl` has elapsed re-reads the file first; when the
/// reload fails the previous snapshot keeps serving.
#[derive(Debug)]
pub struct VendedorDirectory {
    path: PathBuf,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
}

#[derive(Debug)]
struct Snapshot {
    by_cliente: HashMap<String, Vendedor>,
    loaded_at: Instant,
}

impl VendedorDirectory {
    /// Reads the file once; fails if it is missing or malformed.
    pub async fn load(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let path = path.into();
        let by_cliente = read_entries(&path).await?;
        tracing::info!(
            path = %path.display(),
            entries = by_cliente.len(),
            "vendedor directory loaded"
        );
        Ok(Self {
            path,
            ttl,
            snapshot: RwLock::new(Snapshot {
                by_cliente,
                loaded_at: Instant::now(),
            }),
        })
    }

    /// Re-reads the file and swaps the snapshot.
    pub async fn reload(&self) -> Result<()> {
        let by_cliente = read_entries(&self.path).await?;
        let mut snapshot = self.snapshot.write().await;
        snapshot.by_cliente = by_cliente;
        snapshot.loaded_at = Instant::now();
        Ok(())
    }

    /// Returns the vendedor for `cliente_id`, refreshing a stale snapshot first.
    pub async fn lookup(&self, cliente_id: &str) -> Option<Vendedor> {
        let stale = self.snapshot.read().await.loaded_at.elapsed() >= self.ttl;
        if stale {
            if let Err(err) = self.reload().await {
                tracing::warn!(
                    error = %err,
                    "vendedor directory reload failed, keeping previous entries"
                );
                // Push the next attempt a full TTL away.
                self.snapshot.write().await.loaded_at = Instant::now();
            }
        }
        self.snapshot
            .read()
            .await
            .by_cliente
            .get(cliente_id.trim())
            .cloned()
    }
}

async fn read_entries(path: &Path) -> Result<HashMap<String, Vendedor>> {
    let directory_error = |message: String| LookupError::Directory {
        path: path.display().to_string(),
        message,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| directory_error(err.to_string()))?;
    let entries: Vec<Vendedor> =
        serde_json::from_str(&content).map_err(|err| directory_error(err.to_string()))?;

    Ok(entries
        .into_iter()
        .map(|vendedor| (vendedor.cliente.trim().to_owned(), vendedor))
        .collect())
}
