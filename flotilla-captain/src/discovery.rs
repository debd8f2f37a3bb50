//! Serve-flag discovery file
//!
//! The captain writes one small JSON file describing its listen address
//! to a well-known path so out-of-process CLIs can find it without any
//! configuration. Written atomically on startup, removed on clean
//! shutdown.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use flotilla_core::now_ts;

/// Contents of the serve flag file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeFlag {
    pub host: String,
    pub port: u16,
    pub url: String,
    pub pid: u32,
    pub started_at: i64,
}

impl ServeFlag {
    /// Builds the flag for a bind address like `0.0.0.0:8080`.
    pub fn for_bind_addr(bind_addr: &str) -> anyhow::Result<Self> {
        let (host, port) = bind_addr
            .rsplit_once(':')
            .context("bind address has no port")?;
        let port: u16 = port.parse().context("bind address port is not a number")?;

        // A wildcard bind is reachable locally over loopback.
        let host = if host == "0.0.0.0" || host.is_empty() {
            "127.0.0.1"
        } else {
            host
        };

        Ok(Self {
            host: host.to_string(),
            port,
            url: format!("http://{}:{}", host, port),
            pid: std::process::id(),
            started_at: now_ts(),
        })
    }
}

/// Atomically writes the serve flag.
pub async fn write(path: &Path, flag: &ServeFlag) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(flag)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Removes the serve flag; a missing file is not an error.
pub async fn remove(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove serve flag {}: {}", path.display(), err);
        }
    }
}
