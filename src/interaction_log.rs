//! # Interaction Log Module
//!
//! Append-only record of completed interactions, kept as a single pretty
//! printed JSON array on disk. Every append rewrites the whole file.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One end-to-end request/response cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub chat_id: i64,
    pub user_query: String,
    pub quote: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionRecord {
    /// Create a record stamped with the current time
    pub fn new(
        chat_id: i64,
        user_query: impl Into<String>,
        quote: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            chat_id,
            user_query: user_query.into(),
            quote: quote.into(),
            author: author.into(),
            timestamp: Utc::now(),
        }
    }
}

/// JSON array file of interaction records
///
/// Appends from one process are serialized; concurrent writers in other
/// processes are not coordinated. Clones share the same lock.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, rewriting the file with the full array
    pub fn append(&self, record: &InteractionRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("interaction log lock poisoned"))?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open interaction log {}", self.path.display()))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read interaction log")?;

        let mut records = decode_records(&content)
            .with_context(|| format!("Failed to decode interaction log {}", self.path.display()))?;
        records.push(record.clone());

        let encoded =
            serde_json::to_string_pretty(&records).context("Failed to encode interaction log")?;

        file.seek(SeekFrom::Start(0))
            .context("Failed to rewind interaction log")?;
        file.set_len(0).context("Failed to truncate interaction log")?;
        file.write_all(encoded.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .context("Failed to write interaction log")?;

        info!(
            chat_id = record.chat_id,
            total_records = records.len(),
            "Interaction saved"
        );
        Ok(())
    }

    /// Append a record from async code
    ///
    /// The file work runs on the blocking thread pool.
    pub async fn save(&self, record: InteractionRecord) -> Result<()> {
        let log = self.clone();
        tokio::task::spawn_blocking(move || log.append(&record))
            .await
            .context("Interaction log writer task failed")?
    }

    /// Load every record currently in the log
    ///
    /// A missing or empty file holds zero records.
    pub fn read_all(&self) -> Result<Vec<InteractionRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Interaction log does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read interaction log {}", self.path.display())
                })
            }
        };

        decode_records(&content)
    }
}

fn decode_records(content: &str) -> Result<Vec<InteractionRecord>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(content)?)
}
