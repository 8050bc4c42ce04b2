//! The workspace coordinator: binds an archive to a datasource and
//! credentials, and serializes saves through a per-archive-ID FIFO
//! channel backed by a long-lived worker task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tokio::sync::{mpsc, oneshot};

use crate::archive::Archive;
use crate::comparator::Comparator;
use crate::config::Config;
use crate::credentials::Credentials;
use crate::datasource::Datasource;
use crate::error::Error;
use crate::merger::Merger;

/// A save request: the history to persist, the credentials to encrypt
/// under, the config supplying envelope parameters such as the PBKDF2
/// iteration count, an informational priority, and a stack tag for
/// introspection. Priority does not affect ordering — the channel is
/// strictly FIFO by enqueue order.
struct SaveRequest {
    datasource: Arc<dyn Datasource>,
    history: Vec<String>,
    credentials: Credentials,
    config: Config,
    #[allow(dead_code)]
    priority: i32,
    #[allow(dead_code)]
    stack: &'static str,
}

struct SaveTask {
    request: SaveRequest,
    reply: oneshot::Sender<Result<(), Error>>,
}

/// A FIFO save queue for a single archive ID, backed by a worker task
/// that runs one save at a time, replying to each caller in turn.
#[derive(Clone)]
struct SaveChannel {
    tx: mpsc::Sender<SaveTask>,
}

impl SaveChannel {
    fn spawn() -> SaveChannel {
        let (tx, mut rx) = mpsc::channel::<SaveTask>(64);

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                let result = task
                    .request
                    .datasource
                    .save(&task.request.history, &task.request.credentials, &task.request.config)
                    .await;
                if task.reply.send(result).is_err() {
                    tracing::warn!("save channel reply dropped; caller no longer listening");
                }
            }
            tracing::debug!("save channel worker exiting: all senders dropped");
        });

        return SaveChannel { tx };
    }

    async fn enqueue(&self, request: SaveRequest) -> Result<(), Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task = SaveTask { request, reply: reply_tx };
        self.tx
            .send(task)
            .await
            .map_err(|_| Error::InternalInvariant("save channel worker is gone".to_string()))?;
        return reply_rx
            .await
            .map_err(|_| Error::InternalInvariant("save channel dropped reply".to_string()))?;
    }
}

/// Process-wide registry of save channels, one per archive ID,
/// initialized lazily and never torn down: channels are long-lived for
/// the life of the process.
static SAVE_CHANNELS: Lazy<Mutex<HashMap<String, SaveChannel>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn channel_for(archive_id: &str) -> SaveChannel {
    let mut registry = SAVE_CHANNELS.lock().expect("save channel registry mutex poisoned");
    return registry.entry(archive_id.to_string()).or_insert_with(SaveChannel::spawn).clone();
}

/// Binds a current archive, its datasource, and master credentials, and
/// coordinates load/save/merge against that datasource.
pub struct Workspace {
    archive: Archive,
    datasource: Arc<dyn Datasource>,
    credentials: Credentials,
}

impl Workspace {
    /// Construct a workspace with no archive bound yet.
    pub fn new(archive: Archive, datasource: Arc<dyn Datasource>, credentials: Credentials) -> Workspace {
        return Workspace { archive, datasource, credentials };
    }

    /// Rebind the workspace to a different archive, datasource, and
    /// credentials set.
    pub fn set_archive(&mut self, archive: Archive, datasource: Arc<dyn Datasource>, credentials: Credentials) {
        self.archive = archive;
        self.datasource = datasource;
        self.credentials = credentials;
    }

    /// The archive currently bound to this workspace.
    pub fn archive(&self) -> &Archive {
        return &self.archive;
    }

    /// Replace the master credentials in memory. Takes effect on the
    /// next save or load; invalidates any cached decrypted content on
    /// non-text datasources so a payload decrypted under stale
    /// credentials is never read again.
    pub fn update_primary_credentials(&mut self, credentials: Credentials) {
        if !self.datasource.is_text() {
            self.datasource.clear_cache();
        }
        self.credentials = credentials;
    }

    /// Load the remote history, clearing any cached text buffer first so
    /// stale plaintext cannot masquerade as the freshly fetched remote
    /// copy, and build a staged archive from it without mutating local
    /// state.
    async fn load_remote_staged(&self) -> Result<Archive, Error> {
        if !self.datasource.is_text() {
            self.datasource.clear_cache();
        }
        let remote_history = self.datasource.load(&self.credentials).await?;
        return Archive::create_from_history(remote_history, self.archive.config());
    }

    /// Whether the remote history differs from the local one. Does not
    /// mutate local state.
    pub async fn local_differs_from_remote(&self) -> Result<bool, Error> {
        let remote = self.load_remote_staged().await?;
        let diff = Comparator::calculate_differences(&self.archive.history(), &remote.history());
        return Ok(Comparator::archives_differ(&diff));
    }

    /// Merge the local archive with the remote history, replacing the
    /// local archive with the merged result and returning it.
    pub async fn merge_from_remote(&mut self) -> Result<Archive, Error> {
        let remote_history = self.datasource.load(&self.credentials).await?;
        let merged = Merger::merge(&self.archive, &remote_history, self.archive.config())?;
        self.archive = merged.clone();
        return Ok(merged);
    }

    /// If the remote differs from local, merge it in; otherwise a no-op.
    pub async fn update(&mut self) -> Result<(), Error> {
        if self.local_differs_from_remote().await? {
            self.merge_from_remote().await?;
        }
        return Ok(());
    }

    /// Enqueue a save of the current archive history on its per-archive
    /// FIFO channel, awaiting the result. Clears the dirty bit on
    /// success; a failed save leaves it set so retry logic can replay.
    pub async fn save(&self) -> Result<(), Error> {
        return self.save_with(0, "saving").await;
    }

    /// As [`Workspace::save`], with an explicit informational priority
    /// and stack tag for introspection.
    pub async fn save_with(&self, priority: i32, stack: &'static str) -> Result<(), Error> {
        let archive_id = self.archive.id().unwrap_or_default();
        let channel = channel_for(&archive_id);
        let request = SaveRequest {
            datasource: self.datasource.clone(),
            history: self.archive.history(),
            credentials: self.credentials.clone(),
            config: self.archive.config(),
            priority,
            stack,
        };
        let result = channel.enqueue(request).await;
        if result.is_ok() {
            self.archive.clear_dirty_state();
        }
        return result;
    }
}
