//! # Tab
//!
//! Driver-side handle on one remote host. The tab keeps a local mirror of
//! the remote tree: a parsed snapshot that is replaced wholesale on every
//! sync. The remote tree stays authoritative; the mirror may be dropped
//! and re-pulled at any time.

use crate::errors::{MechError, MechResult, RemoteError};
use crate::proxy::NodeProxy;
use crate::remote::{self, RemoteCall, RemoteHost};
use hypermap::{Document, Path};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{wrappers::ReceiverStream, Stream};
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfig {
    /// Re-pull the mirror whenever the remote content changes
    #[serde(default = "default_resync")]
    pub resync_on_content_changed: bool,

    /// Capacity of change notification channels
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

fn default_resync() -> bool {
    true
}

fn default_change_buffer() -> usize {
    16
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            resync_on_content_changed: default_resync(),
            change_buffer: default_change_buffer(),
        }
    }
}

/// Notification published by [`Tab::watch`]
#[derive(Debug, Clone)]
pub enum TabEvent {
    /// Remote content changed and the mirror was refreshed
    Synced(Arc<Document>),

    /// Remote content changed; the mirror was left as it was
    ContentChanged,
}

pub type TabEventStream = Pin<Box<dyn Stream<Item = MechResult<TabEvent>> + Send + 'static>>;

/// Latest snapshot and the sync that produced it
#[derive(Default)]
struct Mirror {
    sequence: u64,
    document: Option<Arc<Document>>,
}

pub struct Tab {
    host: Arc<dyn RemoteHost>,
    mirror: RwLock<Mirror>,
    syncs: AtomicU64,
    location: RwLock<Option<Url>>,
    config: TabConfig,
}

impl Tab {
    pub fn new(host: Arc<dyn RemoteHost>, config: TabConfig) -> Self {
        Self {
            host,
            mirror: RwLock::new(Mirror::default()),
            syncs: AtomicU64::new(0),
            location: RwLock::new(None),
            config,
        }
    }

    pub fn host(&self) -> &Arc<dyn RemoteHost> {
        &self.host
    }

    pub fn config(&self) -> &TabConfig {
        &self.config
    }

    /// Navigate the remote host, wait for the new document, then sync
    pub async fn goto(&self, url: Url) -> MechResult<Arc<Document>> {
        tracing::info!("Navigating to {}", url);

        let mut navigation = self.host.navigation_settled();
        self.host.evaluate(RemoteCall::Navigate { url }).await?;
        let settled = remote::settled(&mut navigation).await?;
        self.set_location(settled);

        self.sync_data().await
    }

    /// Location of the last settled navigation
    pub fn url(&self) -> Option<Url> {
        self.location.read().ok().and_then(|location| location.clone())
    }

    pub(crate) fn set_location(&self, url: Url) {
        if let Ok(mut location) = self.location.write() {
            *location = Some(url);
        }
    }

    /// Replace the mirror with the remote tree's current serialization.
    ///
    /// On failure the previous mirror is kept. Syncs are ordered by when
    /// they were issued: one that finishes after a later sync has already
    /// stored its snapshot is discarded, and the newer mirror is returned.
    pub async fn sync_data(&self) -> MechResult<Arc<Document>> {
        let sequence = self.syncs.fetch_add(1, Ordering::SeqCst) + 1;
        let literal = self.host.evaluate(RemoteCall::Serialize).await?;
        if literal.is_null() {
            return Err(RemoteError::Protocol("remote host has no document".to_string()).into());
        }
        let document = Arc::new(Document::parse(&literal)?);

        if let Ok(mut mirror) = self.mirror.write() {
            if let (true, Some(newer)) = (mirror.sequence > sequence, &mirror.document) {
                tracing::debug!("Discarding sync {} behind sync {}", sequence, mirror.sequence);
                return Ok(newer.clone());
            }
            mirror.sequence = sequence;
            mirror.document = Some(document.clone());
        }
        tracing::debug!("Synced mirror ({} nodes)", document.node_count());
        Ok(document)
    }

    /// Latest mirror, if the tab has synced at least once
    pub fn mirror(&self) -> Option<Arc<Document>> {
        self.mirror.read().ok().and_then(|mirror| mirror.document.clone())
    }

    /// Forwarding proxy on the root of the latest mirror
    pub fn root(self: &Arc<Self>) -> MechResult<NodeProxy> {
        let mirror = self.mirror().ok_or(MechError::NotSynced)?;
        let root = mirror.root();
        Ok(NodeProxy::new(self.clone(), mirror, root))
    }

    /// Proxy on the node at `path` in `snapshot`
    pub fn proxy_at(self: &Arc<Self>, snapshot: Arc<Document>, path: &Path) -> Option<NodeProxy> {
        let node = snapshot.at(snapshot.root(), path)?.as_node()?;
        Some(NodeProxy::new(self.clone(), snapshot, node))
    }

    /// Follow remote content changes.
    ///
    /// Spawns a task that resyncs the mirror on every change signal (when
    /// `resync_on_content_changed` is set) and publishes a [`TabEvent`].
    /// The task ends when the host goes away or the stream is dropped.
    pub fn watch(self: &Arc<Self>) -> TabEventStream {
        let (tx, rx) = mpsc::channel(self.config.change_buffer.max(1));
        let mut changes = self.host.content_changed();
        let tab = self.clone();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(()) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Coalesced {} content changes", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Content change channel closed");
                        break;
                    }
                }

                let event = if tab.config.resync_on_content_changed {
                    tab.sync_data().await.map(TabEvent::Synced)
                } else {
                    Ok(TabEvent::ContentChanged)
                };
                if let Err(e) = &event {
                    tracing::error!("Failed to resync after content change: {}", e);
                }

                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("url", &self.url().map(|u| u.to_string()))
            .field("synced", &self.mirror().is_some())
            .finish()
    }
}
