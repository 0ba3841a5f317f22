//! # Remote Protocol
//!
//! The authoritative document lives in another execution context. The
//! driver reaches it through a [`RemoteHost`], which can evaluate a
//! [`RemoteCall`] against the live tree and publishes two signals:
//!
//! - content changed: the remote tree was mutated, by anyone
//! - navigation settled: a new document finished loading
//!
//! Calls are strictly request/response.

use crate::errors::{MechError, RemoteError};
use async_trait::async_trait;
use hypermap::{Key, Path};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;

/// An operation evaluated against the remote tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum RemoteCall {
    /// Serialized literal of the whole tree
    Serialize,

    Set {
        path: Path,
        key: Key,
        value: serde_json::Value,
    },

    /// `$` on the node at `path`; answers with a serialized `Outcome`
    Invoke {
        path: Path,
        key: Key,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<serde_json::Map<String, serde_json::Value>>,
    },

    Navigate {
        url: Url,
    },

    Location,
}

#[async_trait]
pub trait RemoteHost: Send + Sync {
    async fn evaluate(&self, call: RemoteCall) -> Result<serde_json::Value, RemoteError>;

    fn content_changed(&self) -> broadcast::Receiver<()>;

    fn navigation_settled(&self) -> broadcast::Receiver<Url>;
}

/// Wait for the next settled navigation on `receiver`
pub async fn settled(receiver: &mut broadcast::Receiver<Url>) -> Result<Url, MechError> {
    loop {
        match receiver.recv().await {
            Ok(url) => return Ok(url),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Skipped {} navigation signals", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return Err(MechError::NavigationClosed),
        }
    }
}
