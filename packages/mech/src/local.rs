//! In-process remote host: a [`Page`] driven through [`RemoteCall`]s,
//! loading documents over a [`Transport`].

use crate::errors::{MechResult, RemoteError};
use crate::registry::Launcher;
use crate::remote::{RemoteCall, RemoteHost};
use crate::tab::TabConfig;
use async_trait::async_trait;
use hypermap::{BehaviorRegistry, Config, Outcome, Page, Transport, Value};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use url::Url;

pub struct LocalHost {
    page: Mutex<Option<Page>>,
    transport: Arc<dyn Transport>,
    behaviors: Arc<BehaviorRegistry>,
    config: Arc<Config>,
    content_changed: broadcast::Sender<()>,
    navigation_settled: broadcast::Sender<Url>,
}

fn invocation(e: impl std::fmt::Display) -> RemoteError {
    RemoteError::Invocation(e.to_string())
}

impl LocalHost {
    pub fn new(
        transport: Arc<dyn Transport>,
        behaviors: Arc<BehaviorRegistry>,
        config: Arc<Config>,
        capacity: usize,
    ) -> Self {
        let (content_changed, _) = broadcast::channel(capacity.max(1));
        let (navigation_settled, _) = broadcast::channel(capacity.max(1));
        Self {
            page: Mutex::new(None),
            transport,
            behaviors,
            config,
            content_changed,
            navigation_settled,
        }
    }

    /// Load `url` as the current page, replacing any previous one
    async fn navigate(&self, url: Url) -> Result<Url, RemoteError> {
        let mut page = Page::load(url, self.transport.clone(), self.behaviors.clone(), self.config.clone())
            .await
            .map_err(invocation)?;

        let changed = self.content_changed.clone();
        page.document_mut().set_content_changed_hook(move || {
            let _ = changed.send(());
        });

        let location = page.location().clone();
        *self.page.lock().await = Some(page);
        tracing::info!("Navigation settled at {}", location);

        let _ = self.navigation_settled.send(location.clone());
        let _ = self.content_changed.send(());
        Ok(location)
    }
}

#[async_trait]
impl RemoteHost for LocalHost {
    async fn evaluate(&self, call: RemoteCall) -> Result<serde_json::Value, RemoteError> {
        tracing::debug!("Evaluating {:?}", call);

        match call {
            RemoteCall::Serialize => {
                let page = self.page.lock().await;
                Ok(page
                    .as_ref()
                    .map(|page| page.document().serialize())
                    .unwrap_or(serde_json::Value::Null))
            }
            RemoteCall::Location => {
                let page = self.page.lock().await;
                Ok(page
                    .as_ref()
                    .map(|page| serde_json::Value::String(page.location().to_string()))
                    .unwrap_or(serde_json::Value::Null))
            }
            RemoteCall::Navigate { url } => {
                let location = self.navigate(url).await?;
                Ok(serde_json::Value::String(location.to_string()))
            }
            RemoteCall::Set { path, key, value } => {
                let mut guard = self.page.lock().await;
                let page = guard.as_mut().ok_or_else(|| invocation("no document loaded"))?;
                let doc = page.document_mut();
                let node = doc
                    .at(doc.root(), &path)
                    .and_then(|v| v.as_node())
                    .ok_or_else(|| invocation(format!("path {} is not a node", path)))?;
                let value: Value = doc.import(&value).map_err(invocation)?;
                doc.set(node, key, value).map_err(invocation)?;
                Ok(serde_json::Value::Null)
            }
            RemoteCall::Invoke { path, key, values } => {
                let outcome = {
                    let mut guard = self.page.lock().await;
                    let page = guard.as_mut().ok_or_else(|| invocation("no document loaded"))?;
                    let doc = page.document();
                    let node = doc
                        .at(doc.root(), &path)
                        .and_then(|v| v.as_node())
                        .ok_or_else(|| invocation(format!("path {} is not a node", path)))?;
                    page.invoke(node, key, values.as_ref()).await.map_err(invocation)?
                };

                if let Outcome::Navigate { url } = &outcome {
                    self.navigate(url.clone()).await?;
                }
                serde_json::to_value(&outcome).map_err(|e| RemoteError::Protocol(e.to_string()))
            }
        }
    }

    fn content_changed(&self) -> broadcast::Receiver<()> {
        self.content_changed.subscribe()
    }

    fn navigation_settled(&self) -> broadcast::Receiver<Url> {
        self.navigation_settled.subscribe()
    }
}

/// Launches a fresh [`LocalHost`] per tab, sharing transport and behaviors
#[derive(Clone)]
pub struct LocalLauncher {
    transport: Arc<dyn Transport>,
    behaviors: Arc<BehaviorRegistry>,
    config: Arc<Config>,
}

impl LocalLauncher {
    pub fn new(transport: Arc<dyn Transport>, behaviors: Arc<BehaviorRegistry>, config: Arc<Config>) -> Self {
        Self {
            transport,
            behaviors,
            config,
        }
    }
}

#[async_trait]
impl Launcher for LocalLauncher {
    async fn launch(&self, config: &TabConfig) -> MechResult<Arc<dyn RemoteHost>> {
        Ok(Arc::new(LocalHost::new(
            self.transport.clone(),
            self.behaviors.clone(),
            self.config.clone(),
            config.change_buffer,
        )))
    }
}
