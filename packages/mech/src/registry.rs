//! # Tab registry
//!
//! [`Mech`] opens tabs through a [`Launcher`] (one remote host per tab)
//! and addresses them by 1-based position or by name.

use crate::errors::{MechError, MechResult};
use crate::remote::RemoteHost;
use crate::tab::{Tab, TabConfig};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Host factory
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, config: &TabConfig) -> MechResult<Arc<dyn RemoteHost>>;
}

struct Entry {
    tab: Arc<Tab>,
    name: Option<String>,
}

/// Listing row for one open tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabInfo {
    pub index: usize,
    pub name: Option<String>,
    pub url: Option<Url>,
}

impl fmt::Display for TabInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.index, name)?,
            None => write!(f, "{}", self.index)?,
        }
        if let Some(url) = &self.url {
            write!(f, " {}", url)?;
        }
        Ok(())
    }
}

pub struct Mech {
    launcher: Arc<dyn Launcher>,
    config: TabConfig,
    tabs: Vec<Entry>,
}

impl Mech {
    pub fn new(launcher: Arc<dyn Launcher>, config: TabConfig) -> Self {
        Self {
            launcher,
            config,
            tabs: Vec::new(),
        }
    }

    /// Open a tab at `url`. A url without a scheme is taken as https.
    pub async fn open(&mut self, url: &str, name: Option<String>) -> MechResult<Arc<Tab>> {
        if let Some(name) = &name {
            self.ensure_unused(name)?;
        }
        let url = normalize_url(url)?;

        let host = self.launcher.launch(&self.config).await?;
        let tab = Arc::new(Tab::new(host, self.config.clone()));
        tab.goto(url).await?;

        self.tabs.push(Entry {
            tab: tab.clone(),
            name: name.clone(),
        });
        tracing::info!(
            "Opened tab {}",
            TabInfo {
                index: self.tabs.len(),
                name,
                url: tab.url(),
            }
        );
        Ok(tab)
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.tabs
            .iter()
            .enumerate()
            .map(|(i, entry)| TabInfo {
                index: i + 1,
                name: entry.name.clone(),
                url: entry.tab.url(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Look up a tab by 1-based index, falling back to its name
    pub fn resolve(&self, tab_ref: &str) -> MechResult<Arc<Tab>> {
        self.position(tab_ref).map(|i| self.tabs[i].tab.clone())
    }

    pub fn rename(&mut self, tab_ref: &str, name: impl Into<String>) -> MechResult<()> {
        let name = name.into();
        let index = self.position(tab_ref)?;
        if self.tabs[index].name.as_deref() != Some(name.as_str()) {
            self.ensure_unused(&name)?;
        }
        self.tabs[index].name = Some(name);
        Ok(())
    }

    /// Open a new tab at the location of an existing one
    pub async fn fork(&mut self, tab_ref: &str, name: Option<String>) -> MechResult<Arc<Tab>> {
        let url = self.resolve(tab_ref)?.url().ok_or(MechError::NotSynced)?;
        self.open(url.as_str(), name).await
    }

    pub fn close(&mut self, tab_ref: &str) -> MechResult<Arc<Tab>> {
        let index = self.position(tab_ref)?;
        let entry = self.tabs.remove(index);
        tracing::info!("Closed tab {}", index + 1);
        Ok(entry.tab)
    }

    fn position(&self, tab_ref: &str) -> MechResult<usize> {
        if let Ok(index) = tab_ref.parse::<usize>() {
            if index > 0 && index <= self.tabs.len() {
                return Ok(index - 1);
            }
        }
        self.tabs
            .iter()
            .position(|entry| entry.name.as_deref() == Some(tab_ref))
            .ok_or_else(|| MechError::TabNotFound(tab_ref.to_string()))
    }

    fn ensure_unused(&self, name: &str) -> MechResult<()> {
        if self.tabs.iter().any(|entry| entry.name.as_deref() == Some(name)) {
            return Err(MechError::NameInUse(name.to_string()));
        }
        Ok(())
    }
}

fn normalize_url(raw: &str) -> MechResult<Url> {
    if raw.contains("://") {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("https://{}", raw))?)
    }
}
