//! # Action Protocol
//!
//! A [`Page`] is a live document together with everything needed to act
//! on it: its location, a transport and the behavior registry.
//!
//! ## Action lifecycle
//!
//! ```text
//! Idle → Dispatch ─┬→ NavigationPending   (get, no transclude rel)
//!                  ├→ TransclusionPending (get + transclude rel)
//!                  └→ SubmitPending       (any other method)
//!                                ↓
//!                        Resolved | Failed
//! ```
//!
//! Dispatch is decided from the node's attributes alone, before anything
//! is awaited. Callers that wait for navigation must look at the
//! [`Dispatch`] first: a transclusion never navigates.

use crate::behaviors::BehaviorRegistry;
use crate::errors::{ActionError, TreeError};
use crate::transport::{self, Transport};
use crate::{Config, Document, Key, NodeId, Value};
use http::header::CONTENT_TYPE;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    Dispatch,
    NavigationPending,
    TransclusionPending,
    SubmitPending,
    Resolved,
    Failed,
}

/// What using a node will do, decided from its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Navigate(Url),
    Transclude(Url),
    Submit { url: Url, method: Method },
}

impl Dispatch {
    pub fn state(&self) -> ActionState {
        match self {
            Dispatch::Navigate(_) => ActionState::NavigationPending,
            Dispatch::Transclude(_) => ActionState::TransclusionPending,
            Dispatch::Submit { .. } => ActionState::SubmitPending,
        }
    }

    /// Whether the host may navigate as a result
    pub fn may_navigate(&self) -> bool {
        !matches!(self, Dispatch::Transclude(_))
    }
}

/// How an action resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// The host should navigate to `url`; the current tree is now moot
    Navigate { url: Url },
    Transcluded,
    Submitted,
}

pub struct Page {
    document: Document,
    location: Url,
    transport: Arc<dyn Transport>,
    behaviors: Arc<BehaviorRegistry>,
}

impl Page {
    pub fn new(
        document: Document,
        location: Url,
        transport: Arc<dyn Transport>,
        behaviors: Arc<BehaviorRegistry>,
    ) -> Self {
        Self {
            document,
            location,
            transport,
            behaviors,
        }
    }

    /// Fetch, parse and hydrate the document at `location`
    pub async fn load(
        location: Url,
        transport: Arc<dyn Transport>,
        behaviors: Arc<BehaviorRegistry>,
        config: Arc<Config>,
    ) -> Result<Self, ActionError> {
        tracing::info!("Loading {}", location);

        let request = transport::get(&location).map_err(|e| ActionError::Request(e.to_string()))?;
        let response = transport.fetch(request).await?;
        if !response.is_success() {
            return Err(ActionError::Load {
                url: location.to_string(),
                message: format!("status {}", response.status),
            });
        }
        let literal = response.parse_body().map_err(|e| ActionError::Load {
            url: location.to_string(),
            message: e.to_string(),
        })?;

        let document = Document::parse_with(&literal, config)?;
        let mut page = Page::new(document, response.url, transport, behaviors);
        page.hydrate().await?;
        Ok(page)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn config(&self) -> &Arc<Config> {
        self.document.config()
    }

    /// Resolve an href against the page location
    pub fn resolve(&self, href: &str) -> Result<Url, ActionError> {
        self.location.join(href).map_err(|source| ActionError::InvalidHref {
            href: href.to_string(),
            source,
        })
    }

    pub fn dispatch(&self, node: NodeId) -> Result<Dispatch, ActionError> {
        let attributes = self
            .document
            .attributes(node)
            .ok_or(TreeError::UnknownNode(node))?;
        let href = attributes.href.as_deref().ok_or(ActionError::NoHref)?;
        let url = self.resolve(href)?;

        if attributes.is_get() {
            if attributes.is_transclusion() {
                Ok(Dispatch::Transclude(url))
            } else {
                Ok(Dispatch::Navigate(url))
            }
        } else {
            let method = Method::from_bytes(attributes.method().to_ascii_uppercase().as_bytes())
                .map_err(|e| ActionError::Request(e.to_string()))?;
            Ok(Dispatch::Submit { url, method })
        }
    }

    /// Use a node: follow its link, refresh its transclusion or submit it
    pub async fn fetch(&mut self, node: NodeId) -> Result<Outcome, ActionError> {
        let path = self.document.path(node);
        tracing::debug!(state = ?ActionState::Dispatch, "fetch {}", path);

        let result = match self.dispatch(node)? {
            Dispatch::Navigate(url) => {
                tracing::debug!(state = ?ActionState::NavigationPending, "navigate to {}", url);
                Ok(Outcome::Navigate { url })
            }
            Dispatch::Transclude(url) => {
                tracing::debug!(state = ?ActionState::TransclusionPending, "transclude {}", url);
                self.transclude(node, url).await.map(|_| Outcome::Transcluded)
            }
            Dispatch::Submit { url, method } => {
                tracing::debug!(state = ?ActionState::SubmitPending, "{} {}", method, url);
                self.submit(node, url, method).await
            }
        };

        match &result {
            Ok(outcome) => tracing::debug!(state = ?ActionState::Resolved, "{} → {:?}", path, outcome),
            Err(e) => tracing::debug!(state = ?ActionState::Failed, "{} → {}", path, e),
        }
        result
    }

    /// Replace the node's contents with the document at its href
    pub async fn fetch_transclusion(&mut self, node: NodeId) -> Result<(), ActionError> {
        let href = self
            .document
            .attributes(node)
            .ok_or(TreeError::UnknownNode(node))?
            .href
            .clone()
            .ok_or(ActionError::NoHref)?;
        let url = self.resolve(&href)?;
        self.transclude(node, url).await
    }

    async fn transclude(&mut self, node: NodeId, url: Url) -> Result<(), ActionError> {
        let failed = |message: String| ActionError::TransclusionFetch {
            url: url.to_string(),
            message,
        };

        let request = transport::get(&url).map_err(|e| ActionError::Request(e.to_string()))?;
        let response = self
            .transport
            .fetch(request)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.is_success() {
            return Err(failed(format!("status {}", response.status)));
        }
        let literal = response.parse_body().map_err(|e| failed(e.to_string()))?;

        let fresh = match self.document.import(&literal)? {
            Value::Node(fresh) => fresh,
            Value::Scalar(_) => return Err(failed("response is not a map or list".to_string())),
        };
        self.document.replace_contents(node, fresh)?;

        tracing::info!("Transcluded {} into {}", url, self.document.path(node));
        Ok(())
    }

    async fn submit(&mut self, node: NodeId, url: Url, method: Method) -> Result<Outcome, ActionError> {
        let body = self.document.entries_json(node).to_string();
        let request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(CONTENT_TYPE, self.config().submit_content_type.as_str())
            .body(body)
            .map_err(|e| ActionError::Request(e.to_string()))?;

        let response = self.transport.fetch(request).await?;
        if !response.is_success() {
            return Err(ActionError::Submit {
                url: url.to_string(),
                status: response.status.as_u16(),
            });
        }

        if response.redirected {
            tracing::info!("Submit to {} redirected to {}", url, response.url);
            Ok(Outcome::Navigate { url: response.url })
        } else {
            Ok(Outcome::Submitted)
        }
    }

    /// One-time activation after load: attach behaviors and resolve eager
    /// transclusions, depth first.
    ///
    /// Behavior failures are logged and skipped. Transclusion failures
    /// abort hydration.
    pub async fn hydrate(&mut self) -> Result<(), ActionError> {
        let max_depth = self.config().max_transclusion_depth;
        let mut stack = vec![(self.document.root(), 0usize)];

        while let Some((node, mut depth)) = stack.pop() {
            // A behavior may have removed part of the tree
            let Some(attributes) = self.document.attributes(node).cloned() else {
                continue;
            };

            if let Some(script) = &attributes.script {
                if let Err(e) = self.behaviors.attach(script, &mut self.document, node) {
                    tracing::warn!("Error attaching script at {}: {}", self.document.path(node), e);
                }
            }

            if attributes.is_transclusion() {
                if depth >= max_depth {
                    return Err(ActionError::TransclusionDepth(max_depth));
                }
                self.fetch_transclusion(node).await?;
                depth += 1;
            }

            for child in self.document.children(node).into_iter().rev() {
                stack.push((child, depth));
            }
        }

        Ok(())
    }

    /// The `$` operation: optionally overwrite entries of the child at
    /// `key`, then use it.
    pub async fn invoke(
        &mut self,
        node: NodeId,
        key: impl Into<Key>,
        values: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<Outcome, ActionError> {
        let key = key.into();
        let child = self
            .document
            .get(node, &key)
            .and_then(Value::as_node)
            .ok_or_else(|| TreeError::NotAddressable(self.document.path(node).child(key.clone())))?;

        if let Some(values) = values {
            for (name, literal) in values {
                let value = self.document.import(literal)?;
                self.document.set(child, name.as_str(), value)?;
            }
        }

        self.fetch(child).await
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("location", &self.location.as_str())
            .field("document", &self.document)
            .field("behaviors", &self.behaviors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchResponse, TransportError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubTransport {
        routes: HashMap<String, serde_json::Value>,
        redirect_posts_to: Option<String>,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl StubTransport {
        fn route(mut self, url: &str, body: serde_json::Value) -> Self {
            self.routes.insert(url.to_string(), body);
            self
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn fetch(&self, request: http::Request<String>) -> Result<FetchResponse, TransportError> {
            let url = Url::parse(&request.uri().to_string()).map_err(|e| TransportError::Network(e.to_string()))?;
            self.seen.lock().unwrap().push((
                request.method().to_string(),
                url.to_string(),
                request.body().clone(),
            ));

            if request.method() != Method::GET {
                return Ok(match &self.redirect_posts_to {
                    Some(target) => FetchResponse::redirected_to(Url::parse(target).unwrap(), "{}"),
                    None => FetchResponse::ok(url, "{}"),
                });
            }

            match self.routes.get(url.as_str()) {
                Some(body) => Ok(FetchResponse::json(url, body)),
                None => Ok(FetchResponse::status(url, http::StatusCode::NOT_FOUND)),
            }
        }
    }

    fn page(literal: serde_json::Value, transport: StubTransport) -> (Page, Arc<StubTransport>) {
        let transport = Arc::new(transport);
        let page = Page::new(
            Document::parse(&literal).unwrap(),
            Url::parse("http://localhost/").unwrap(),
            transport.clone(),
            Arc::new(BehaviorRegistry::new()),
        );
        (page, transport)
    }

    #[test]
    fn test_dispatch_from_attributes() {
        let (page, _) = page(
            json!({
                "link": {"@": {"href": "1/"}},
                "counter": {"@": {"href": "/counter/", "rels": ["transclude"]}},
                "form": {"@": {"href": "", "method": "post"}},
                "plain": {}
            }),
            StubTransport::default(),
        );
        let doc = page.document();
        let node = |key: &str| doc.get(doc.root(), &key.into()).and_then(Value::as_node).unwrap();

        assert_eq!(
            page.dispatch(node("link")).unwrap(),
            Dispatch::Navigate(Url::parse("http://localhost/1/").unwrap())
        );
        let transclude = page.dispatch(node("counter")).unwrap();
        assert_eq!(transclude.state(), ActionState::TransclusionPending);
        assert!(!transclude.may_navigate());
        assert_eq!(
            page.dispatch(node("form")).unwrap(),
            Dispatch::Submit {
                url: Url::parse("http://localhost/").unwrap(),
                method: Method::POST
            }
        );
        assert!(matches!(page.dispatch(node("plain")), Err(ActionError::NoHref)));
    }

    #[tokio::test]
    async fn test_fetch_link_does_not_touch_network() {
        let (mut page, transport) = page(json!({"link": {"@": {"href": "1/"}}}), StubTransport::default());
        let outcome = page.invoke(page.document().root(), "link", None).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Navigate {
                url: Url::parse("http://localhost/1/").unwrap()
            }
        );
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transclusion_keeps_attributes() {
        let (mut page, _) = page(
            json!({"counter": {"@": {"href": "/counter/", "rels": ["transclude"]}}}),
            StubTransport::default().route("http://localhost/counter/", json!({"count": 0})),
        );
        let root = page.document().root();
        let outcome = page.invoke(root, "counter", None).await.unwrap();
        assert_eq!(outcome, Outcome::Transcluded);

        let doc = page.document();
        assert_eq!(doc.at_str(root, "counter/count").unwrap(), 0);
        let counter = doc.at_str(root, "counter").and_then(|v| v.as_node()).unwrap();
        assert!(doc.attributes(counter).unwrap().is_transclusion());
    }

    #[tokio::test]
    async fn test_transclusion_error_status() {
        let (mut page, _) = page(
            json!({"missing": {"@": {"href": "/nowhere/", "rels": ["transclude"]}}}),
            StubTransport::default(),
        );
        let root = page.document().root();
        let err = page.invoke(root, "missing", None).await.unwrap_err();
        assert!(matches!(err, ActionError::TransclusionFetch { .. }));
    }

    #[tokio::test]
    async fn test_submit_sends_entries_and_follows_redirect() {
        let transport = StubTransport {
            redirect_posts_to: Some("http://localhost/".to_string()),
            ..Default::default()
        };
        let (mut page, transport) = page(
            json!({"newTodo": {"title": "String", "@": {"href": "", "method": "POST"}}}),
            transport,
        );
        let root = page.document().root();
        let values = json!({"title": "Buy cheese"});
        let outcome = page.invoke(root, "newTodo", values.as_object()).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Navigate {
                url: Url::parse("http://localhost/").unwrap()
            }
        );
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].0, "POST");
        assert_eq!(seen[0].2, r#"{"title":"Buy cheese"}"#);
    }

    #[tokio::test]
    async fn test_submit_without_redirect() {
        let (mut page, _) = page(
            json!({"form": {"@": {"href": "/save/", "method": "put"}}}),
            StubTransport::default(),
        );
        let root = page.document().root();
        assert_eq!(page.invoke(root, "form", None).await.unwrap(), Outcome::Submitted);
    }

    #[tokio::test]
    async fn test_invoke_scalar_is_not_addressable() {
        let (mut page, _) = page(json!({"completed": 0}), StubTransport::default());
        let root = page.document().root();
        let err = page.invoke(root, "completed", None).await.unwrap_err();
        assert!(matches!(err, ActionError::Tree(TreeError::NotAddressable(_))));
    }

    #[tokio::test]
    async fn test_hydrate_bounds_transclusion_depth() {
        let nested = json!({"inner": {"@": {"href": "/loop/", "rels": ["transclude"]}}});
        let (mut page, _) = page(
            nested.clone(),
            StubTransport::default().route("http://localhost/loop/", nested),
        );
        let err = page.hydrate().await.unwrap_err();
        assert!(matches!(err, ActionError::TransclusionDepth(8)));
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = Outcome::Navigate {
            url: Url::parse("http://localhost/1/").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"outcome": "navigate", "url": "http://localhost/1/"})
        );
        let back: Outcome = serde_json::from_value(json!({"outcome": "submitted"})).unwrap();
        assert_eq!(back, Outcome::Submitted);
    }
}
