//! # Attributes
//!
//! The reserved per-node record describing what a node does when used:
//! where it points (`href`), how it is requested (`method`), how the
//! response is applied (`rels`) and which behavior attaches to it
//! (`script`).

use serde::{Deserialize, Serialize};

pub const REL_TRANSCLUDE: &str = "transclude";

const DEFAULT_METHOD: &str = "get";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.href.is_none() && self.method.is_none() && self.rels.is_none() && self.script.is_none()
    }

    /// Request method, lowercased; `"get"` when absent
    pub fn method(&self) -> String {
        self.method
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_METHOD.to_string())
    }

    pub fn is_get(&self) -> bool {
        self.method() == DEFAULT_METHOD
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels
            .as_ref()
            .map(|rels| rels.iter().any(|r| r == rel))
            .unwrap_or(false)
    }

    pub fn is_transclusion(&self) -> bool {
        self.has_rel(REL_TRANSCLUDE)
    }

    /// A control is anything that can be used: it carries an href
    pub fn is_control(&self) -> bool {
        self.href.is_some()
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rels.get_or_insert_with(Vec::new).push(rel.into());
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_defaults_to_get() {
        let attrs = Attributes::default().with_href("/");
        assert_eq!(attrs.method(), "get");
        assert!(attrs.is_get());

        let post = attrs.with_method("POST");
        assert_eq!(post.method(), "post");
        assert!(!post.is_get());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<Attributes, _> = serde_json::from_value(json!({ "hrf": "/" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_types_rejected() {
        let result: Result<Attributes, _> = serde_json::from_value(json!({ "rels": "transclude" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_only_present_fields() {
        let attrs = Attributes::default().with_href("/counter/").with_rel("transclude");
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({ "href": "/counter/", "rels": ["transclude"] })
        );
        assert!(attrs.is_transclusion());
        assert!(Attributes::default().is_empty());
    }
}
