//! # Literal → Tree
//!
//! Objects become map nodes, arrays become list nodes, everything else a
//! scalar. The reserved attribute entry of each object is lifted out of
//! the data view into the node's [`Attributes`].

use crate::config::{LegacyKeyPolicy, ATTRIBUTE_KEY};
use crate::document::Container;
use crate::errors::{ParseError, ParseResult};
use crate::{Attributes, Config, Document, Path, Scalar, Value};
use indexmap::IndexMap;
use serde_json::Map;
use std::sync::Arc;

impl Document {
    /// Parse a literal into a new document with the default config
    pub fn parse(literal: &serde_json::Value) -> ParseResult<Self> {
        Self::parse_with(literal, Arc::new(Config::default()))
    }

    pub fn parse_with(literal: &serde_json::Value, config: Arc<Config>) -> ParseResult<Self> {
        let mut doc = Document::with_config(config);
        let placeholder = doc.root();

        match doc.import(literal)? {
            Value::Node(root) => {
                doc.set_root(root);
                doc.free_subtree(placeholder);
                Ok(doc)
            }
            Value::Scalar(scalar) => Err(ParseError::UnsupportedLiteral(format!(
                "document root must be an object or array, found {}",
                scalar.to_json()
            ))),
        }
    }

    pub fn from_json_str(source: &str) -> ParseResult<Self> {
        let literal: serde_json::Value = serde_json::from_str(source)?;
        Self::parse(&literal)
    }

    /// Build a detached subtree (or a scalar) from a literal.
    ///
    /// Nothing is left behind in the arena if parsing fails.
    pub fn import(&mut self, literal: &serde_json::Value) -> ParseResult<Value> {
        self.build(literal, &Path::root())
    }

    fn build(&mut self, literal: &serde_json::Value, path: &Path) -> ParseResult<Value> {
        match literal {
            serde_json::Value::Object(object) => self.build_map(object, path),
            serde_json::Value::Array(array) => {
                let list = self.alloc(Container::List(Vec::new()), Attributes::default());
                for (index, element) in array.iter().enumerate() {
                    let value = match self.build(element, &path.child(index)) {
                        Ok(value) => value,
                        Err(e) => {
                            self.free_subtree(list);
                            return Err(e);
                        }
                    };
                    self.attach_parsed(list, index.into(), value);
                }
                Ok(Value::Node(list))
            }
            scalar => Scalar::from_json(scalar)
                .map(Value::Scalar)
                .ok_or_else(|| ParseError::UnsupportedLiteral(scalar.to_string())),
        }
    }

    fn build_map(&mut self, object: &Map<String, serde_json::Value>, path: &Path) -> ParseResult<Value> {
        let config = self.config().clone();
        let attributes = extract_attributes(object, path, &config)?;

        let map = self.alloc(Container::Map(IndexMap::new()), attributes);
        for (key, literal) in object {
            if config.is_attribute_key(key) || config.is_legacy_key(key) {
                continue;
            }
            let value = match self.build(literal, &path.child(key)) {
                Ok(value) => value,
                Err(e) => {
                    self.free_subtree(map);
                    return Err(e);
                }
            };
            self.attach_parsed(map, key.into(), value);
        }
        Ok(Value::Node(map))
    }

    /// Attach during parse: no events, no hook
    fn attach_parsed(&mut self, owner: crate::NodeId, key: crate::Key, value: Value) {
        if let Value::Node(child) = &value {
            self.set_owner(*child, owner);
        }
        self.push_entry(owner, key, value);
    }
}

fn extract_attributes(
    object: &Map<String, serde_json::Value>,
    path: &Path,
    config: &Config,
) -> ParseResult<Attributes> {
    let record = object
        .get(&config.attribute_key)
        .or_else(|| object.get(ATTRIBUTE_KEY));
    if let Some(record) = record {
        return parse_attributes(record, path);
    }

    let legacy = object.iter().find(|(key, _)| config.is_legacy_key(key));
    let Some((key, record)) = legacy else {
        return Ok(Attributes::default());
    };

    match config.legacy_key_policy {
        LegacyKeyPolicy::Accept => parse_attributes(record, path),
        LegacyKeyPolicy::Reject => Err(ParseError::LegacyAttributeKey {
            path: path.clone(),
            key: key.clone(),
        }),
        LegacyKeyPolicy::Strip => {
            tracing::warn!("Dropping legacy attribute entry {:?} at {}", key, path);
            Ok(Attributes::default())
        }
    }
}

fn parse_attributes(record: &serde_json::Value, path: &Path) -> ParseResult<Attributes> {
    if !record.is_object() {
        return Err(ParseError::malformed(path.clone(), "attributes must be an object"));
    }
    serde_json::from_value(record.clone()).map_err(|e| ParseError::malformed(path.clone(), e.to_string()))
}
