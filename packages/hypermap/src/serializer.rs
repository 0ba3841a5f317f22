//! # Tree → Literal
//!
//! Inverse of the parser: maps become objects with the reserved
//! attribute entry written after the data entries (only when non-empty),
//! lists become arrays, scalars serialize as themselves.

use crate::config::ATTRIBUTE_KEY;
use crate::document::Container;
use crate::{Document, NodeId, Value};
use serde_json::Map;

impl Document {
    /// Snapshot of the whole tree
    pub fn serialize(&self) -> serde_json::Value {
        self.to_json(self.root())
    }

    /// Snapshot of one subtree; `null` for an unknown node
    pub fn to_json(&self, id: NodeId) -> serde_json::Value {
        let Some(data) = self.data(id) else {
            return serde_json::Value::Null;
        };

        match &data.container {
            Container::Map(map) => {
                let mut object = Map::with_capacity(map.len() + 1);
                for (key, value) in map {
                    object.insert(key.clone(), self.value_to_json(value));
                }
                if !data.attributes.is_empty() {
                    let attributes =
                        serde_json::to_value(&data.attributes).unwrap_or(serde_json::Value::Null);
                    object.insert(ATTRIBUTE_KEY.to_string(), attributes);
                }
                serde_json::Value::Object(object)
            }
            Container::List(list) => {
                serde_json::Value::Array(list.iter().map(|v| self.value_to_json(v)).collect())
            }
        }
    }

    pub fn value_to_json(&self, value: &Value) -> serde_json::Value {
        match value {
            Value::Scalar(scalar) => scalar.to_json(),
            Value::Node(id) => self.to_json(*id),
        }
    }

    /// Entries of a node without its own attributes: the submit body
    pub fn entries_json(&self, id: NodeId) -> serde_json::Value {
        match self.to_json(id) {
            serde_json::Value::Object(mut object) => {
                object.remove(ATTRIBUTE_KEY);
                serde_json::Value::Object(object)
            }
            other => other,
        }
    }

    pub fn to_string_pretty(&self, id: NodeId) -> String {
        serde_json::to_string_pretty(&self.to_json(id)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::{path, Config, Document};
    use serde_json::json;
    use std::sync::Arc;

    const TODO_SOURCE: &str = r#"{"completed":0,"todos":[{"title":"Buy milk","completed":false,"@":{"href":"1/"}}],"newTodo":{"title":"String","@":{"href":"","method":"POST"}}}"#;

    #[test]
    fn test_round_trip_preserves_order_and_attributes() {
        let doc = Document::from_json_str(TODO_SOURCE).unwrap();
        let serialized = doc.serialize().to_string();
        assert_eq!(serialized, TODO_SOURCE);

        let again = Document::from_json_str(&serialized).unwrap();
        assert_eq!(again.serialize().to_string(), serialized);
    }

    #[test]
    fn test_attributes_written_after_entries() {
        let doc = Document::parse(&json!({ "@": { "href": "/" }, "a": 1, "b": 2 })).unwrap();
        assert_eq!(doc.serialize().to_string(), r#"{"a":1,"b":2,"@":{"href":"/"}}"#);
    }

    #[test]
    fn test_empty_attributes_omitted() {
        let doc = Document::parse(&json!({ "@": {}, "a": [] })).unwrap();
        assert_eq!(doc.serialize(), json!({ "a": [] }));
    }

    #[test]
    fn test_entries_json_drops_own_attributes_only() {
        let doc = Document::from_json_str(TODO_SOURCE).unwrap();
        let new_todo = doc.at(doc.root(), &path!["newTodo"]).unwrap().as_node().unwrap();
        assert_eq!(doc.entries_json(new_todo), json!({ "title": "String" }));
        assert_eq!(
            doc.entries_json(doc.root())["todos"][0]["@"],
            json!({ "href": "1/" })
        );
    }

    #[test]
    fn test_custom_attribute_key_serializes_canonically() {
        let config = Config {
            attribute_key: "$attrs".to_string(),
            ..Config::default()
        };
        let literal = json!({ "link": { "$attrs": { "href": "1/" }, "title": "Buy milk" } });
        let doc = Document::parse_with(&literal, Arc::new(config)).unwrap();

        let serialized = doc.serialize();
        assert_eq!(serialized, json!({ "link": { "title": "Buy milk", "@": { "href": "1/" } } }));

        let mirror = Document::parse(&serialized).unwrap();
        let link = mirror.at(mirror.root(), &path!["link"]).unwrap().as_node().unwrap();
        assert_eq!(mirror.attributes(link).unwrap().href.as_deref(), Some("1/"));

        let reparsed = Document::parse_with(&serialized, doc.config().clone()).unwrap();
        assert_eq!(reparsed.serialize(), serialized);
    }
}
