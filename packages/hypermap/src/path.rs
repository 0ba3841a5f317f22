//! # Paths
//!
//! A path is the sequence of keys leading from the root to a node. Map
//! entries are named by string keys, list elements by index. The empty
//! path addresses the root.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{}", index),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Ordered sequence of keys from the root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Key>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    /// New path with `key` appended
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut path = self.clone();
        path.push(key);
        path
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.0.iter()
    }

    /// Split a slash separated path (`"todos/0/title"`) into raw segments.
    ///
    /// Every segment comes back as a name; whether a numeric segment
    /// indexes a list is decided during resolution, where the container
    /// kind is known.
    pub fn parse_slashed(input: &str) -> Self {
        input
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(Key::from)
            .collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for key in &self.0 {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = Key;
    type IntoIter = std::vec::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build a [`Path`] from mixed string and index segments.
///
/// ```
/// use hypermap::{path, Key};
///
/// let p = path!["todos", 0, "title"];
/// assert_eq!(p.keys()[1], Key::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::Path::from(vec![$($crate::path::segment($segment)),+])
    };
}

/// Segment conversion used by [`path!`]; integer literals become indices.
#[doc(hidden)]
pub fn segment<S: IntoSegment>(segment: S) -> Key {
    segment.into_segment()
}

#[doc(hidden)]
pub trait IntoSegment {
    fn into_segment(self) -> Key;
}

impl IntoSegment for &str {
    fn into_segment(self) -> Key {
        Key::Name(self.to_string())
    }
}

impl IntoSegment for String {
    fn into_segment(self) -> Key {
        Key::Name(self)
    }
}

impl IntoSegment for Key {
    fn into_segment(self) -> Key {
        self
    }
}

impl IntoSegment for usize {
    fn into_segment(self) -> Key {
        Key::Index(self)
    }
}

impl IntoSegment for i32 {
    fn into_segment(self) -> Key {
        // Negative literals cannot address anything; map them past any list
        Key::Index(usize::try_from(self).unwrap_or(usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_macro_mixes_segments() {
        let p = path!["todos", 0, "title"];
        assert_eq!(
            p.keys(),
            &[Key::from("todos"), Key::Index(0), Key::from("title")]
        );
        assert!(path![].is_root());
    }

    #[test]
    fn test_display() {
        assert_eq!(path!["todos", 1].to_string(), "/todos/1");
        assert_eq!(Path::root().to_string(), "/");
    }

    #[test]
    fn test_parse_slashed_skips_empty_segments() {
        let p = Path::parse_slashed("/one//two/3/");
        assert_eq!(p.len(), 3);
        assert_eq!(p.keys()[2], Key::from("3"));
    }

    #[test]
    fn test_serde_shape() {
        let p = path!["todos", 0];
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!(["todos", 0]));

        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
