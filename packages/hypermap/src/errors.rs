//! Error types for the document tree and the action protocol

use crate::path::Path;
use crate::NodeId;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;
pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Malformed attributes at {path}: {message}")]
    MalformedAttributes { path: Path, message: String },

    #[error("Legacy attribute key {key:?} at {path} is not accepted")]
    LegacyAttributeKey { path: Path, key: String },

    #[error("Unsupported literal: {0}")]
    UnsupportedLiteral(String),
}

impl ParseError {
    pub fn malformed(path: Path, message: impl Into<String>) -> Self {
        Self::MalformedAttributes {
            path,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::Json(e.to_string())
    }
}

/// Structural and addressing failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Path {0} is not addressable")]
    NotAddressable(Path),

    #[error("Would create cycle: {child:?} is an ancestor of {target:?}")]
    Cycle { target: NodeId, child: NodeId },

    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is not a map")]
    NotAMap(NodeId),

    #[error("Node {0:?} is not a list")]
    NotAList(NodeId),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Too many redirects fetching {0}")]
    RedirectLoop(String),
}

/// A behavior named by a `script` attribute could not be attached
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptLoadError {
    #[error("No behavior registered for script {0}")]
    NotRegistered(String),

    #[error("Behavior {script} failed: {message}")]
    Failed { script: String, message: String },
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Node has no href")]
    NoHref,

    #[error("Invalid href {href:?}: {source}")]
    InvalidHref {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid request: {0}")]
    Request(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Loading {url} failed: {message}")]
    Load { url: String, message: String },

    #[error("Transclusion of {url} failed: {message}")]
    TransclusionFetch { url: String, message: String },

    #[error("Submit to {url} failed with status {status}")]
    Submit { url: String, status: u16 },

    #[error("Transclusion nesting exceeds {0} levels")]
    TransclusionDepth(usize),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}
