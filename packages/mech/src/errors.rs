use hypermap::{ParseError, TreeError};
use thiserror::Error;

/// Failure reported by, or while talking to, a remote host
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Remote call failed: {0}")]
    Invocation(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum MechError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Tab has not been synced yet")]
    NotSynced,

    #[error("Navigation channel closed before navigation settled")]
    NavigationClosed,

    #[error("Tab '{0}' not found")]
    TabNotFound(String),

    #[error("Tab name '{0}' already in use")]
    NameInUse(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type MechResult<T> = Result<T, MechError>;
