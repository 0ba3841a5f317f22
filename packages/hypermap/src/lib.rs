//! # Hypermap
//!
//! Path-addressable hypermedia documents: a tree of maps and lists whose
//! nodes carry `@` attributes that make them links, forms, transclusions
//! or script mount points.
//!
//! ```text
//! JSON literal ──parse──→ Document ──hydrate──→ Page
//!                           ↑   │                 │
//!                    import │   │ set/delete/...  │ fetch / $
//!                           │   ↓                 ↓
//!                     ChangeEvent bubbling    Transport
//! ```

pub mod path;
pub mod attributes;
pub mod behaviors;
pub mod config;
pub mod document;
pub mod errors;
pub mod events;
pub mod page;
pub mod transport;
pub mod value;
mod outline;
mod parser;
mod serializer;

pub use attributes::{Attributes, REL_TRANSCLUDE};
pub use behaviors::{Behavior, BehaviorRegistry};
pub use config::{Config, LegacyKeyPolicy, ATTRIBUTE_KEY, DEFAULT_CONFIG_NAME};
pub use document::{Document, NodeId, NodeKind, NodeRef};
pub use errors::{
    ActionError, ParseError, ParseResult, ScriptLoadError, TransportError, TreeError, TreeResult,
};
pub use events::{ChangeEvent, ContentChangedHook, Listener, ListenerId};
pub use page::{ActionState, Dispatch, Outcome, Page};
pub use path::{Key, Path};
pub use transport::{FetchResponse, Transport};
pub use value::{Scalar, Value};
