//! # Mech
//!
//! Drive hypermap documents that live in another execution context.
//!
//! ```text
//!  driver                         remote host
//! ┌──────────────────┐  RemoteCall  ┌────────────────────┐
//! │ Tab              │ ───────────→ │ Page (authoritative│
//! │  └ mirror (Arc)  │ ←─────────── │       Document)    │
//! │ NodeProxy ─ set/$│  serialized  │                    │
//! └──────────────────┘  literal     └────────────────────┘
//!          ↑  content changed / navigation settled  │
//!          └────────────────────────────────────────┘
//! ```

pub mod errors;
pub mod local;
pub mod proxy;
pub mod registry;
pub mod remote;
pub mod tab;

pub use errors::{MechError, MechResult, RemoteError};
pub use local::{LocalHost, LocalLauncher};
pub use proxy::{NodeProxy, Proxied};
pub use registry::{Launcher, Mech, TabInfo};
pub use remote::{RemoteCall, RemoteHost};
pub use tab::{Tab, TabConfig, TabEvent, TabEventStream};
