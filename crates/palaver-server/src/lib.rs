//! Palaver chat server.
//!
//! A single-process, in-memory chat broker: clients connect over TCP,
//! authenticate against a flat credential file, and exchange broadcast,
//! direct, and group messages. Delivery is best-effort - no persistence, no
//! acknowledgments, no retries.
//!
//! # Architecture
//!
//! - [`CredentialStore`]: username → password map, read-only after load
//! - [`SessionRegistry`]: who is online; one lock domain
//! - [`GroupRegistry`]: named member sets; an independent lock domain
//! - [`Router`]: turns a parsed command into deliveries and error replies
//! - `connection`: per-connection task walking the
//!   authenticate → read → dispatch lifecycle
//! - [`Server`]: TCP accept loop spawning one handler task per connection
//!
//! All shared mutable state lives behind the two registries; components only
//! reach it through their synchronized operations, never through references
//! into the underlying maps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod credentials;
mod error;
mod groups;
mod registry;
mod router;
mod server;

pub use credentials::CredentialStore;
pub use error::ServerError;
pub use groups::{GroupError, GroupRegistry};
pub use registry::SessionRegistry;
pub use router::Router;
pub use server::{Server, ServerConfig};
