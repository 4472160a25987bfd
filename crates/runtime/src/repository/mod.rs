//! Persistent store for battle sessions and actor snapshots.
//!
//! Repositories handle data that CHANGES at runtime:
//! - Session rows (one per battle, used for recovery and reporting)
//! - Actor snapshots (serialized engine state written by the persistence sweep)
//!
//! Static game content (species, moves, items) is read through the cached
//! oracles, not repositories.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::{FileSessionRepository, FileSnapshotRepository};
pub use memory::{InMemorySessionRepository, InMemorySnapshotRepository};
pub use traits::{SessionRepository, SnapshotRepository};
pub use types::{ActorSnapshot, SessionRecord, SessionStatus};
