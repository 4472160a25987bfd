//! Rows stored by the repository layer.

mod session;
mod snapshot;

pub use session::{SessionRecord, SessionStatus};
pub use snapshot::ActorSnapshot;
