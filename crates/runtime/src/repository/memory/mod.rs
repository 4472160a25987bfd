//! In-memory repository implementations for tests and local runs.

mod session;
mod snapshot;

pub use session::InMemorySessionRepository;
pub use snapshot::InMemorySnapshotRepository;
