//! Remote reconciliation: the remote store abstraction plus the engine
//! that drains pending local changes and pulls remote updates.

mod engine;
mod remote;

pub use engine::{SyncEngine, SyncProgress};
pub use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteError, RemoteResult, RemoteStore};
