//! Storage layer: remote table-store adapter, in-process local mirror, and
//! the sync policy that mediates between them.

pub mod local;
pub mod remote;
pub mod sync;

#[cfg(test)]
pub mod testing;

/// One wire row, as exchanged with the remote table store and held by the
/// local mirror.
pub type Row = serde_json::Map<String, serde_json::Value>;

pub use local::LocalStore;
pub use remote::{RemoteBackend, RemoteError, RestBackend};
pub use sync::{ConnectionState, DataStore};
