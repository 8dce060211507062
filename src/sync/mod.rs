//! Synchronization policy between memory, local cache and remote
//!
//! The store never blocks on the network for an edit: memory and the local
//! cache are written synchronously, remote writes go through a debounced
//! [`WriteQueue`] that is pumped by the owner of the store.

pub mod clock;
pub mod policy;
pub mod queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{is_stale, reconcile, Channel, DebouncePolicy, Freshness, Winner};
pub use queue::WriteQueue;
