//! Stream registry shared by supervisors, sessions and viewers
//!
//! The registry holds everything that outlives a single session: stream
//! configuration, the latest codec set, the last error, the viewer count,
//! the per-stream run claim, and the `tokio::sync::broadcast` channel used
//! to fan packets out.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌─────────────────────────┐
//!                     │ streams: HashMap<Name,  │
//!                     │   StreamEntry {         │
//!                     │     config, codecs,     │
//!                     │     tx: broadcast::Tx,  │
//!                     │     viewers, running,   │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Session]                [Viewer]                [Viewer]
//!    forward()                recv()                  recv()
//!         │                       ▲                       ▲
//!         └──► broadcast::send ───┴───────────────────────┘
//! ```
//!
//! Packet payloads are `bytes::Bytes`, so every viewer shares the same
//! allocation; the broadcast channel only clones the reference count.

pub mod config;
pub mod entry;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{RunClaim, StreamEntry, StreamStats, Viewer};
pub use store::StreamRegistry;
