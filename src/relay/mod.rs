//! Stream supervision
//!
//! [`Relay`] owns the set of per-stream [`Supervisor`]s; each supervisor
//! runs sessions for one stream, one after another.

pub mod server;
pub mod supervisor;

pub use server::Relay;
pub use supervisor::{Supervisor, SupervisorState};
