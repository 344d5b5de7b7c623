//! Session management
//!
//! A session is one continuous connection to a stream's source, from dial
//! to the reason it ended.

pub mod context;
pub mod runner;

pub use context::SessionContext;
pub use runner::Session;
