//! rtsp-relay: on-demand stream supervisor and packet relay
//!
//! Keeps live connections to remote media sources and fans their packets
//! out to viewers. Each configured stream gets a supervisor that dials the
//! source, runs a session until it fails or goes quiet, then backs off and
//! redials. On-demand streams only connect while someone is watching.
//!
//! The relay does not speak a wire protocol itself: sources are reached
//! through a [`Transport`] implementation that hands back a
//! [`Connection`](transport::Connection).
//!
//! # Example
//!
//! ```no_run
//! use rtsp_relay::config::{RelayConfig, StreamConfig};
//! use rtsp_relay::error::TransportError;
//! use rtsp_relay::transport::{Connection, DialOptions, Transport};
//! use rtsp_relay::Relay;
//!
//! struct MyTransport;
//!
//! impl Transport for MyTransport {
//!     async fn dial(&self, options: DialOptions) -> Result<Connection, TransportError> {
//!         Err(TransportError::Connect(format!("cannot reach {}", options.url)))
//!     }
//! }
//!
//! # async fn example() -> rtsp_relay::error::Result<()> {
//! let config = RelayConfig::default()
//!     .stream("lobby", StreamConfig::new("rtsp://10.0.0.5/stream1"))
//!     .stream("garage", StreamConfig::new("rtsp://10.0.0.6/stream1").on_demand(true));
//!
//! let relay = Relay::from_config(config, MyTransport).await;
//! relay.serve_streams().await;
//!
//! let mut viewer = relay.subscribe("garage").await?;
//! while let Some(packet) = viewer.recv().await {
//!     println!("{} bytes", packet.size());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod registry;
pub mod relay;
pub mod session;
pub mod stats;
pub mod transport;

pub use config::{RelayConfig, StreamConfig, SupervisorConfig};
pub use error::{Error, Result};
pub use registry::{StreamRegistry, Viewer};
pub use relay::{Relay, Supervisor};
pub use transport::Transport;
