//! # Inlet
//! A demonstration-grade, receive-only TCP text server built around a
//! hand-rolled reactor: two dedicated threads, each busy-polling its own
//! [`mio`]-backed poller with a short bounded timeout, instead of one thread
//! per connection.
//!
//! ## Architecture Overview
//! ```text
//! ┌────────────────┐   accept + register    ┌────────────────────┐
//! │  Accept Loop   │───────────────────────▶│ ConnectionRegistry │
//! │ (own poller)   │                        │ (read poller +     │
//! └────────────────┘                        │  connection table) │
//!                                           └─────────┬──────────┘
//!                                                     │ readable events
//!                                                     ▼
//!                                           ┌────────────────────┐
//!                                           │    Read Loop       │
//!                                           │ 1024-byte reads    │
//!                                           └─────────┬──────────┘
//!                                                     │ decoded text
//!                                                     ▼
//!                                           ┌────────────────────┐
//!                                           │     TextSink       │
//!                                           └────────────────────┘
//! ```
//!
//! The accept loop polls for pending connections, accepts them and registers
//! each one with the read poller for read interest; that registration call is
//! the only point of contact between the two threads. The read loop polls for
//! readable connections and drains each ready one with a single bounded read,
//! decoding the chunk as UTF-8 and forwarding it to the sink. The server
//! never writes back to a peer.
//!
//! ## Known limitation, kept on purpose
//! Connections are never deregistered. When a peer hangs up or a read fails,
//! the stream stays in the registry and will keep surfacing the same terminal
//! condition on later poll cycles. This mirrors the reference behavior this
//! server reproduces; the registry keeps stable per-connection tokens so a
//! cleanup path could be added without restructuring it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inlet::{Server, ServerConfig, StdoutSink};
//!
//! fn main() -> inlet::Result<()> {
//!     let server = Server::bind(ServerConfig::default(), StdoutSink)?;
//!     let handle = server.start()?;
//!     handle.join(); // runs until process termination
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod poll;
pub mod registry;
pub mod server;
pub mod sink;

pub use error::{Error, Result};
pub use registry::ConnectionRegistry;
pub use server::{Server, ServerConfig, ServerConfigBuilder, ServerHandle, READ_BUFFER_SIZE};
pub use sink::{decode_chunk, StdoutSink, TextSink};
