//! Server assembly: binds the listener, wires the two pollers together and
//! spawns the accept and read threads.

mod accept;
mod config;
mod read;

pub use self::config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_ADDR, DEFAULT_EVENTS_CAPACITY, DEFAULT_POLL_TIMEOUT,
    READ_BUFFER_SIZE,
};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use mio::net::TcpListener;
use tracing::{error, info};

use crate::error::Result;
use crate::poll::PollHandle;
use crate::registry::ConnectionRegistry;
use crate::sink::TextSink;

use self::accept::AcceptLoop;
use self::read::ReadLoop;

/// A bound but not yet running server.
///
/// [`Server::bind`] performs all the fallible startup work (bind, poller
/// creation, listener registration); [`Server::start`] only spawns the two
/// loop threads. Anything that fails in `bind` is fatal, matching the
/// fail-fast-at-startup policy.
pub struct Server {
    accept_loop: AcceptLoop,
    read_loop: ReadLoop,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl Server {
    pub fn bind<S>(config: ServerConfig, sink: S) -> Result<Self>
    where
        S: TextSink + 'static,
    {
        let listener = TcpListener::bind(config.addr)?;
        let local_addr = listener.local_addr()?;
        let running = Arc::new(AtomicBool::new(true));

        let read_poll = PollHandle::new()?;
        let registry = Arc::new(ConnectionRegistry::new(read_poll.registry()?));

        let accept_loop = AcceptLoop::new(
            listener,
            Arc::clone(&registry),
            Arc::clone(&running),
            &config,
        )?;
        let read_loop = ReadLoop::new(
            read_poll,
            Arc::clone(&registry),
            Box::new(sink),
            Arc::clone(&running),
            &config,
        );

        Ok(Server {
            accept_loop,
            read_loop,
            registry,
            running,
            local_addr,
        })
    }

    /// The address the listener actually bound to. Useful when binding
    /// port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the accept and read threads and hands back a handle to them.
    pub fn start(self) -> Result<ServerHandle> {
        let Server {
            accept_loop,
            read_loop,
            registry,
            running,
            local_addr,
        } = self;

        info!(addr = %local_addr, "listening");

        let accept = thread::Builder::new()
            .name("inlet-accept".into())
            .spawn(move || {
                if let Err(e) = accept_loop.run() {
                    error!(error = %e, "accept loop exited");
                }
            })?;

        let read = thread::Builder::new()
            .name("inlet-read".into())
            .spawn(move || {
                if let Err(e) = read_loop.run() {
                    error!(error = %e, "read loop exited");
                }
            })?;

        Ok(ServerHandle {
            local_addr,
            registry,
            running,
            accept,
            read,
        })
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    accept: JoinHandle<()>,
    read: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections ever registered. Connections are never removed,
    /// so this only grows.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Clears the shutdown flag and joins both loop threads. Each loop
    /// notices the flag within one poll timeout.
    pub fn shutdown(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.accept.join();
        let _ = self.read.join();
    }

    /// Blocks until both loop threads exit on their own. Without an external
    /// call to the shutdown flag they run until process termination.
    pub fn join(self) {
        let _ = self.accept.join();
        let _ = self.read.join();
    }
}
