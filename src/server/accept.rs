//! The accept half of the reactor.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::net::TcpListener;
use mio::{Events, Interest, Token};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::poll::PollHandle;
use crate::registry::ConnectionRegistry;
use crate::server::config::ServerConfig;

/// Token of the listening socket on the accept poller.
const LISTENER: Token = Token(0);

/// Owns the listening socket and a dedicated poller. Each iteration polls
/// with a short bounded timeout and, for each acceptable event, drains the
/// pending connections into the [`ConnectionRegistry`].
///
/// Failure to set up the listener is fatal; a failure during an individual
/// accept is logged and the loop keeps going.
pub struct AcceptLoop {
    listener: TcpListener,
    poll: PollHandle,
    events: Events,
    registry: Arc<ConnectionRegistry>,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl AcceptLoop {
    pub fn new(
        mut listener: TcpListener,
        registry: Arc<ConnectionRegistry>,
        running: Arc<AtomicBool>,
        config: &ServerConfig,
    ) -> Result<Self> {
        let poll = PollHandle::new()?;
        poll.register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(AcceptLoop {
            listener,
            poll,
            events: Events::with_capacity(config.events_capacity),
            registry,
            poll_timeout: config.poll_timeout,
            running,
        })
    }

    /// Runs until the shutdown flag is cleared or polling itself fails.
    pub fn run(self) -> Result<()> {
        let Self {
            mut listener,
            mut poll,
            mut events,
            registry,
            poll_timeout,
            running,
        } = self;

        while running.load(Ordering::SeqCst) {
            match poll.poll(&mut events, Some(poll_timeout)) {
                Ok(0) => continue,
                Ok(_) => {}
                Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            for event in events.iter() {
                if event.token() == LISTENER && event.is_readable() {
                    accept_pending(&mut listener, &registry);
                }
            }
        }
        Ok(())
    }
}

/// Accepts until the listener reports `WouldBlock`.
///
/// The reference selector is level-triggered and re-reports a backlog on the
/// next poll; mio's readiness is edge-triggered, so a single event must drain
/// every pending connection or the stragglers would never be accepted.
fn accept_pending(listener: &mut TcpListener, registry: &ConnectionRegistry) {
    loop {
        match listener.accept() {
            Ok((stream, peer_addr)) => match registry.register(stream) {
                Ok(token) => debug!(%peer_addr, ?token, "accepted connection"),
                Err(e) => warn!(%peer_addr, error = %e, "failed to register connection"),
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                warn!(error = %e, "accept failed");
                break;
            }
        }
    }
}
