//! The shared set of accepted connections.
//!
//! [`ConnectionRegistry`] is the only object shared between the accept loop
//! and the read loop: the accept loop feeds freshly accepted streams into it,
//! the read loop looks streams up by token when the read poller reports them
//! readable. Poller registration and table insertion happen under one
//! critical section, so a connection is never visible to the read loop
//! half-registered, and a registration takes effect no later than the next
//! poll cycle.
//!
//! There is deliberately no deregistration path: once a connection is
//! registered it stays in the table for the lifetime of the process, even
//! after the peer hangs up. See the crate docs for why this limitation is
//! preserved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::error::{Error, Result};

/// Tokens handed to client connections start here; `Token(0)` belongs to the
/// listening socket on the accept poller.
const FIRST_CLIENT_TOKEN: usize = 1;

pub struct ConnectionRegistry {
    registry: Registry,
    connections: Mutex<HashMap<Token, TcpStream>>,
    next_token: AtomicUsize,
}

impl ConnectionRegistry {
    /// `registry` must be a clone of the read poller's registry.
    pub fn new(registry: Registry) -> Self {
        ConnectionRegistry {
            registry,
            connections: Mutex::new(HashMap::new()),
            next_token: AtomicUsize::new(FIRST_CLIENT_TOKEN),
        }
    }

    /// Registers an accepted stream for read interest and takes ownership of
    /// it. Callable from the accept thread while the read thread is
    /// mid-poll.
    pub fn register(&self, mut stream: TcpStream) -> Result<Token> {
        let token = Token(self.next_token.fetch_add(1, Ordering::SeqCst));
        let mut connections = self.connections.lock().map_err(|_| Error::PoisonedLock)?;
        self.registry
            .register(&mut stream, token, Interest::READABLE)?;
        connections.insert(token, stream);
        Ok(token)
    }

    /// Runs `f` with mutable access to the stream behind `token`, if it is
    /// still known. Returns `None` for unknown tokens.
    pub fn with_stream<R>(&self, token: Token, f: impl FnOnce(&mut TcpStream) -> R) -> Result<Option<R>> {
        let mut connections = self.connections.lock().map_err(|_| Error::PoisonedLock)?;
        Ok(connections.get_mut(&token).map(f))
    }

    /// Re-arms read interest for `token`. Idempotent; unknown tokens are
    /// ignored. Under edge-triggered polling this is what makes a socket
    /// with bytes still pending surface again on the next cycle.
    pub fn rearm(&self, token: Token) -> Result<()> {
        let mut connections = self.connections.lock().map_err(|_| Error::PoisonedLock)?;
        if let Some(stream) = connections.get_mut(&token) {
            self.registry
                .reregister(stream, token, Interest::READABLE)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollHandle;
    use std::net::TcpListener as StdTcpListener;

    fn connected_stream(listener: &StdTcpListener) -> TcpStream {
        TcpStream::connect(listener.local_addr().unwrap()).unwrap()
    }

    #[test]
    fn test_tokens_are_unique_and_table_grows() {
        let poller = PollHandle::new().unwrap();
        let registry = ConnectionRegistry::new(poller.registry().unwrap());
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();

        let first = registry.register(connected_stream(&listener)).unwrap();
        let second = registry.register(connected_stream(&listener)).unwrap();

        assert_ne!(first, second);
        assert!(first.0 >= FIRST_CLIENT_TOKEN);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_rearm_ignores_unknown_token() {
        let poller = PollHandle::new().unwrap();
        let registry = ConnectionRegistry::new(poller.registry().unwrap());

        assert!(registry.rearm(Token(42)).is_ok());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_with_stream_on_unknown_token() {
        let poller = PollHandle::new().unwrap();
        let registry = ConnectionRegistry::new(poller.registry().unwrap());

        let seen = registry.with_stream(Token(7), |_| ()).unwrap();
        assert!(seen.is_none());
    }
}
