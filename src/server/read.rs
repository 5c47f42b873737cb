//! The read half of the reactor.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::Events;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::poll::PollHandle;
use crate::registry::ConnectionRegistry;
use crate::server::config::{ServerConfig, READ_BUFFER_SIZE};
use crate::sink::{decode_chunk, TextSink};

/// Owns the read poller that the accept loop feeds through the
/// [`ConnectionRegistry`]. Each iteration polls with a short bounded timeout
/// and, for each readable connection, performs exactly one read into a fixed
/// scratch buffer, decodes the filled region as text and emits it to the
/// sink. It never blocks waiting on a single connection.
///
/// End-of-stream and per-read I/O errors do not tear the connection down;
/// the stream stays registered and may surface the same condition on later
/// cycles. Malformed text, on the other hand, is fatal to this loop.
pub struct ReadLoop {
    poll: PollHandle,
    events: Events,
    registry: Arc<ConnectionRegistry>,
    sink: Box<dyn TextSink>,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl ReadLoop {
    /// `poll` must be the poller whose registry backs `registry`.
    pub fn new(
        poll: PollHandle,
        registry: Arc<ConnectionRegistry>,
        sink: Box<dyn TextSink>,
        running: Arc<AtomicBool>,
        config: &ServerConfig,
    ) -> Self {
        ReadLoop {
            poll,
            events: Events::with_capacity(config.events_capacity),
            registry,
            sink,
            poll_timeout: config.poll_timeout,
            running,
        }
    }

    /// Runs until the shutdown flag is cleared, polling fails, or a chunk
    /// fails to decode.
    pub fn run(self) -> Result<()> {
        let Self {
            mut poll,
            mut events,
            registry,
            mut sink,
            poll_timeout,
            running,
        } = self;

        // Scratch space reused for every read event; nothing is buffered
        // across events.
        let mut buf = [0u8; READ_BUFFER_SIZE];

        while running.load(Ordering::SeqCst) {
            match poll.poll(&mut events, Some(poll_timeout)) {
                Ok(0) => continue,
                Ok(_) => {}
                Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }

            for event in events.iter() {
                if !event.is_readable() {
                    continue;
                }
                let token = event.token();

                // One bounded read per event. A connection with more than a
                // buffer's worth pending is reported again after the re-arm
                // below.
                let outcome = registry.with_stream(token, |stream| stream.read(&mut buf))?;
                let Some(read) = outcome else { continue };

                match read {
                    Ok(0) => {
                        // Peer is gone. The connection stays registered and
                        // will keep reporting end-of-stream; see the crate
                        // docs on the missing cleanup path.
                        trace!(?token, "end of stream");
                    }
                    Ok(n) => {
                        let text = decode_chunk(&buf[..n])?;
                        sink.emit(text);
                        trace!(?token, bytes = n, "emitted chunk");
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => debug!(?token, error = %e, "read failed"),
                }

                registry.rearm(token)?;
            }
        }
        Ok(())
    }
}
