//! Thin wrapper around [`mio::Poll`].
//!
//! Two instances of [`PollHandle`] exist in a running server: one owned by
//! the accept loop and one owned by the read loop. Each loop polls its own
//! handle with a short bounded timeout instead of blocking indefinitely.

use std::time::Duration;

use mio::{Events, Interest, Poll, Registry, Token};

use crate::error::Result;

pub struct PollHandle {
    poller: Poll,
}

impl PollHandle {
    pub fn new() -> Result<Self> {
        Ok(PollHandle { poller: Poll::new()? })
    }

    /// Hands out an owned clone of the underlying registry so that another
    /// thread can register sources while this handle is mid-poll.
    pub fn registry(&self) -> Result<Registry> {
        Ok(self.poller.registry().try_clone()?)
    }

    pub fn register<S>(&self, src: &mut S, token: Token, interest: Interest) -> Result<()>
    where
        S: mio::event::Source + ?Sized,
    {
        src.register(self.poller.registry(), token, interest)?;
        Ok(())
    }

    pub fn poll(&mut self, events: &mut Events, timeout: Option<Duration>) -> Result<usize> {
        self.poller.poll(events, timeout)?;
        Ok(events.iter().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_poll_times_out_with_no_sources() {
        let mut poller = PollHandle::new().unwrap();
        let mut events = Events::with_capacity(1024);

        let start = Instant::now();
        let ready = poller
            .poll(&mut events, Some(Duration::from_millis(1)))
            .unwrap();

        assert_eq!(ready, 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_registry_clone() {
        let poller = PollHandle::new().unwrap();
        assert!(poller.registry().is_ok());
    }
}
