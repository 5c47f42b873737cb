//! Chunk decoding and the output sink.
//!
//! The read loop hands every chunk it pulls off a connection to
//! [`decode_chunk`] and forwards the resulting text to a [`TextSink`]. The
//! sink is the replaceable collaborator of the server: the binary uses
//! [`StdoutSink`], the end-to-end tests use a channel-backed sink.

use std::io::{self, Write};

use crate::error::Result;

/// Decodes one chunk of bytes read off a connection as UTF-8.
///
/// Malformed input is not recovered from; the error propagates and is fatal
/// to the read loop.
pub fn decode_chunk(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

/// Receives each decoded chunk of inbound text.
pub trait TextSink: Send {
    fn emit(&mut self, text: &str);
}

/// Sink used by the binary: writes each chunk to standard output, one line
/// per chunk. Write failures on stdout are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl TextSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.write_all(b"\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSink(Vec<String>);

    impl TextSink for VecSink {
        fn emit(&mut self, text: &str) {
            self.0.push(text.to_owned());
        }
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_chunk(b"hello").unwrap(), "hello");
    }

    #[test]
    fn test_decode_multibyte() {
        let text = "héllo wörld";
        assert_eq!(decode_chunk(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_chunk(b"").unwrap(), "");
    }

    #[test]
    fn test_decode_malformed_is_an_error() {
        assert!(decode_chunk(&[0xff, 0xfe, 0xfd]).is_err());
    }

    #[test]
    fn test_sink_receives_emissions_in_order() {
        let mut sink = VecSink(Vec::new());
        sink.emit("one");
        sink.emit("two");
        assert_eq!(sink.0, vec!["one", "two"]);
    }
}
