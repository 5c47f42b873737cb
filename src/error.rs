use std::io;
use std::str::Utf8Error;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A chunk read off a connection was not valid text. There is no
    /// recovery path for this; the read loop treats it as fatal.
    #[error("malformed text chunk: {0}")]
    Decode(#[from] Utf8Error),

    #[error("connection table lock poisoned")]
    PoisonedLock,
}
