//! Lazily read standard input
//!
//! The underlying reader is consumed at most once per [`LazyInput`], even
//! when several threads ask for the content at the same time.

use parking_lot::Mutex;
use std::io::{self, Read};
use std::sync::OnceLock;
use tracing::trace;

enum ReaderState {
    Pending(Box<dyn Read + Send>),
    Consumed,
    Failed { kind: io::ErrorKind, message: String },
}

/// Input stream that is read to the end on first access and cached
pub struct LazyInput {
    content: OnceLock<String>,
    reader: Mutex<ReaderState>,
}

impl LazyInput {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            content: OnceLock::new(),
            reader: Mutex::new(ReaderState::Pending(Box::new(reader))),
        }
    }

    /// Input backed by the process standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }

    /// Input with fixed content that never touches a stream.
    pub fn from_string(content: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(content.into());
        Self {
            content: cell,
            reader: Mutex::new(ReaderState::Consumed),
        }
    }

    /// Returns the whole input, reading the stream on first call.
    ///
    /// A failed read is not retried; later calls report the same failure.
    pub fn get(&self) -> io::Result<&str> {
        if let Some(content) = self.content.get() {
            return Ok(content.as_str());
        }

        let mut state = self.reader.lock();
        if let Some(content) = self.content.get() {
            return Ok(content.as_str());
        }

        match std::mem::replace(&mut *state, ReaderState::Consumed) {
            ReaderState::Pending(mut reader) => {
                let mut bytes = Vec::new();
                let read = reader.read_to_end(&mut bytes).and_then(|_| {
                    String::from_utf8(bytes)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
                });

                match read {
                    Ok(text) => {
                        trace!(bytes = text.len(), "Read input stream");
                        Ok(self.content.get_or_init(|| text).as_str())
                    }
                    Err(err) => {
                        *state = ReaderState::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        };
                        Err(err)
                    }
                }
            }
            ReaderState::Failed { kind, message } => {
                let err = io::Error::new(kind, message.clone());
                *state = ReaderState::Failed { kind, message };
                Err(err)
            }
            ReaderState::Consumed => Err(io::Error::new(
                io::ErrorKind::Other,
                "input stream already consumed",
            )),
        }
    }

    /// Whether the stream has been read successfully.
    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }
}

impl std::fmt::Debug for LazyInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyInput")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
