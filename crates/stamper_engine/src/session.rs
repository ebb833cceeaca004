use stamper_core::JobHandle;
use stamper_logging::{stamper_trace, stamper_warn};

use crate::decode::{DecodeError, DecodeMode, Utf8StreamDecoder};
use crate::{FailureKind, StreamError, StreamOutcome, StreamSummary};

/// State of one stream: the decoder and the text accumulated so far.
///
/// Owned by exactly one [`crate::TextStream`]; nothing is shared between sessions.
pub struct StreamSession {
    handle: JobHandle,
    decoder: Utf8StreamDecoder,
    accumulated: String,
    chunks: usize,
    bytes: u64,
    terminal: bool,
}

impl StreamSession {
    pub fn new(handle: JobHandle, mode: DecodeMode) -> Self {
        Self {
            handle,
            decoder: Utf8StreamDecoder::new(mode),
            accumulated: String::new(),
            chunks: 0,
            bytes: 0,
            terminal: false,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Full accumulated text.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Decodes `chunk` with the session decoder and appends the result.
    pub fn absorb(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        if self.terminal {
            return Err(StreamError::new(
                FailureKind::SessionClosed,
                format!("stream {} is already closed", self.handle),
            ));
        }
        match self.decoder.decode(chunk) {
            Ok(text) => {
                self.chunks += 1;
                self.bytes += chunk.len() as u64;
                self.accumulated.push_str(&text);
                stamper_trace!(
                    "stream {} chunk={} bytes={} total_bytes={}",
                    self.handle,
                    self.chunks,
                    chunk.len(),
                    self.bytes
                );
                Ok(())
            }
            Err(err) => {
                self.terminal = true;
                Err(decode_failure(&err))
            }
        }
    }

    /// Ends the session after the transport signalled end of stream.
    ///
    /// No text is appended here: a dangling partial character is dropped
    /// (replace mode) or reported (strict mode).
    pub fn complete(&mut self) -> Result<(), StreamError> {
        if self.terminal {
            return Ok(());
        }
        self.terminal = true;
        match self.decoder.finish() {
            Ok(rest) if rest.is_empty() => Ok(()),
            Ok(rest) => {
                stamper_warn!(
                    "stream {} ended inside a multi-byte character; dropped {:?}",
                    self.handle,
                    rest
                );
                Ok(())
            }
            Err(err) => Err(decode_failure(&err)),
        }
    }

    /// Marks the session terminal without touching the text.
    pub fn close(&mut self) {
        self.terminal = true;
    }

    pub fn summary(&self, outcome: StreamOutcome) -> StreamSummary {
        StreamSummary {
            handle: self.handle.clone(),
            chunks: self.chunks,
            bytes: self.bytes,
            chars: self.accumulated.chars().count(),
            outcome,
        }
    }
}

fn decode_failure(err: &DecodeError) -> StreamError {
    StreamError::new(FailureKind::Decode, err.to_string())
}
