//! Server-sent event decoding.

use async_stream::stream;
use futures::{Stream, StreamExt as _};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::StreamEvent;

/// Marks a line carrying an event payload.
const DATA_PREFIX: &[u8] = b"data: ";

/// Payload signalling the end of the stream.
const DONE_SENTINEL: &[u8] = b"[DONE]";

/// The payload of a single `data:` record.
#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    response: Option<String>,
}

/// An incremental, pull-based decoder for the response event stream.
///
/// Bytes are fed in with [`Decoder::push`], in chunks of any size. Chunk
/// boundaries do not have to line up with lines (or even with UTF-8
/// characters), bytes are buffered until a full line is available.
///
/// Decoded events are pulled with [`Decoder::next_event`]. Once
/// [`StreamEvent::Done`] has been returned, the decoder ignores any further
/// input.
#[derive(Debug, Default)]
pub struct Decoder {
    /// Bytes received but not yet decoded.
    buffer: Vec<u8>,

    /// Set once the input is exhausted.
    input_closed: bool,

    /// Set once the terminal event was returned.
    done: bool,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes to the decoder.
    pub fn push(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        if self.done || self.input_closed {
            trace!(len = bytes.len(), "Ignoring bytes after end of stream.");
            return;
        }

        self.buffer.extend_from_slice(bytes);
    }

    /// Signal that no more input will arrive.
    ///
    /// A trailing line without a newline is still decoded, and if the stream
    /// did not contain a `[DONE]` marker, an implicit [`StreamEvent::Done`] is
    /// produced.
    pub fn finish(&mut self) {
        self.input_closed = true;
    }

    /// Whether the terminal event has been returned.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Pull the next decoded event, if a complete one is available.
    ///
    /// Returns `None` when more input is needed, or when the stream is done.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        while !self.done {
            let line = match self.buffer.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                    line.pop();
                    line
                }
                None if self.input_closed && !self.buffer.is_empty() => {
                    std::mem::take(&mut self.buffer)
                }
                None if self.input_closed => {
                    debug!("Stream ended without terminal marker.");
                    self.done = true;
                    return Some(StreamEvent::Done);
                }
                None => return None,
            };

            if let Some(event) = self.decode_line(&line) {
                return Some(event);
            }
        }

        None
    }

    /// Drain all events that can be decoded from the buffered input.
    pub fn events(&mut self) -> impl Iterator<Item = StreamEvent> + '_ {
        std::iter::from_fn(|| self.next_event())
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let line = raw.trim_ascii();
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            if !line.is_empty() {
                trace!(line = %String::from_utf8_lossy(line), "Skipping non-data line.");
            }
            return None;
        };

        if payload == DONE_SENTINEL {
            debug!(dropped = self.buffer.len(), "Received terminal marker.");
            self.buffer.clear();
            self.done = true;
            return Some(StreamEvent::Done);
        }

        match serde_json::from_slice::<Chunk>(payload) {
            Ok(Chunk {
                response: Some(text),
            }) if !text.is_empty() => Some(StreamEvent::Delta(text)),
            Ok(_) => {
                trace!("Skipping event without response text.");
                None
            }
            Err(error) => Some(StreamEvent::Malformed {
                line: String::from_utf8_lossy(line).into_owned(),
                reason: error.to_string(),
            }),
        }
    }
}

/// Decode a byte stream into a stream of [`StreamEvent`]s.
///
/// The returned stream ends after the first [`StreamEvent::Done`]. An error
/// from the underlying stream is passed through and ends the stream as well.
pub fn decode<S, B, E>(bytes: S) -> impl Stream<Item = Result<StreamEvent, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    stream! {
        let mut decoder = Decoder::new();
        futures::pin_mut!(bytes);

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => decoder.push(chunk),
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }

            while let Some(event) = decoder.next_event() {
                let done = event.is_done();
                yield Ok(event);
                if done {
                    return;
                }
            }
        }

        decoder.finish();
        while let Some(event) = decoder.next_event() {
            yield Ok(event);
        }
    }
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;
