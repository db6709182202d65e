//! Decoding and assembly of streamed model responses.
//!
//! The inference endpoint answers with a server-sent event stream of
//! `data: {"response": "..."}` records, terminated by `data: [DONE]`. The
//! [`Decoder`] turns raw bytes into [`StreamEvent`]s, and the
//! [`ChunkAggregator`] folds the textual deltas back into a single response.

pub mod aggregator;
pub mod decoder;
mod event;

pub use aggregator::ChunkAggregator;
pub use decoder::{Decoder, decode};
pub use event::StreamEvent;
