use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::{ChatRequest, Error};

/// The raw response body, as it arrives from the network.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Something that can answer a [`ChatRequest`] with a streamed response.
///
/// [`Client`](crate::Client) is the HTTP implementation. The returned stream
/// is only handed out after the response was accepted, so a rejected request
/// (e.g. `401`) surfaces as an error here, not as a stream item.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, model: &str, request: &ChatRequest) -> Result<ByteStream, Error>;
}
