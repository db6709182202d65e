//! HTTP client for the streaming inference endpoint.

mod backend;
mod client;
mod error;
pub mod request;

pub use backend::{Backend, ByteStream};
pub use client::Client;
pub use error::Error;
pub use request::ChatRequest;
