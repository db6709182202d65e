//! Edge proxy in front of the AI gateway.
//!
//! Browsers and the chat client talk to the proxy without credentials. The
//! proxy answers CORS preflights, serves a landing page for `GET`, and
//! forwards everything else to the gateway with the API key injected.

mod error;
mod route;
mod server;

pub use error::Error;
pub use route::{Route, route};
pub use server::{router, serve, serve_listener};
