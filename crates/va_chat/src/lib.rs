//! Conversation driver: session state, the agreement gate and the lifecycle
//! of a single request, from submission until its turn is sealed.

mod abort;
mod agreement;
mod error;
mod lifecycle;
mod render;
mod session;

pub use abort::{AbortHandle, Phase, Toggle};
pub use agreement::AgreementGate;
pub use error::Error;
pub use lifecycle::{Chat, Outcome};
pub use render::{Notice, Render};
pub use session::Session;
