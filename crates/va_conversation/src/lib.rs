pub mod context;
pub mod error;
pub mod export;
pub mod history;
pub mod message;
pub mod turn;

pub use context::ContextWindow;
pub use error::Error;
pub use history::{ActiveTurn, History};
pub use message::{Message, Role};
pub use turn::{Outcome, Turn};
