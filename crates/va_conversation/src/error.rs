pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a turn is already in flight")]
    TurnInFlight,

    #[error("turn handle does not refer to the in-flight turn")]
    StaleTurn,

    #[error("prompt is empty")]
    EmptyPrompt,
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
