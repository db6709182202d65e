pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Schematic(#[from] Box<schematic::ConfigError>),

    #[error("Unknown config key: {key}\n\nAvailable keys:\n  - {}", available_keys.join("\n  - "))]
    UnknownConfigKey {
        key: String,
        available_keys: Vec<&'static str>,
    },

    #[error("Invalid config value \"{value}\" for key {key}: {reason}")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl From<schematic::ConfigError> for Error {
    fn from(error: schematic::ConfigError) -> Self {
        Self::Schematic(Box::new(error))
    }
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
