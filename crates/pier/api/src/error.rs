use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("invalid configuration ({option}): {violation}")]
    InvalidConfiguration {
        option: &'static str,
        violation: ConfigViolation,
    },
}

impl TopologyError {
    pub(crate) const fn invalid(option: &'static str, violation: ConfigViolation) -> Self {
        Self::InvalidConfiguration { option, violation }
    }

    pub fn option(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { option, .. } => option,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("value should not be empty")]
    Empty,
    #[error("malformed value: {0}")]
    Malformed(String),
    #[error("required option is missing")]
    Missing,
    #[error("value should be positive")]
    NonPositive,
}
