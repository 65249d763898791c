use std::sync::PoisonError;

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GraphError {
    #[error("Lock poisoning ({0})")]
    LockPoisoning(String),
    #[error("shared stream failed upstream: {0}")]
    SharedStreamFailure(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    TomlDeserialization(#[from] toml::de::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl<T> From<PoisonError<T>> for GraphError {
    fn from(e: PoisonError<T>) -> Self {
        Self::LockPoisoning(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
