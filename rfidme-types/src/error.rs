//! Errors from parsing shared types

use std::num::ParseIntError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Expected vendor:product, got '{0}'")]
    MissingSeparator(String),
    
    #[error("Invalid USB id '{part}': {source}")]
    InvalidId {
        part: String,
        #[source]
        source: ParseIntError,
    },
}
