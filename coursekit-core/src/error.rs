//! Core error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}
