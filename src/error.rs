use thiserror::Error;

use crate::compiler::ConfigurationError;
use crate::config::ConfigError;
use crate::lexer::LexError;
use crate::table::TableError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Table error: {0}")]
    Table(#[from] TableError),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
