//! # Marker Lexer
//!
//! Scans a document for the markers of a [`CompiledPatterns`] set and reports
//! every level transition as a [`Token`].
//!
//! ## State machine
//!
//! ```text
//! Prelude --process start--> Idle --object start--> InObject --attribute start--> InAttribute
//!                             ^  <--object end----------  ^  <--attribute end-----------|
//!                             |                           |
//!  any state --process end--> Finished            object end also closes InAttribute
//! ```
//!
//! At each position the scanner takes the longest marker of the current
//! search list that prefixes the remaining input. Start markers always apply.
//! End markers apply only to what is open: an attribute's end closes it only
//! while that attribute is open, an object's end only while that object is
//! open. A marker that does not apply is treated as ordinary text and the
//! scanner moves on by one character.
//!
//! ## Output
//!
//! | Event | Token |
//! |---|---|
//! | object opens | `("nodeType", item)` |
//! | attribute closes | `(attribute, text between its markers)` |
//! | object closes | `("object", "")` |
//! | input exhausted | `("EOF", "")` |
//!
//! Opening the process or an attribute, and closing the process, emit nothing.
//!
//! ## Running a scan
//!
//! [`MarkerLexer::scan`] collects tokens synchronously. [`MarkerLexer::spawn`]
//! runs the scan as a tokio task and returns a [`TokenStream`] the caller
//! drains while the scan progresses. Every scan owns its own state, so one
//! `MarkerLexer` can serve any number of scans at once.

pub mod scanner;
pub mod state;
pub mod stream;
pub mod token;

use std::{sync::Arc, time::Duration};

use thiserror::Error;

pub use scanner::Scanner;
pub use state::LexState;
pub use stream::{ScanOutcome, TokenStream};
pub use token::{Token, TokenKey};

use crate::{
    compiler::{CompiledPatterns, ConfigurationError},
    config::LexerConfig,
};

#[derive(Debug, Clone)]
pub struct MarkerLexer {
    patterns: Arc<CompiledPatterns>,
    config: LexerConfig,
}

impl MarkerLexer {
    pub fn new(patterns: Arc<CompiledPatterns>) -> Self {
        Self::with_config(patterns, LexerConfig::default())
    }

    pub fn with_config(patterns: Arc<CompiledPatterns>, config: LexerConfig) -> Self {
        Self { patterns, config }
    }

    pub fn patterns(&self) -> &Arc<CompiledPatterns> {
        &self.patterns
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// A scanner over `input` that yields tokens lazily.
    pub fn scanner<'a>(&'a self, input: &'a str) -> Scanner<'a, 'a> {
        Scanner::new(&self.patterns, input, self.config.unclosed)
    }

    /// Scans `input` to completion.
    #[tracing::instrument(level = "debug", skip(self, input), fields(len = input.len()))]
    pub fn scan(&self, input: &str) -> LexResult<Vec<Token>> {
        self.scanner(input).collect()
    }

    /// Scans `input` on a tokio task, handing tokens over as they are found.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, input: impl Into<String>) -> TokenStream {
        TokenStream::spawn(self.patterns.clone(), self.config.clone(), input.into())
    }
}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Matched marker belongs to `{key}` which is not in the item catalog")]
    UnknownKey { key: String },
    #[error("Input ended with object {object:?} and attribute {attribute:?} still open")]
    Unclosed {
        object: Option<String>,
        attribute: Option<String>,
    },
    #[error("Scan cancelled")]
    Cancelled,
    #[error("Consumer did not take a token within {after:?}")]
    EmitTimeout { after: Duration },
    #[error("Scan task failed: {0}")]
    TaskFailed(String),
}
