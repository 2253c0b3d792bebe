//! # marklex: Marker-Driven Hierarchical Lexer
//!
//! marklex turns a document annotated with configurable start/end markers into
//! a flat stream of `(key, value)` tokens describing a three-level hierarchy:
//! one process containing objects, each object carrying named attributes.
//!
//! ## Pipeline
//!
//! ```text
//! Pattern table → Compiler → CompiledPatterns → Lexer → Token stream
//! ```
//!
//! ### Stage 1: Pattern table
//!
//! The [`table`] module loads the raw rows describing the hierarchy: the
//! `order` row naming the levels, the `items` section assigning items to
//! levels, and the `markers` section giving each item its start and end
//! marker. Tables come from CSV or JSON.
//!
//! ### Stage 2: Compilation
//!
//! The [`compiler`] module validates the table and derives the per-state
//! search lists the lexer matches against. The result is immutable and is
//! shared between scans behind an [`Arc`](std::sync::Arc).
//!
//! ### Stage 3: Lexing
//!
//! The [`lexer`] module scans input with longest-match marker recognition and
//! context-sensitive end markers. Scans run either synchronously
//! ([`MarkerLexer::scan`]) or on a tokio task that hands tokens to the caller
//! one at a time ([`MarkerLexer::spawn`]).
//!
//! ## Example
//!
//! ```
//! use marklex::{table::ConfigTable, tokenize};
//!
//! let table = ConfigTable::parse_csv(
//!     "order,process,object,attribute\n\
//!      items\n\
//!      process,Doc\n\
//!      object,Person\n\
//!      attribute,Name\n\
//!      markers\n\
//!      Doc,<P>,</P>\n\
//!      Person,<Person>,</Person>\n\
//!      Name,<Name>,</Name>\n",
//! )?;
//! let tokens = tokenize(&table, "<P><Person><Name>Alice</Name></Person></P>")?;
//! let pairs: Vec<_> = tokens.iter().map(|t| t.as_pair()).collect();
//! assert_eq!(
//!     pairs,
//!     vec![("nodeType", "Person"), ("Name", "Alice"), ("object", ""), ("EOF", "")]
//! );
//! # Ok::<(), marklex::Error>(())
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod table;

use std::sync::Arc;

// Re-exports
pub use compiler::{CompiledPatterns, ConfigurationError, Level};
pub use config::{LexerConfig, UnclosedPolicy};
pub use error::*;
pub use lexer::{LexError, MarkerLexer, ScanOutcome, Token, TokenKey, TokenStream};
pub use table::ConfigTable;

/// Compiles `table` into patterns ready to be shared between lexers.
pub fn compile(table: &ConfigTable) -> Result<Arc<CompiledPatterns>> {
    Ok(Arc::new(CompiledPatterns::compile(table)?))
}

/// Compiles `table` and scans `input` with the default lexer settings.
pub fn tokenize(table: &ConfigTable, input: &str) -> Result<Vec<Token>> {
    let lexer = MarkerLexer::new(compile(table)?);
    Ok(lexer.scan(input)?)
}
