#![allow(dead_code)]

use std::sync::Arc;

use lazy_static::lazy_static;
use marklex::{compile, CompiledPatterns, ConfigTable, Token};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

lazy_static! {
    pub static ref PERSON_PATTERNS: Arc<CompiledPatterns> = {
        let table = ConfigTable::load(fixture("person.csv")).expect("person.csv loads");
        compile(&table).expect("person.csv compiles")
    };
    pub static ref BRACKET_PATTERNS: Arc<CompiledPatterns> = {
        let table = ConfigTable::load(fixture("brackets.json")).expect("brackets.json loads");
        compile(&table).expect("brackets.json compiles")
    };
}

/// Tokens as owned `(key, value)` pairs for readable assertions.
pub fn pairs(tokens: &[Token]) -> Vec<(String, String)> {
    tokens
        .iter()
        .map(|token| {
            let (key, value) = token.as_pair();
            (key.to_string(), value.to_string())
        })
        .collect()
}

pub fn expected(tokens: &[(&str, &str)]) -> Vec<(String, String)> {
    tokens
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
