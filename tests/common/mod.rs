#![cfg(feature = "rusqlite")]

pub mod engines;
pub mod helpers;

pub use engines::{CountingEngine, FailingEngine};

use quarry::sample;
use quarry::sqlite::SqliteEngine;
use quarry::{ContextConfig, PersistenceContext};

pub type TestContext = PersistenceContext<CountingEngine<SqliteEngine>>;

pub fn setup_engine() -> SqliteEngine {
    let mut engine = SqliteEngine::open_in_memory().expect("Failed to create in-memory database");
    engine
        .create_tables(sample::tables())
        .expect("Failed to create sample tables");
    engine
}

pub fn setup_context() -> TestContext {
    PersistenceContext::new(CountingEngine::new(setup_engine()))
}

pub fn setup_context_with(config: ContextConfig) -> TestContext {
    PersistenceContext::with_config(CountingEngine::new(setup_engine()), config)
}

/// Usernames in row order.
pub fn usernames<'a>(members: impl IntoIterator<Item = &'a std::rc::Rc<sample::Member>>) -> Vec<String> {
    members
        .into_iter()
        .map(|member| member.username().to_owned())
        .collect()
}
