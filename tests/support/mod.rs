#![allow(dead_code)]

pub mod ticket;

use commerce_mock_store::{Context, Engine};

pub const PROJECT: &str = "test-project";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Built-in types plus `ticket`.
pub fn engine() -> Engine {
    init_tracing();
    let mut engine = Engine::new().unwrap();
    engine.register(ticket::resource_type()).unwrap();
    engine
}

pub fn ctx() -> Context {
    Context::new(PROJECT)
}
