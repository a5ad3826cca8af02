//! Shared test utilities

use cockpit_gateway::{DbPool, HistoryRepo, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Create a history repository over an in-memory database
#[must_use]
pub fn setup_history() -> HistoryRepo {
    HistoryRepo::new(setup_test_db())
}
