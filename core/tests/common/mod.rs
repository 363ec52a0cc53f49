//! Shared fixtures for the integration tests.
//!
//! Each test gets its own shared-memory SQLite database, created from
//! `fixtures/schema.sql`. The engine keeps one connection open for the
//! whole test, which keeps the in-memory database alive while the
//! phases open and close their own connections.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use walletgen_core::{
    clock::RunClock,
    config::GenConfig,
    engine::GenEngine,
    store::{sql::Cell, WalletStore},
};

pub const SCHEMA: &str = include_str!("../fixtures/schema.sql");

static NEXT_DB: AtomicU64 = AtomicU64::new(0);

/// A fresh, empty database with the wallet schema applied.
pub fn fresh_store(tag: &str, config: &GenConfig) -> WalletStore {
    init_logging();
    let n = NEXT_DB.fetch_add(1, Ordering::SeqCst);
    let url = format!(
        "file:{tag}_{}_{n}?mode=memory&cache=shared",
        std::process::id()
    );
    let mut store = WalletStore::connect(&url, &config.session).expect("open test database");
    store.execute_script(SCHEMA).expect("apply schema fixture");
    store
}

/// Route phase logs through the test harness; `RUST_LOG` picks the level.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixed_clock() -> RunClock {
    RunClock::fixed(
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
    )
}

/// Engine over a fresh database, with a fixed clock.
pub fn build_engine(tag: &str, config: &GenConfig) -> GenEngine {
    let store = fresh_store(tag, config);
    GenEngine::build(config, store, fixed_clock())
}

pub fn scalar(store: &mut WalletStore, sql: &str) -> i64 {
    let rows = store.query(sql).expect("query");
    match &rows[0][0] {
        Cell::Int(v) => *v,
        Cell::Null => 0,
        other => panic!("expected an integer from `{sql}`, got {other:?}"),
    }
}

pub fn ints(store: &mut WalletStore, sql: &str) -> Vec<i64> {
    store
        .query(sql)
        .expect("query")
        .iter()
        .map(|row| row[0].as_i64(0).expect("integer column"))
        .collect()
}

/// Every row rendered as one string, for whole-table comparisons.
pub fn dump(store: &mut WalletStore, sql: &str) -> Vec<String> {
    store
        .query(sql)
        .expect("query")
        .iter()
        .map(|row| format!("{row:?}"))
        .collect()
}
