//! Shared test helpers for `PostgreSQL` integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use mockable::DefaultClock;
use slotswap::config::{PgPool, StoreConfig};
use slotswap::slot::domain::{Slot, SlotTitle, TimeWindow, UserId};
use std::sync::OnceLock;

/// Boxed error type for integration helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the disposable test database.
pub const TEST_DATABASE_URL_ENV: &str = "SLOTSWAP_TEST_DATABASE_URL";

const DROP_NEGOTIATIONS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000001_create_swap_negotiations/down.sql");

const DROP_SLOTS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_slots/down.sql");

const CREATE_SLOTS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_slots/up.sql");

const CREATE_NEGOTIATIONS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000001_create_swap_negotiations/up.sql");

static SCHEMA: OnceLock<Result<(), String>> = OnceLock::new();

/// Recreates the schema from the migrations.
fn reset_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| err.to_string())?;
    for sql in [
        DROP_NEGOTIATIONS_SQL,
        DROP_SLOTS_SQL,
        CREATE_SLOTS_SQL,
        CREATE_NEGOTIATIONS_SQL,
    ] {
        conn.batch_execute(sql).map_err(|err| err.to_string())?;
    }
    Ok(())
}

/// Returns a pool for the test database, or `None` when none is configured.
///
/// The schema is reset the first time this is called in a test run. Rows
/// written by tests use fresh identifiers, so tests share the schema safely.
///
/// # Errors
///
/// Returns an error if the schema cannot be prepared or the pool cannot be
/// built.
pub fn test_pool() -> Result<Option<PgPool>, BoxError> {
    let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) else {
        return Ok(None);
    };
    SCHEMA
        .get_or_init(|| reset_schema(&url))
        .clone()
        .map_err(|err| format!("failed to prepare test schema: {err}"))?;

    let mut config = StoreConfig::new(url);
    config.max_connections = 4;
    Ok(Some(config.build_pool()?))
}

/// Returns a fixed instant on the test calendar day.
///
/// # Errors
///
/// Returns an error if `hour` is not a valid hour of the day.
pub fn at_hour(hour: u32) -> Result<DateTime<Utc>, BoxError> {
    Utc.with_ymd_and_hms(2026, 12, 7, hour, 0, 0)
        .single()
        .ok_or_else(|| format!("invalid hour {hour}").into())
}

/// Builds an unsaved `Busy` slot for `owner` covering one hour.
///
/// # Errors
///
/// Returns an error if the window or title is invalid.
pub fn new_slot(owner: UserId, hour: u32) -> Result<Slot, BoxError> {
    let start = at_hour(hour)?;
    Ok(Slot::new(
        owner,
        SlotTitle::new(format!("Slot {hour}:00"))?,
        TimeWindow::new(start, start + Duration::hours(1))?,
        &DefaultClock,
    ))
}
