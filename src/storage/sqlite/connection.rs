//! Shared connection handling for the `SQLite` store.
//!
//! One connection guarded by a mutex serves all backends. `SQLite`'s WAL
//! mode and busy timeout handle contention from other processes.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

/// Acquires the connection mutex with poison recovery.
///
/// If the mutex is poisoned by a panic in a previous critical section, the
/// inner value is recovered and a warning is logged. The connection itself
/// stays valid; any interrupted transaction was already rolled back.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        }
    }
}

/// Configures a `SQLite` connection for the engine.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits for cross-process locks instead of failing
/// - **`foreign_keys`**: enforces catalog references
pub fn configure_connection(conn: &Connection, busy_timeout_ms: u32) {
    // pragma_update returns the pragma's row for some pragmas (journal_mode
    // reports the resulting mode); a failure leaves the default in place.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", busy_timeout_ms.to_string());
    let _ = conn.pragma_update(None, "foreign_keys", "ON");
}
