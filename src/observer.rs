//! Observer port for query notifications.
//!
//! The relay reports each query's lifecycle to an injected observer: one
//! begin notification when the query is dispatched, one resolve
//! notification when it reaches a terminal state. The relay makes no
//! assumption about where the observer wants to run; an adapter that needs
//! a particular execution context does its own hand-off.

use tracing::info;

/// Receives per-query notifications from the relay.
///
/// Both callbacks are invoked synchronously from relay tasks while the
/// pending log's lock is held: implementations must return quickly and
/// must not call back into the relay. For a given key, a begin always
/// precedes its resolve, each entry sees at most one of each, and a begin
/// is never retracted.
pub trait RelayObserver: Send + Sync {
    /// A query was accepted and dispatched. `hint` is the placeholder
    /// display text until resolution arrives.
    fn on_begin(&self, name: &str, hint: &str);

    /// The query reached a terminal state. `result` is the resolved
    /// address or a failure description.
    fn on_resolve(&self, name: &str, result: &str);
}

/// Observer that renders query events as log lines.
#[derive(Debug, Default)]
pub struct LogObserver;

impl RelayObserver for LogObserver {
    fn on_begin(&self, name: &str, hint: &str) {
        info!(query = %name, "{}", hint);
    }

    fn on_resolve(&self, name: &str, result: &str) {
        info!(query = %name, "{}", result);
    }
}
