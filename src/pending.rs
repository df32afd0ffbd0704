//! Pending query tracking.
//!
//! Every accepted datagram gets one entry here, created when the query is
//! dispatched and transitioned exactly once when the upstream reply (or a
//! forwarding failure) arrives. Entries stay in creation order and are
//! never removed by the relay; their display lifetime belongs to the
//! observer.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::dns::Answer;
use crate::observer::RelayObserver;

/// State of one tracked query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Dispatched, awaiting the upstream reply.
    Resolving,
    /// Upstream replied; holds the decoded answer.
    Resolved(Answer),
    /// Forwarding or decoding failed.
    Failed(String),
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Resolving => write!(f, "resolving"),
            QueryStatus::Resolved(answer) => write!(f, "{answer}"),
            QueryStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// One tracked query.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub name: String,
    pub status: QueryStatus,
}

/// Creation-ordered log of queries.
///
/// Inserted into by the dispatching side and updated by handling tasks
/// that complete in any order, so all access goes through one lock.
pub struct PendingQueries {
    entries: Mutex<Vec<PendingQuery>>,
    observer: Arc<dyn RelayObserver>,
}

impl PendingQueries {
    pub fn new(observer: Arc<dyn RelayObserver>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            observer,
        }
    }

    /// Register a query in `Resolving` state and notify the observer.
    ///
    /// The notification happens under the log lock so that, for any one
    /// key, a begin can never be observed after its resolve.
    pub fn begin(&self, name: &str) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        entries.push(PendingQuery {
            name: name.to_string(),
            status: QueryStatus::Resolving,
        });
        self.observer
            .on_begin(name, &QueryStatus::Resolving.to_string());
    }

    /// Transition the first `Resolving` entry matching `name` to a
    /// terminal state and notify the observer.
    ///
    /// Correlation is by name only: when two in-flight queries share a
    /// name, the earliest still-resolving entry takes the result, which
    /// can attach an answer to the wrong one. A resolve with no matching
    /// entry is ignored.
    pub fn resolve(&self, name: &str, status: QueryStatus) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        let Some(entry) = entries
            .iter_mut()
            .find(|entry| entry.name == name && entry.status == QueryStatus::Resolving)
        else {
            debug!(query = %name, "no pending entry to resolve");
            return;
        };

        entry.status = status;
        self.observer.on_resolve(name, &entry.status.to_string());
    }

    /// Snapshot of all entries in creation order.
    pub fn snapshot(&self) -> Vec<PendingQuery> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
