//! Metrics emitted by the store runtime.
//!
//! The runtime records through the `metrics` facade only. No exporter is
//! installed here: a host application that wants numbers installs a recorder
//! of its choice, calls [`describe_metrics`] once, and every store in the
//! process starts reporting.
//!
//! | name                             | kind      | labels |
//! |----------------------------------|-----------|--------|
//! | `store.actions.total`            | counter   |        |
//! | `store.actions.rejected`         | counter   |        |
//! | `store.reducer.duration_seconds` | histogram |        |
//! | `store.effects.executed`         | counter   | `type` |
//! | `store.effects.cancelled`        | counter   |        |
//! | `store.effects.dropped`          | counter   |        |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register descriptions for every metric the runtime emits.
///
/// Idempotent; call after installing a recorder.
pub fn describe_metrics() {
    describe_counter!("store.actions.total", "Actions reduced by stores");
    describe_counter!(
        "store.actions.rejected",
        "Actions rejected because the store was shut down"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers per action"
    );
    describe_counter!("store.effects.executed", "Effects interpreted, by variant");
    describe_counter!(
        "store.effects.cancelled",
        "In-flight effects cancelled by key"
    );
    describe_counter!(
        "store.effects.dropped",
        "Effect actions dropped because their store was gone or shut down"
    );
}

/// Store-level recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one reduced action.
    pub fn record_action(duration: Duration) {
        counter!("store.actions.total").increment(1);
        histogram!("store.reducer.duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a send rejected after shutdown.
    pub fn record_rejected() {
        counter!("store.actions.rejected").increment(1);
    }
}

/// Effect-level recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record one interpreted effect of the given variant.
    pub fn record_executed(kind: &'static str) {
        counter!("store.effects.executed", "type" => kind).increment(1);
    }

    /// Record cancelled in-flight effects.
    pub fn record_cancelled(count: usize) {
        counter!("store.effects.cancelled").increment(count as u64);
    }

    /// Record an effect-produced action that had nowhere to go.
    pub fn record_dropped() {
        counter!("store.effects.dropped").increment(1);
    }
}
