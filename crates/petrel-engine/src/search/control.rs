//! Search control: the stop latch, node budget, and wall-clock cap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::Limits;

/// Decides when the search must abort.
///
/// The stop flag is shared with the protocol front-end, which runs the
/// search on a worker thread; relaxed ordering is sufficient because the
/// flag is a pure latch. All exhaustion paths set the flag, so once any
/// probe reports `true` every later probe does too.
pub struct SearchControl {
    stop: Arc<AtomicBool>,
    start: Instant,
    optimum_ms: u64,
    maximum_ms: u64,
    node_limit: u64,
}

impl SearchControl {
    /// Build a control for one search. The caller resets the flag.
    pub fn new(stop: Arc<AtomicBool>, limits: &Limits) -> Self {
        Self {
            stop,
            start: Instant::now(),
            optimum_ms: limits.time.optimum,
            maximum_ms: limits.time.maximum,
            node_limit: limits.nodes,
        }
    }

    /// Whether the stop latch is set.
    #[inline]
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Probe for exhaustion. Called on every node entry.
    ///
    /// The wall clock is consulted only once every 2048 nodes to keep the
    /// syscall off the hot path; the node budget and the latch are checked
    /// every time.
    pub fn time_is_up(&self, nodes: u64) -> bool {
        if self.stopped() {
            return true;
        }

        if self.node_limit > 0 && nodes >= self.node_limit {
            self.stop.store(true, Ordering::Relaxed);
            return true;
        }

        if nodes & 2047 != 2047 {
            return false;
        }

        if self.maximum_ms > 0 && self.elapsed_ms() >= self.maximum_ms {
            self.stop.store(true, Ordering::Relaxed);
            return true;
        }

        false
    }

    /// Whether the soft budget is spent. Consulted between iterative
    /// deepening iterations; a depth started before this trips is allowed
    /// to run until the hard cap.
    pub fn past_optimum(&self) -> bool {
        self.optimum_ms > 0 && self.elapsed_ms() >= self.optimum_ms
    }

    /// Milliseconds since the search started.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
