use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-flight gate for the toggle helpers. A caller holds it while a
/// mutation runs; further attempts are refused until the guard drops,
/// so a rapid double press fires one request, not two.
#[derive(Clone, Debug, Default)]
pub struct PendingFlag {
    in_flight: Arc<AtomicBool>,
}

impl PendingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Claim the gate, or None when a mutation already holds it.
    pub(crate) fn try_enter(&self) -> Option<PendingGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PendingGuard(self.in_flight.clone()))
    }
}

pub(crate) struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
