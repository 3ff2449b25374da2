//! Execution context handed through to weak learners.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Per-training-run state: a seeded RNG and a shared cancellation flag.
///
/// The reduction only passes the context along and polls the flag between
/// labels; weak learners are free to draw from the RNG.
#[derive(Debug)]
pub struct TrainContext {
    rng: StdRng,
    cancelled: Arc<AtomicBool>,
}

impl TrainContext {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Handle that another thread can use to request cancellation.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TrainContext {
    fn default() -> Self {
        Self::new(42)
    }
}
