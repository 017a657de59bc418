//! Per-key single-flight groups.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tally_error::TallyResult;
use tokio::sync::OnceCell;

type Flight = Arc<OnceCell<TallyResult<String>>>;

/// Collapses concurrent computations of the same key into one.
///
/// The first caller for a key runs its computation; callers arriving while it is in
/// flight wait for it and receive a clone of its result. Once the flight lands it is
/// forgotten, so a later call (after an error, say) computes again.
///
/// If the running caller is cancelled, one of the waiters runs its own computation
/// instead.
#[derive(Debug, Default)]
pub struct Coalescer {
    flights: Mutex<HashMap<String, Flight>>,
}

impl Coalescer {
    /// Create an empty coalescer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `init` for `key` unless an identical flight is already running.
    pub async fn run<F, Fut>(&self, key: &str, init: F) -> TallyResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TallyResult<String>>,
    {
        let flight = {
            let mut flights = self.flights.lock();
            flights
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let _landing = Landing {
            coalescer: self,
            key,
            flight: &flight,
        };
        let result = flight.get_or_init(init).await.clone();
        result
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}

/// Forgets a finished flight when its caller leaves, cancelled or not.
struct Landing<'a> {
    coalescer: &'a Coalescer,
    key: &'a str,
    flight: &'a Flight,
}

impl Drop for Landing<'_> {
    fn drop(&mut self) {
        // An unfinished flight stays registered so its waiters can take over.
        if !self.flight.initialized() {
            return;
        }
        let mut flights = self.coalescer.flights.lock();
        if flights
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, self.flight))
        {
            flights.remove(self.key);
        }
    }
}
