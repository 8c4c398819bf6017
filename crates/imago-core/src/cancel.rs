// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-shot cooperative cancellation.
//!
//! A [`CancellationSource`] and its [`CancellationToken`]s share a single
//! atomic tri-state. The source signals at most once; tokens poll the signal
//! or register an observer for it. Cancellation is advisory: signaling never
//! unwinds the worker holding the token, it only asks it to stop.
//!
//! The token is safe to poll and signal from any thread. In the pipeline it
//! is the *only* state shared between the control thread and a loader's
//! worker thread.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// Live; neither signaled nor disarmed.
const ARMED: u8 = 0;
/// The signal fired; observers have been (or are being) notified.
const CANCELLED: u8 = 1;
/// Disarmed; later signals are no-ops and observers never fire.
const CONSUMED: u8 = 2;

/// An observer invoked once when the signal fires.
type Observer = Box<dyn FnOnce() + Send>;

struct Shared {
    state: AtomicU8,
    observers: Mutex<Vec<Observer>>,
}

impl Shared {
    fn is_cancelling(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}

/// The signaling half of a one-shot cancellation pair.
///
/// Created fresh per load attempt and owned by exactly one binding for the
/// duration that load is active. [`cancel`](CancellationSource::cancel) is
/// idempotent; [`consume`](CancellationSource::consume) disarms the source
/// so that later cancels (including drop-driven ones) do nothing.
pub struct CancellationSource {
    shared: Arc<Shared>,
}

impl CancellationSource {
    /// Creates a new, armed source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(ARMED),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Derives a token observing this source's signal.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            shared: self.shared.clone(),
        }
    }

    /// Requests cancellation.
    ///
    /// The first call transitions the pair to the cancelled state and runs
    /// every registered observer. Further calls, and calls after
    /// [`consume`](CancellationSource::consume), have no effect.
    pub fn cancel(&self) {
        // A single CAS decides the winner; only the winning call notifies.
        if self
            .shared
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        log::trace!("cancellation signaled");

        let observers = {
            let mut guard = self
                .shared
                .observers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };
        for observer in observers {
            observer();
        }
    }

    /// Disarms the source without signaling.
    ///
    /// Called after a result has been delivered: the load finished, so a
    /// later teardown of whatever owns this source must not fire a stale
    /// cancellation. Has no effect if the signal already fired.
    pub fn consume(&self) {
        let _ = self.shared.state.compare_exchange(
            ARMED,
            CONSUMED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_cancelling(&self) -> bool {
        self.shared.is_cancelling()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelling", &self.is_cancelling())
            .finish()
    }
}

/// The observing half of a one-shot cancellation pair.
///
/// Cloneable and freely shareable with worker threads. A worker should poll
/// [`is_cancelling`](CancellationToken::is_cancelling) cheaply before
/// expensive work and may register an [`on_cancel`](CancellationToken::on_cancel)
/// observer to be notified mid-flight.
#[derive(Clone)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelling(&self) -> bool {
        self.shared.is_cancelling()
    }

    /// Registers an observer to run when the signal fires.
    ///
    /// If the signal has already fired, `observer` runs immediately on the
    /// calling thread. Observers registered before the signal run on the
    /// thread that calls [`CancellationSource::cancel`]. If the source is
    /// consumed without firing, the observer is dropped unrun.
    pub fn on_cancel(&self, observer: impl FnOnce() + Send + 'static) {
        let mut guard = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Re-check under the lock so a concurrent cancel cannot slip between
        // the state read and the push.
        if self.shared.is_cancelling() {
            drop(guard);
            observer();
            return;
        }
        guard.push(Box::new(observer));
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelling", &self.is_cancelling())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fresh_pair_is_not_cancelling() {
        let source = CancellationSource::new();
        let token = source.token();
        assert!(!source.is_cancelling());
        assert!(!token.is_cancelling());
    }

    #[test]
    fn cancel_is_visible_through_every_token() {
        let source = CancellationSource::new();
        let token = source.token();
        let clone = token.clone();

        source.cancel();

        assert!(token.is_cancelling());
        assert!(clone.is_cancelling());
    }

    #[test]
    fn observer_fires_exactly_once_across_repeated_cancels() {
        let source = CancellationSource::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        source.token().on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        source.cancel();
        source.cancel();
        source.cancel();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_registered_after_cancel_runs_immediately() {
        let source = CancellationSource::new();
        source.cancel();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        source.token().on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn consume_disarms_the_source() {
        let source = CancellationSource::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        source.token().on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        source.consume();
        source.cancel();

        assert!(!source.is_cancelling());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn consume_after_cancel_keeps_the_signal() {
        let source = CancellationSource::new();
        source.cancel();
        source.consume();
        assert!(source.is_cancelling());
    }

    #[test]
    fn signal_crosses_threads() {
        let source = CancellationSource::new();
        let token = source.token();
        let (tx, rx) = mpsc::channel();

        token.on_cancel(move || {
            tx.send(()).expect("observer send failed");
        });

        let handle = thread::spawn(move || {
            source.cancel();
        });

        rx.recv_timeout(Duration::from_secs(1))
            .expect("observer did not fire");
        assert!(token.is_cancelling());
        handle.join().expect("thread join failed");
    }
}
