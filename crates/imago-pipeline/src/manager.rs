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

//! The orchestrating component of the request lifecycle.
//!
//! [`Manager`] owns the handle registry and the completion channel, and
//! wires requests through the cache and the loader. All of its methods are
//! meant to be called from a single control thread; the only state it
//! shares with loader workers is the cancellation token and the sending
//! half of the completion channel.

use crate::binding::{BindingContext, BindingId};
use crate::registry::{HandleKey, HandleRegistry};
use imago_core::{Artifact, Cache, CancellationSource, Completion, Loader, LoadResult, Request};
use std::sync::Arc;
use std::time::Duration;

/// Where a delivered result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverySource {
    /// The result was served synchronously from the memory cache.
    MemoryCache,
    /// The result came back from the loader.
    Loader,
}

impl DeliverySource {
    /// Whether the result was served from the cache.
    #[must_use]
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::MemoryCache)
    }
}

/// The caller's result callback.
///
/// Invoked at most once per `load` call, with a borrow of the (still live)
/// handle, the forwarded result, and where it came from. Never invoked for
/// a superseded or cancelled load, nor after the handle was destroyed.
pub type ResultCallback<A, H> = Box<dyn FnOnce(&H, LoadResult<A>, DeliverySource) + Send>;

/// A loader completion waiting to be settled on the control thread.
struct Settlement<A: Artifact, H: 'static> {
    key: HandleKey,
    binding: BindingId,
    request: Request,
    result: LoadResult<A>,
    deliver: ResultCallback<A, H>,
}

/// Orchestrates loads for handles of type `H` producing artifacts of type `A`.
///
/// The manager guarantees, for any handle:
/// - at most one in-flight load at a time (a newer `load` supersedes and
///   cancels the older one);
/// - at most one callback invocation per `load` call;
/// - no callback after the handle has been destroyed.
///
/// # Threading
///
/// `load`, `cancel`, and `pump` take `&mut self` and belong to one control
/// thread. Loader implementations may resolve their completions from any
/// thread; the completion only enqueues onto an internal channel, and the
/// settling work (cache write-through, identity check, delivery) happens
/// when the control thread calls [`pump`](Manager::pump).
pub struct Manager<A: Artifact, H: 'static> {
    loader: Arc<dyn Loader<A>>,
    cache: Arc<dyn Cache<A>>,
    registry: HandleRegistry<H>,
    settle_tx: flume::Sender<Settlement<A, H>>,
    settle_rx: flume::Receiver<Settlement<A, H>>,
}

impl<A: Artifact, H: 'static> Manager<A, H> {
    /// Creates a manager over the given loader and cache.
    ///
    /// Both collaborators are shared, stateless services from the manager's
    /// point of view; nothing is owned per-request.
    #[must_use]
    pub fn new(loader: Arc<dyn Loader<A>>, cache: Arc<dyn Cache<A>>) -> Self {
        let (settle_tx, settle_rx) = flume::unbounded();
        Self {
            loader,
            cache,
            registry: HandleRegistry::new(),
            settle_tx,
            settle_rx,
        }
    }

    /// Starts a load for `handle`, delivering the outcome to `on_result`.
    ///
    /// In order:
    /// 1. Any in-flight load for `handle` is cancelled and unbound.
    /// 2. If the request allows cache reads and the cache has the artifact,
    ///    `on_result` runs synchronously, within this call, with
    ///    [`DeliverySource::MemoryCache`]; the loader is never involved.
    /// 3. Otherwise the request is dispatched to the loader under a fresh
    ///    cancellation token bound to `handle`. The eventual result is
    ///    delivered by a later [`pump`](Manager::pump), or silently
    ///    dropped if this load was superseded or the handle died first.
    ///
    /// The manager holds only a weak reference to `handle`; dropping the
    /// handle's last `Arc` cancels its pending load.
    pub fn load<F>(&mut self, request: Request, handle: &Arc<H>, on_result: F)
    where
        F: FnOnce(&H, LoadResult<A>, DeliverySource) + Send + 'static,
    {
        // Supersede first: even a cache hit invalidates the previous load.
        self.registry.remove(handle);

        if request.read_allowed() {
            if let Some(artifact) = self.cache.get(&request) {
                log::trace!("cache hit for '{}'", request.uri());
                on_result(handle.as_ref(), Ok(artifact), DeliverySource::MemoryCache);
                return;
            }
        }

        let source = CancellationSource::new();
        let token = source.token();
        let context = BindingContext::new(source);
        let binding = context.id();
        let key = self.registry.bind(handle, context);

        log::debug!("dispatching '{}' as binding {binding:?}", request.uri());

        let settle_tx = self.settle_tx.clone();
        let settled_request = request.clone();
        let deliver: ResultCallback<A, H> = Box::new(on_result);
        let complete: Completion<A> = Box::new(move |result| {
            // The manager may be gone by the time a straggler resolves;
            // there is nobody left to deliver to, so drop quietly.
            let _ = settle_tx.send(Settlement {
                key,
                binding,
                request: settled_request,
                result,
                deliver,
            });
        });

        self.loader.load(request, token, complete);
    }

    /// Cancels the in-flight load for `handle`, if any. Idempotent.
    ///
    /// The load's cancellation token is signaled and its callback will never
    /// run. Has no observable effect when `handle` has no active load.
    pub fn cancel(&mut self, handle: &Arc<H>) {
        if self.registry.remove(handle) {
            log::debug!("cancelled in-flight load");
        }
    }

    /// Cancels every in-flight load.
    pub fn cancel_all(&mut self) {
        self.registry.clear();
    }

    /// Settles all queued loader completions. Returns how many were settled.
    ///
    /// For each completion, in order: the artifact is written through to the
    /// cache (successful results with `write_allowed` only, deliberately
    /// before the identity check: a superseded load still pays its result
    /// forward), then the identity check decides between
    /// delivery and a silent drop.
    pub fn pump(&mut self) -> usize {
        let mut settled = 0;
        while let Ok(settlement) = self.settle_rx.try_recv() {
            self.settle(settlement);
            settled += 1;
        }
        settled
    }

    /// Blocks up to `timeout` for a completion, then settles everything
    /// queued. Returns how many completions were settled.
    ///
    /// Convenience for callers without their own wakeup integration (tests,
    /// simple run loops). Identical semantics to [`pump`](Manager::pump).
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.settle_rx.recv_timeout(timeout) {
            Ok(settlement) => {
                self.settle(settlement);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    /// Drops registry entries whose handles have been destroyed, signaling
    /// each orphaned load's cancellation token. Returns how many were
    /// evicted.
    pub fn sweep(&mut self) -> usize {
        self.registry.sweep()
    }

    /// The number of loads currently bound to a handle.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    fn settle(&mut self, settlement: Settlement<A, H>) {
        if let Ok(artifact) = &settlement.result {
            if settlement.request.write_allowed() {
                self.cache.set(&settlement.request, artifact.clone());
            }
        }

        match self.registry.finish(settlement.key, settlement.binding) {
            Some(handle) => {
                log::trace!("delivering '{}'", settlement.request.uri());
                (settlement.deliver)(handle.as_ref(), settlement.result, DeliverySource::Loader);
            }
            None => {
                log::trace!("dropping stale completion for '{}'", settlement.request.uri());
            }
        }
    }
}
