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

//! The per-handle record tying a load to its cancellation source.

use imago_core::CancellationSource;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity for one binding of a load to a handle.
///
/// The completion path compares the id it captured at dispatch time against
/// the id currently registered for the handle; a mismatch means the load was
/// superseded and its result must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

impl BindingId {
    fn next() -> Self {
        Self(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The record pairing a handle's current load with its cancellation source.
///
/// A context is created when a load is dispatched and owns the active
/// [`CancellationSource`] for exactly as long as that load is the handle's
/// current one. It moves through three states:
///
/// - **Active**: owns a live source.
/// - **Superseded**: [`cancel`](BindingContext::cancel) signaled the source
///   and released it. Terminal.
/// - **Delivered**: [`mark_delivered`](BindingContext::mark_delivered)
///   consumed the source without signaling. Terminal.
///
/// Dropping a context that is still active signals its source. This is what
/// makes "handle destroyed ⇒ load cancelled" automatic: when the registry
/// discards an entry whose handle died, the discarded context fires the
/// cancellation on its way out.
#[derive(Debug)]
pub struct BindingContext {
    id: BindingId,
    source: Option<CancellationSource>,
}

impl BindingContext {
    /// Creates an active context owning `source`.
    #[must_use]
    pub fn new(source: CancellationSource) -> Self {
        Self {
            id: BindingId::next(),
            source: Some(source),
        }
    }

    /// This binding's identity.
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Whether the context still owns a live source.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Signals the source and releases it. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(source) = self.source.take() {
            source.cancel();
        }
    }

    /// Consumes the source without signaling it.
    ///
    /// Called after the result reached the caller, so that this context's
    /// eventual destruction cannot fire a stale cancellation.
    pub fn mark_delivered(&mut self) {
        if let Some(source) = self.source.take() {
            source.consume();
        }
    }
}

impl Drop for BindingContext {
    fn drop(&mut self) {
        if let Some(source) = self.source.take() {
            log::trace!("binding {:?} dropped while active, cancelling", self.id);
            source.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = BindingContext::new(CancellationSource::new());
        let b = BindingContext::new(CancellationSource::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn drop_while_active_signals() {
        let source = CancellationSource::new();
        let token = source.token();
        let ctx = BindingContext::new(source);

        drop(ctx);
        assert!(token.is_cancelling());
    }

    #[test]
    fn cancel_is_idempotent() {
        let source = CancellationSource::new();
        let token = source.token();
        let mut ctx = BindingContext::new(source);

        ctx.cancel();
        ctx.cancel();

        assert!(!ctx.is_active());
        assert!(token.is_cancelling());
    }

    #[test]
    fn delivered_context_never_signals() {
        let source = CancellationSource::new();
        let token = source.token();
        let mut ctx = BindingContext::new(source);

        ctx.mark_delivered();
        drop(ctx);

        assert!(!token.is_cancelling());
    }
}
