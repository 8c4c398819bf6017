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

//! A side-table binding handle identities to their in-flight loads.
//!
//! The registry holds a [`Weak`] reference per handle, so binding a load to
//! a handle never extends the handle's lifetime. All mutation happens on the
//! control thread, so no locking is needed here.

use crate::binding::{BindingContext, BindingId};
use ahash::RandomState;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// The identity of a caller-owned handle, taken from its `Arc` allocation.
///
/// Address reuse after a handle dies is harmless: the dead entry's `Weak`
/// can never upgrade, and a new `load` for the reusing handle replaces the
/// entry outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleKey(usize);

impl HandleKey {
    /// The key for `handle`.
    #[must_use]
    pub fn of<H>(handle: &Arc<H>) -> Self {
        Self(Arc::as_ptr(handle) as usize)
    }
}

struct Entry<H> {
    handle: Weak<H>,
    binding: BindingContext,
}

/// Associates each handle with at most one [`BindingContext`].
///
/// Invariant: replacing or removing an entry cancels the outgoing context
/// (unless it was already delivered). The registry never keeps a handle
/// alive.
pub struct HandleRegistry<H> {
    entries: HashMap<HandleKey, Entry<H>, RandomState>,
}

impl<H> HandleRegistry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }

    /// Binds `context` as the current load for `handle`.
    ///
    /// Any previous context for the same handle is cancelled and discarded.
    /// Returns the key under which the binding was stored.
    pub fn bind(&mut self, handle: &Arc<H>, context: BindingContext) -> HandleKey {
        let key = HandleKey::of(handle);
        let entry = Entry {
            handle: Arc::downgrade(handle),
            binding: context,
        };
        if let Some(mut previous) = self.entries.insert(key, entry) {
            log::trace!("superseding binding {:?} for {key:?}", previous.binding.id());
            previous.binding.cancel();
        }
        key
    }

    /// Cancels and removes the entry for `handle`, if any.
    ///
    /// Returns `true` if an entry was removed. Idempotent.
    pub fn remove(&mut self, handle: &Arc<H>) -> bool {
        self.remove_key(HandleKey::of(handle))
    }

    /// Cancels and removes the entry stored under `key`, if any.
    pub fn remove_key(&mut self, key: HandleKey) -> bool {
        match self.entries.remove(&key) {
            Some(mut entry) => {
                entry.binding.cancel();
                true
            }
            None => false,
        }
    }

    /// Settles a completed load against the registry.
    ///
    /// This is the identity check performed at completion time: the entry
    /// under `key` must still exist, must be the exact binding that was
    /// dispatched (`id`), and its handle must still be alive. On success the
    /// entry is retired as delivered and the live handle is returned. On any
    /// mismatch the stale entry state is left to resolve itself (a dead
    /// handle's entry is dropped here, signaling its source) and `None` is
    /// returned; the caller must drop the result silently.
    pub fn finish(&mut self, key: HandleKey, id: BindingId) -> Option<Arc<H>> {
        let entry = self.entries.get_mut(&key)?;
        if entry.binding.id() != id {
            return None;
        }
        match entry.handle.upgrade() {
            Some(handle) => {
                entry.binding.mark_delivered();
                self.entries.remove(&key);
                Some(handle)
            }
            None => {
                // Handle died mid-flight; evicting the entry fires its
                // cancellation exactly once via the context's drop.
                self.entries.remove(&key);
                None
            }
        }
    }

    /// Drops every entry whose handle has been destroyed.
    ///
    /// Each evicted entry's context signals its cancellation source on the
    /// way out. Returns the number of entries evicted.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.handle.strong_count() > 0);
        before - self.entries.len()
    }

    /// Cancels and removes every entry.
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            entry.binding.cancel();
        }
        self.entries.clear();
    }

    /// The number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imago_core::CancellationSource;

    struct FakeView;

    fn active_binding() -> (BindingContext, imago_core::CancellationToken) {
        let source = CancellationSource::new();
        let token = source.token();
        (BindingContext::new(source), token)
    }

    #[test]
    fn bind_replaces_and_cancels_previous() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (first, first_token) = active_binding();
        registry.bind(&view, first);

        let (second, second_token) = active_binding();
        registry.bind(&view, second);

        assert_eq!(registry.len(), 1);
        assert!(first_token.is_cancelling());
        assert!(!second_token.is_cancelling());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (binding, token) = active_binding();
        registry.bind(&view, binding);

        assert!(registry.remove(&view));
        assert!(!registry.remove(&view));
        assert!(token.is_cancelling());
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_does_not_keep_the_handle_alive() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);
        let weak = Arc::downgrade(&view);

        let (binding, _token) = active_binding();
        registry.bind(&view, binding);

        drop(view);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn sweep_signals_dead_entries_exactly_once() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (binding, token) = active_binding();
        registry.bind(&view, binding);
        drop(view);

        assert_eq!(registry.sweep(), 1);
        assert!(token.is_cancelling());
        // Nothing left to evict.
        assert_eq!(registry.sweep(), 0);
    }

    #[test]
    fn finish_with_matching_identity_delivers() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (binding, token) = active_binding();
        let id = binding.id();
        let key = registry.bind(&view, binding);

        let handle = registry.finish(key, id);
        assert!(handle.is_some());
        assert!(registry.is_empty());
        // Delivered, not superseded: the source must stay quiet.
        assert!(!token.is_cancelling());
    }

    #[test]
    fn finish_with_stale_identity_is_refused() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (old, _old_token) = active_binding();
        let stale_id = old.id();
        registry.bind(&view, old);

        let (new, _new_token) = active_binding();
        let key = registry.bind(&view, new);

        assert!(registry.finish(key, stale_id).is_none());
        // The current binding is untouched.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn finish_after_handle_death_signals_and_refuses() {
        let mut registry = HandleRegistry::new();
        let view = Arc::new(FakeView);

        let (binding, token) = active_binding();
        let id = binding.id();
        let key = registry.bind(&view, binding);
        drop(view);

        assert!(registry.finish(key, id).is_none());
        assert!(token.is_cancelling());
        assert!(registry.is_empty());
    }
}
