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

//! The default in-memory [`Cache`] implementation.

use ahash::RandomState;
use imago_core::{Artifact, ArtifactHandle, Cache, Request};
use std::collections::HashMap;
use std::sync::Mutex;

/// An unbounded map of decoded artifacts keyed by request identity.
///
/// Entries are cheap-clone [`ArtifactHandle`]s, so a `get` shares the
/// stored allocation rather than copying it. Writes are last-write-wins.
/// Eviction is out of scope here; callers needing a bound should wrap or
/// replace this type behind the [`Cache`] trait.
pub struct MemoryCache<A: Artifact> {
    entries: Mutex<HashMap<Request, ArtifactHandle<A>, RandomState>>,
}

impl<A: Artifact> MemoryCache<A> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::default()),
        }
    }

    /// The number of cached artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every cached artifact.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Request, ArtifactHandle<A>, RandomState>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<A: Artifact> Default for MemoryCache<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Artifact> Cache<A> for MemoryCache<A> {
    fn get(&self, request: &Request) -> Option<ArtifactHandle<A>> {
        self.lock().get(request).cloned()
    }

    fn set(&self, request: &Request, artifact: ArtifactHandle<A>) {
        self.lock().insert(request.clone(), artifact);
    }
}
