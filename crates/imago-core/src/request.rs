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

//! The caller-supplied description of what to load.

use std::hash::{Hash, Hasher};

/// A description of a single load, plus its per-request cache policy.
///
/// A `Request` is immutable once issued to the manager for a given call.
/// Its cache identity is the `uri` alone: two requests for the same URI hit
/// the same cache slot even if their policy flags differ. The flags control
/// whether this particular call may *consult* the cache (`read_allowed`) and
/// whether a loader-sourced success may be *stored* into it
/// (`write_allowed`); they are independently controllable.
///
/// # Examples
///
/// ```
/// use imago_core::Request;
///
/// let request = Request::new("https://example.com/cover.png");
/// assert!(request.read_allowed());
///
/// // Force a fresh load but still update the cache afterwards.
/// let refresh = Request::new("https://example.com/cover.png").without_cache_read();
/// assert!(!refresh.read_allowed());
/// assert!(refresh.write_allowed());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    uri: String,
    read_allowed: bool,
    write_allowed: bool,
}

impl Request {
    /// Creates a request for `uri` with both cache directions allowed.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            read_allowed: true,
            write_allowed: true,
        }
    }

    /// Disallows consulting the cache for this call.
    ///
    /// The load always goes to the loader, even if a decoded artifact for
    /// the same URI is already cached.
    #[must_use]
    pub fn without_cache_read(mut self) -> Self {
        self.read_allowed = false;
        self
    }

    /// Disallows storing this call's result into the cache.
    #[must_use]
    pub fn without_cache_write(mut self) -> Self {
        self.write_allowed = false;
        self
    }

    /// The identity of the resource to load.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether the cache may be consulted before dispatching to the loader.
    #[must_use]
    pub fn read_allowed(&self) -> bool {
        self.read_allowed
    }

    /// Whether a loader-sourced success may be written into the cache.
    #[must_use]
    pub fn write_allowed(&self) -> bool {
        self.write_allowed
    }
}

// Cache identity is the URI only; policy flags never affect the key.
impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_allow_both_cache_directions() {
        let request = Request::new("a.png");
        assert!(request.read_allowed());
        assert!(request.write_allowed());
    }

    #[test]
    fn builder_toggles_are_independent() {
        let request = Request::new("a.png").without_cache_read();
        assert!(!request.read_allowed());
        assert!(request.write_allowed());

        let request = Request::new("a.png").without_cache_write();
        assert!(request.read_allowed());
        assert!(!request.write_allowed());
    }

    #[test]
    fn identity_ignores_policy_flags() {
        let plain = Request::new("a.png");
        let no_read = Request::new("a.png").without_cache_read();
        let other = Request::new("b.png");

        assert_eq!(plain, no_read);
        assert_ne!(plain, other);

        let mut map = HashMap::new();
        map.insert(plain, 1);
        // Same URI, different flags: must land in the same slot.
        map.insert(no_read, 2);
        assert_eq!(map.len(), 1);
    }
}
