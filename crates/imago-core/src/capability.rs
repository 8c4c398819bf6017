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

//! Capability contracts the pipeline consumes.
//!
//! The pipeline orchestrates; it never fetches or decodes anything itself.
//! Those concerns live behind the two narrow contracts here: a [`Loader`]
//! that executes requests asynchronously, and a [`Cache`] of already-decoded
//! artifacts. Both are stateless collaborators from the pipeline's point of
//! view, shared across requests rather than owned per-request.

use crate::artifact::{Artifact, ArtifactHandle};
use crate::cancel::CancellationToken;
use crate::error::LoadResult;
use crate::request::Request;

/// The continuation a [`Loader`] resolves with, exactly once.
///
/// Safe to call from any thread; the pipeline marshals the result back to
/// its control thread internally.
pub type Completion<A> = Box<dyn FnOnce(LoadResult<A>) + Send>;

/// Executes load requests on behalf of the pipeline.
///
/// Implementations own the actual I/O and decoding, and decide where that
/// work runs; the pipeline only requires that `complete` is eventually
/// invoked exactly once per call (success or failure), unless the process
/// terminates first.
///
/// Cancellation is advisory. An implementation must perform a cheap
/// preflight check of `token` before doing expensive work and should check
/// it periodically during long operations, but it is not required to
/// guarantee the result is never produced after the signal fires; a late
/// result is dropped by the pipeline, not the loader.
pub trait Loader<A: Artifact>: Send + Sync {
    /// Starts loading `request`, resolving `complete` with the outcome.
    fn load(&self, request: Request, token: CancellationToken, complete: Completion<A>);
}

/// A synchronous store of decoded artifacts, keyed by request identity.
///
/// `get` and `set` must be cheap and free of side effects beyond the cache's
/// own state. No ordering guarantees are required between concurrent writers
/// beyond last-write-wins. Eviction policy is entirely the implementation's
/// concern.
pub trait Cache<A: Artifact>: Send + Sync {
    /// Looks up the artifact cached for `request`, if any.
    fn get(&self, request: &Request) -> Option<ArtifactHandle<A>>;

    /// Stores `artifact` for `request`, replacing any previous entry.
    fn set(&self, request: &Request, artifact: ArtifactHandle<A>);
}
