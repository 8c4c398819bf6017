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

//! The [`Artifact`] marker trait and the shared [`ArtifactHandle`] pointer.

use std::{ops::Deref, sync::Arc};

/// A marker trait for types that can be produced by a load pipeline.
///
/// An artifact is the fully-decoded end product of a request, typically a
/// bitmap, but any decoded resource qualifies. The supertraits enforce the
/// guarantees the pipeline relies on:
/// - `Send` + `Sync`: the artifact can cross from the loader's worker thread
///   back to the control thread and be shared from the cache.
/// - `'static`: the artifact owns its data and can outlive the request that
///   produced it.
///
/// # Examples
///
/// ```
/// use imago_core::Artifact;
///
/// struct Bitmap {
///     // ... fields
/// }
///
/// impl Artifact for Bitmap {}
/// ```
pub trait Artifact: Send + Sync + 'static {}

/// A thread-safe, reference-counted handle to a decoded artifact.
///
/// This acts as a smart pointer, providing shared ownership of the decoded
/// data. Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying artifact. The cache and every
/// delivered result share the same allocation.
///
/// The artifact is deallocated when the last handle is dropped.
#[derive(Debug)]
pub struct ArtifactHandle<A: Artifact>(Arc<A>);

impl<A: Artifact> ArtifactHandle<A> {
    /// Creates a new `ArtifactHandle` that takes ownership of the artifact.
    ///
    /// This is typically called by a [`Loader`](crate::Loader) implementation
    /// once decoding has finished.
    pub fn new(artifact: A) -> Self {
        Self(Arc::new(artifact))
    }

    /// Returns `true` if both handles point at the same allocation.
    ///
    /// Useful in tests asserting that a cache hit returned the stored
    /// artifact rather than a copy.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<A: Artifact> Clone for ArtifactHandle<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Artifact> Deref for ArtifactHandle<A> {
    type Target = A;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
