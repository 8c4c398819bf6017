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

//! Adapters for plugging plain functions in as [`Loader`]s.

use imago_core::{Artifact, CancellationToken, Completion, Loader, Request};

/// Wraps a closure as a [`Loader`].
///
/// The closure decides where its work runs: resolve `complete` inline for a
/// synchronous loader, or move it onto a thread or executor for real I/O.
///
/// # Examples
///
/// ```
/// use imago_core::{Artifact, ArtifactHandle, CancellationToken, Completion, Request};
/// use imago_pipeline::FnLoader;
///
/// struct Bitmap(u32);
/// impl Artifact for Bitmap {}
///
/// let loader = FnLoader::new(
///     |request: Request, token: CancellationToken, complete: Completion<Bitmap>| {
///         if token.is_cancelling() {
///             return; // a cancelled load may simply never resolve
///         }
///         let _ = request;
///         complete(Ok(ArtifactHandle::new(Bitmap(42))));
///     },
/// );
/// # let _: FnLoader<_> = loader;
/// ```
pub struct FnLoader<F> {
    f: F,
}

impl<F> FnLoader<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<A, F> Loader<A> for FnLoader<F>
where
    A: Artifact,
    F: Fn(Request, CancellationToken, Completion<A>) + Send + Sync,
{
    fn load(&self, request: Request, token: CancellationToken, complete: Completion<A>) {
        (self.f)(request, token, complete);
    }
}
