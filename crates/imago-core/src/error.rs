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

//! Error and result types shared across the pipeline.
//!
//! The pipeline introduces no failure taxonomy of its own: a load either
//! succeeds or fails with whatever the loader reported, forwarded verbatim.
//! Cancellation is not an error: a cancelled, never-delivered load simply
//! never invokes its callback.

use crate::artifact::ArtifactHandle;
use thiserror::Error;

/// The opaque cause reported by a loader implementation.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// A failed load, wrapping the loader's cause unchanged.
#[derive(Debug, Error)]
#[error("load failed: {cause}")]
pub struct LoadError {
    #[source]
    cause: BoxedCause,
}

impl LoadError {
    /// Wraps a loader-reported cause.
    pub fn new(cause: impl Into<BoxedCause>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// The underlying cause, as the loader reported it.
    #[must_use]
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }
}

impl From<BoxedCause> for LoadError {
    fn from(cause: BoxedCause) -> Self {
        Self { cause }
    }
}

/// The outcome of a single load attempt: a shared artifact or the loader's
/// failure. Produced exactly once per attempt; no partial states.
pub type LoadResult<A> = Result<ArtifactHandle<A>, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_cause() {
        let error = LoadError::new("connection reset");
        assert_eq!(error.to_string(), "load failed: connection reset");
    }

    #[test]
    fn cause_is_preserved_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow origin");
        let error = LoadError::new(io);
        assert_eq!(error.cause().to_string(), "slow origin");
    }
}
