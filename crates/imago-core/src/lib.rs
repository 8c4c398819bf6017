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

//! # Imago Core
//!
//! Foundational crate containing traits, core types, and interface contracts
//! for the image request-lifecycle pipeline.
//!
//! This crate defines the "common language" of the library: the [`Request`]
//! type, the [`ArtifactHandle`] smart pointer, the one-shot cancellation
//! source/token pair, and the [`Loader`]/[`Cache`] capability contracts that
//! higher-level crates implement or consume. It has no knowledge of how
//! requests are scheduled or how results are marshaled back to callers.

#![warn(missing_docs)]

pub mod artifact;
pub mod cancel;
pub mod capability;
pub mod error;
pub mod request;

pub use artifact::{Artifact, ArtifactHandle};
pub use cancel::{CancellationSource, CancellationToken};
pub use capability::{Cache, Completion, Loader};
pub use error::{LoadError, LoadResult};
pub use request::Request;
