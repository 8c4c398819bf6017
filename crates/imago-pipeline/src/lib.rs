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

//! # Imago Pipeline
//!
//! The request-lifecycle core of the library: given an opaque caller-owned
//! handle and a [`Request`](imago_core::Request), the [`Manager`] probes the
//! memory cache, otherwise dispatches an asynchronous load, guarantees at
//! most one in-flight load per handle by cancelling any prior load for the
//! same handle, and delivers each completed result at most once, and only
//! if the handle is still bound to that exact load.
//!
//! The public surface is designed for a single control thread. Loader work
//! runs wherever the [`Loader`](imago_core::Loader) implementation chooses;
//! completions are marshaled back through an internal channel and settled by
//! [`Manager::pump`].

#![warn(missing_docs)]

pub mod binding;
pub mod loaders;
pub mod manager;
pub mod memory_cache;
pub mod registry;

pub use loaders::FnLoader;
pub use manager::{DeliverySource, Manager};
pub use memory_cache::MemoryCache;
