// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! psot: a double-buffered ordering-table primitive engine
//!
//! This crate builds 2D primitive draw lists for the PlayStation GPU: one
//! parameter record per ordering-table slot, packed GP0 packets per
//! framebuffer, and a scheduler that flips between framebuffers once per
//! vertical blank.
//!
//! # Architecture
//!
//! - [`core`]: Engine, ordering tables, GPU seam and collaborators
//! - [`frontend`]: Host-side pacing, scripted input and snapshots
//!
//! # Example
//!
//! ```
//! use psot::core::config::EngineConfig;
//! use psot::core::engine::Engine;
//! use psot::core::gpu::{Color, Dimensions, HeadlessGpu, Vertex};
//! use psot::core::params::PrimitiveParam;
//!
//! let mut engine = Engine::new(EngineConfig::default(), HeadlessGpu::new())?;
//! engine.set_param(
//!     0,
//!     PrimitiveParam::flat_quad(Vertex::new(8, 8), Dimensions::new(32, 32), Color::new(255, 0, 0)),
//! )?;
//! engine.populate_ot();
//! engine.display()?;
//! # Ok::<(), psot::core::error::EngineError>(())
//! ```
//!
//! # Modules
//!
//! - [`core::engine`]: Session context, synthesis passes, frame scheduler and update loop
//! - [`core::ot`]: Ordering tables and packed primitives
//! - [`core::params`]: Primitive parameter store
//! - [`core::texture`]: TIM parsing and texture uploads
//! - [`core::gpu`]: GPU backend trait and the headless software GPU
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an alias for
//! `Result<T, EngineError>`.

pub mod core;
pub mod frontend;

// Re-export commonly used types
pub use core::error::{EngineError, Result};
