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

//! Frontend module
//!
//! Host-side drivers for running the engine outside a console.
//!
//! # Architecture
//!
//! - [`frame_timer`]: Field-rate pacing ([`FrameTimer`], [`PacedGpu`])
//! - [`script`]: Controller input played back from a TOML script
//! - [`snapshot`]: PNG export of the displayed area and JSON frame traces

pub mod frame_timer;
pub mod script;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use frame_timer::{FrameTimer, PacedGpu};
pub use script::{InputScript, ScriptStep, ScriptedInput};
