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

//! Engine core
//!
//! Everything that runs inside the frame loop lives here. Collaborators
//! (GPU, storage, controller, memory card) are reached through traits so the
//! same engine drives the software GPU in tests and the CLI.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod memcard;
pub mod ot;
pub mod params;
pub mod scene;
pub mod storage;
pub mod texture;
pub mod video;
