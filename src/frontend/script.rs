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

//! Scripted controller input
//!
//! An input script holds the buttons pressed on pad 1 for a number of frames
//! at a time:
//!
//! ```toml
//! [[step]]
//! frames = 1
//! buttons = ["circle"]
//!
//! [[step]]
//! frames = 90
//! buttons = ["right", "down"]
//! ```
//!
//! Once the last step has run, every button is released.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::controller::{InputSource, PadButtons, VirtualPad, NO_PAD};
use crate::core::error::{EngineError, Result};

/// One `[[step]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Frames the buttons stay held
    pub frames: u32,
    /// Button names (`"cross"`, `"up"`, ...); empty holds nothing
    #[serde(default)]
    pub buttons: Vec<String>,
}

/// Input script file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputScript {
    /// Steps in playback order
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Load a script from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read script {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse script TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse script: {}", e)))
    }

    /// Frames covered by all steps
    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.frames)).sum()
    }
}

/// Plays an [`InputScript`] back as pad 1
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    steps: Vec<(u32, PadButtons)>,
    step: usize,
    frame: u32,
    pad: VirtualPad,
}

impl ScriptedInput {
    /// Resolve button names and start at the first step
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] naming the first unknown button.
    pub fn new(script: &InputScript) -> Result<Self> {
        let steps = script
            .steps
            .iter()
            .map(|step| {
                let mut mask = PadButtons::empty();
                for name in &step.buttons {
                    mask |= PadButtons::by_name(name).ok_or_else(|| {
                        EngineError::Config(format!("unknown button '{}'", name))
                    })?;
                }
                Ok((step.frames, mask))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut input = Self {
            steps,
            step: 0,
            frame: 0,
            pad: VirtualPad::new(),
        };
        input.skip_empty_steps();
        input.apply();
        Ok(input)
    }

    /// Whether every step has been played
    pub fn is_finished(&self) -> bool {
        self.step >= self.steps.len()
    }

    /// Buttons held this frame
    pub fn held(&self) -> PadButtons {
        self.steps
            .get(self.step)
            .map_or(PadButtons::empty(), |&(_, mask)| mask)
    }

    fn skip_empty_steps(&mut self) {
        while matches!(self.steps.get(self.step), Some(&(0, _))) {
            self.step += 1;
        }
    }

    fn apply(&mut self) {
        self.pad.release_all();
        self.pad.press(self.held());
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, port: usize) -> [u8; 4] {
        if port == 0 {
            self.pad.report()
        } else {
            NO_PAD
        }
    }

    fn advance(&mut self) {
        let Some(&(frames, _)) = self.steps.get(self.step) else {
            return;
        };
        self.frame += 1;
        if self.frame >= frames {
            self.frame = 0;
            self.step += 1;
            self.skip_empty_steps();
        }
        self.apply();
    }
}
