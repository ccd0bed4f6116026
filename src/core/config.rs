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

//! Engine configuration
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! [display]
//! width = 320
//! height = 240
//! background = { r = 0, g = 0, b = 0 }
//! video_mode = "auto"          # "auto" | "ntsc" | "pal"
//!
//! [engine]
//! primitives = 6
//! buffers = 2
//! debounce_ticks = 60
//! sync_poll_limit = 100000
//! stale_buffer = "lag"         # "lag" | "refresh-on-swap"
//! texture_failure = "skip-slot" # "skip-slot" | "abort"
//! seed = 1
//!
//! [text]
//! x = 5
//! y = 20
//! max_chars = 512
//!
//! [card]
//! poll_limit = 100000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{EngineError, Result};
use super::gpu::Color;
use super::video::VideoMode;

/// Environment variable naming the configuration file
pub const ENV_CONFIG: &str = "PSOT_CONFIG";

/// Environment variable naming the storage root
pub const ENV_ASSETS: &str = "PSOT_ASSETS";

/// Environment variable naming the BIOS image
pub const ENV_BIOS: &str = "PSOT_BIOS";

/// VRAM height available to one buffer pair
const MAX_BUFFER_HEIGHT: u16 = 256;

/// VRAM width
const MAX_WIDTH: u16 = 1024;

/// Video mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoModeSetting {
    /// Detect from the BIOS region byte
    #[default]
    Auto,
    /// Force NTSC
    Ntsc,
    /// Force PAL
    Pal,
}

impl VideoModeSetting {
    /// Resolve to a concrete mode
    pub fn resolve(&self, bios: Option<&[u8]>) -> VideoMode {
        match self {
            VideoModeSetting::Auto => VideoMode::detect(bios),
            VideoModeSetting::Ntsc => VideoMode::Ntsc,
            VideoModeSetting::Pal => VideoMode::Pal,
        }
    }
}

/// What happens to buffers that were not current when parameters changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleBufferPolicy {
    /// Partial updates touch only the current buffer; others catch up on
    /// their own turn
    #[default]
    Lag,
    /// A buffer that becomes current with older parameters is rewritten
    /// before anything else touches it
    RefreshOnSwap,
}

/// What the texture pass does with an image that fails to upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureFailurePolicy {
    /// Log, leave the slot without a texture and continue
    #[default]
    SkipSlot,
    /// Stop the pass and return the error
    Abort,
}

/// Screen geometry and clear color
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Visible width in pixels
    pub width: u16,
    /// Visible height in pixels
    pub height: u16,
    /// Background clear color
    pub background: Color,
    /// Timing selection
    pub video_mode: VideoModeSetting,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            background: Color::BLACK,
            video_mode: VideoModeSetting::Auto,
        }
    }
}

/// Ordering table and update loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Number of primitive slots (ordering table size)
    pub primitives: usize,
    /// Number of framebuffers
    pub buffers: usize,
    /// Vertical blanks between accepted select / recolor presses
    pub debounce_ticks: u32,
    /// Draw-sync polls before `display` gives up
    pub sync_poll_limit: u32,
    /// Handling of non-current buffers
    pub stale_buffer: StaleBufferPolicy,
    /// Handling of texture upload failures
    pub texture_failure: TextureFailurePolicy,
    /// Seed of the color randomizer
    pub seed: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            primitives: 6,
            buffers: 2,
            debounce_ticks: 60,
            sync_poll_limit: 100_000,
            stale_buffer: StaleBufferPolicy::Lag,
            texture_failure: TextureFailurePolicy::SkipSlot,
            seed: 1,
        }
    }
}

/// Debug text overlay placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Left edge of the text window
    pub x: u16,
    /// Top edge of the text window
    pub y: u16,
    /// Characters kept per frame
    pub max_chars: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            x: 5,
            y: 20,
            max_chars: 512,
        }
    }
}

/// Memory card settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Completion polls before a card operation gives up
    pub poll_limit: u32,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            poll_limit: 100_000,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `[display]`
    pub display: DisplayConfig,
    /// `[engine]`
    pub engine: EngineSection,
    /// `[text]`
    pub text: TextConfig,
    /// `[card]`
    pub card: CardConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if the file cannot be read, parsed or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load from the file named by `PSOT_CONFIG`, or use defaults
    ///
    /// A `.env` file in the working directory is read first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        match env_path(ENV_CONFIG) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check the geometry fits in VRAM
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for a zero-sized screen, a width above 1024 or
    /// a height above 256 (two buffers are stacked vertically in 512 lines).
    pub fn validate(&self) -> Result<()> {
        let DisplayConfig { width, height, .. } = self.display;
        if width == 0 || height == 0 {
            return Err(EngineError::Config(format!(
                "display size {}x{} is empty",
                width, height
            )));
        }
        if width > MAX_WIDTH || height > MAX_BUFFER_HEIGHT {
            return Err(EngineError::Config(format!(
                "display size {}x{} does not fit two buffers in VRAM",
                width, height
            )));
        }
        Ok(())
    }

    /// Ordering table size (at least 1)
    pub fn ot_size(&self) -> usize {
        self.engine.primitives.max(1)
    }

    /// Framebuffer count (at least 2)
    pub fn buffer_count(&self) -> usize {
        self.engine.buffers.max(2)
    }
}

/// Path from an environment variable, ignoring empty values
pub fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
