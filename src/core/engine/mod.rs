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

//! Engine session context
//!
//! [`Engine`] owns everything that lives from initialization to shutdown:
//! the GPU backend, the shared parameter store, one [`FrameBuffer`] per
//! display buffer, the texture cache, controller state and the status line.
//! Every core operation takes it by reference; there is no hidden global
//! state.
//!
//! The operations are split by concern:
//!
//! - [`synthesis`]: texture association, full synthesis and partial update
//! - [`scheduler`]: `display` and the buffer flip
//! - [`update`]: controller polling and slot edits

mod scheduler;
mod synthesis;
mod update;

#[cfg(test)]
mod tests;

pub use synthesis::TextureReport;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::config::EngineConfig;
use super::controller::PadState;
use super::error::{EngineError, Result};
use super::gpu::GpuBackend;
use super::ot::FrameBuffer;
use super::params::{ParamStore, PrimitiveParam};
use super::texture::TextureCache;
use super::video::VideoMode;

/// Debug status line drawn over every frame
///
/// Rendered as `title`, `message` and `value` (upper-case hex) on three lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// First line
    pub title: String,
    /// Second line
    pub message: String,
    /// Numeric value shown on the third line
    pub value: u32,
}

impl StatusLine {
    /// Overlay text, cut to `max_chars` characters
    pub fn render(&self, max_chars: usize) -> String {
        format!("{}\n{}\n{:X}", self.title, self.message, self.value)
            .chars()
            .take(max_chars)
            .collect()
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            title: "Ordering Table Engine".to_string(),
            message: String::new(),
            value: 0,
        }
    }
}

/// Primitive engine session
///
/// # Example
///
/// ```
/// use psot::core::config::EngineConfig;
/// use psot::core::controller::VirtualPad;
/// use psot::core::engine::Engine;
/// use psot::core::gpu::HeadlessGpu;
///
/// let mut engine = Engine::new(EngineConfig::default(), HeadlessGpu::new())?;
/// let mut pad = VirtualPad::new();
/// engine.populate_ot();
/// for _ in 0..3 {
///     engine.run_frame(&mut pad)?;
/// }
/// assert_eq!(engine.frames(), 3);
/// assert_eq!(engine.current_buffer_index(), 1);
/// # Ok::<(), psot::core::error::EngineError>(())
/// ```
pub struct Engine<G: GpuBackend> {
    /// Session configuration
    config: EngineConfig,
    /// Video hardware
    gpu: G,
    /// Timing selected at initialization
    video_mode: VideoMode,
    /// Slot parameters shared by every framebuffer
    params: ParamStore,
    /// Framebuffer ring
    buffers: Vec<FrameBuffer>,
    /// Index of the buffer being built
    current: usize,
    /// Completed `display` calls
    frames: u64,
    /// Uploaded textures
    textures: TextureCache,
    /// Slot edited by the update loop
    selected: usize,
    /// Vertical blank of the last accepted select/recolor press
    prev_time: u32,
    /// Decoded controller ports
    pads: [PadState; 2],
    /// Overlay text
    status: StatusLine,
    /// Color randomizer
    rng: SmallRng,
}

impl<G: GpuBackend> Engine<G> {
    /// Initialize a session without a BIOS image
    ///
    /// `video_mode = "auto"` falls back to NTSC.
    pub fn new(config: EngineConfig, gpu: G) -> Result<Self> {
        Self::with_bios(config, gpu, None)
    }

    /// Initialize a session
    ///
    /// Allocates the parameter store and every framebuffer, clears each
    /// ordering table, resets the GPU, selects the video mode (detected from
    /// `bios` when the config says `auto`) and enables the display.
    ///
    /// # Arguments
    ///
    /// * `config` - Session configuration
    /// * `gpu` - Video backend
    /// * `bios` - BIOS image used for region detection
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for invalid geometry,
    /// [`EngineError::Allocation`] if any session array cannot be reserved.
    pub fn with_bios(config: EngineConfig, mut gpu: G, bios: Option<&[u8]>) -> Result<Self> {
        config.validate()?;

        let slots = config.ot_size();
        let count = config.buffer_count();
        let (width, height) = (config.display.width, config.display.height);

        let params = ParamStore::with_slots(slots)?;

        let mut buffers = Vec::new();
        buffers
            .try_reserve_exact(count)
            .map_err(|_| EngineError::Allocation {
                what: "framebuffers",
                requested: count,
            })?;
        for index in 0..count {
            buffers.push(FrameBuffer::new(
                index,
                slots,
                width,
                height,
                config.display.background,
            )?);
        }

        gpu.reset();
        let video_mode = config.display.video_mode.resolve(bios);
        gpu.set_video_mode(video_mode);
        gpu.set_display_mask(true);

        log::info!(
            "Engine initialized: {} slots, {} buffers, {}x{} {:?}",
            slots,
            count,
            width,
            height,
            video_mode
        );

        let rng = SmallRng::seed_from_u64(config.engine.seed);

        Ok(Self {
            config,
            gpu,
            video_mode,
            params,
            buffers,
            current: 0,
            frames: 0,
            textures: TextureCache::new(),
            selected: 0,
            prev_time: 0,
            pads: [PadState::disconnected(); 2],
            status: StatusLine::default(),
            rng,
        })
    }

    /// Session configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The GPU backend
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// Mutable GPU backend
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Video timing in use
    pub fn video_mode(&self) -> VideoMode {
        self.video_mode
    }

    /// Number of ordering-table slots
    pub fn ot_size(&self) -> usize {
        self.params.len()
    }

    /// Slot parameters
    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    /// Mutable slot parameters
    ///
    /// Edits reach the packed records on the next [`update_prim`](Self::update_prim)
    /// or [`populate_ot`](Self::populate_ot).
    pub fn params_mut(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    /// Replace the parameters of one slot
    pub fn set_param(&mut self, slot: usize, param: PrimitiveParam) -> Result<()> {
        self.params.set(slot, param)
    }

    /// Every framebuffer, in ring order
    pub fn buffers(&self) -> &[FrameBuffer] {
        &self.buffers
    }

    /// Framebuffer `index`
    pub fn buffer(&self, index: usize) -> Option<&FrameBuffer> {
        self.buffers.get(index)
    }

    /// Index of the buffer being built
    pub fn current_buffer_index(&self) -> usize {
        self.current
    }

    /// The buffer being built
    pub fn current_buffer(&self) -> &FrameBuffer {
        &self.buffers[self.current]
    }

    /// Completed `display` calls
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Texture cache
    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Slot the update loop is editing
    pub fn selected_slot(&self) -> usize {
        self.selected
    }

    /// Decoded state of controller port `port`
    pub fn pad(&self, port: usize) -> Option<&PadState> {
        self.pads.get(port)
    }

    /// Current status line
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Set the status line drawn over every frame
    pub fn set_message(&mut self, title: impl Into<String>, message: impl Into<String>, value: u32) {
        self.status = StatusLine {
            title: title.into(),
            message: message.into(),
            value,
        };
    }

    /// Give back the GPU backend, ending the session
    pub fn into_gpu(self) -> G {
        self.gpu
    }
}
