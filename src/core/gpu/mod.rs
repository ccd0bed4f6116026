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

//! GPU backend interface
//!
//! The engine never touches video hardware directly. Everything it needs
//! (draw-queue status, vertical sync, environment setup, ordering table
//! submission, VRAM uploads and the debug text layer) goes through
//! [`GpuBackend`].
//!
//! [`HeadlessGpu`] is a software implementation with 1MB of VRAM
//! (1024×512 pixels, 16-bit 5-5-5 RGB) that decodes and rasterizes the GP0
//! packets streamed to it.
//!
//! # References
//!
//! - [PSX-SPX: GPU](http://problemkaputt.de/psx-spx.htm#gpu)
//! - [PSX-SPX: GPU Render Polygon Commands](http://problemkaputt.de/psx-spx.htm#gpurenderpolygoncommands)

mod headless;
mod primitives;
mod registers;

pub use headless::{DrawCommand, HeadlessGpu};
pub use primitives::*;
pub use registers::*;

use super::ot::FrameBuffer;
use super::video::VideoMode;

/// Video hardware as seen by the engine
///
/// All calls are non-blocking except [`wait_vblank`](GpuBackend::wait_vblank);
/// bounded waiting on [`draw_sync`](GpuBackend::draw_sync) is the caller's
/// job.
pub trait GpuBackend {
    /// Reset drawing state (ResetGraph)
    fn reset(&mut self);

    /// Select PAL or NTSC timing
    fn set_video_mode(&mut self, mode: VideoMode);

    /// Number of packets still queued for drawing; 0 once the GPU is idle
    fn draw_sync(&mut self) -> usize;

    /// Block until the next vertical blank
    fn wait_vblank(&mut self);

    /// Monotonic count of vertical blanks since reset
    fn vblank_count(&self) -> u32;

    /// Apply a drawing environment
    fn put_draw_env(&mut self, env: &DrawEnv);

    /// Apply a display environment
    fn put_disp_env(&mut self, env: &DispEnv);

    /// Feed one word to the GP0 command port
    fn write_gp0(&mut self, word: u32);

    /// Submit an ordering table for drawing
    ///
    /// Walks the chain from bucket 0 and streams every packet word to GP0,
    /// the way the linked-list DMA channel does.
    fn draw_ot(&mut self, buffer: &FrameBuffer) {
        for entry in buffer.chain() {
            for &word in entry.words {
                self.write_gp0(word);
            }
        }
    }

    /// Copy 16-bit pixels into a VRAM rectangle (row-major)
    fn load_image(&mut self, rect: Rect, pixels: &[u16]);

    /// Queue text for the debug overlay
    fn print_text(&mut self, text: &str);

    /// Draw queued overlay text
    fn flush_text(&mut self);

    /// Enable or blank the video output
    fn set_display_mask(&mut self, enabled: bool);
}
