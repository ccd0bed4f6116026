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

//! Headless software GPU
//!
//! [`HeadlessGpu`] implements [`GpuBackend`] without any video hardware. GP0
//! words are collected in a command FIFO; once a command is complete it is
//! decoded into a [`DrawCommand`], recorded in the frame log and rasterized
//! into VRAM.
//!
//! Drawing happens synchronously, but the backend can report a configurable
//! number of busy polls after each submission so callers exercise their
//! draw-sync wait.

mod decode;
mod raster;

use std::collections::VecDeque;

pub use decode::DrawCommand;

use self::raster::{rgb15_to_rgb24, Rasterizer};
use super::primitives::{Color, TextureInfo};
use super::registers::{DispEnv, DisplayArea, DrawEnv, DrawMode, DrawingArea, Rect};
use super::GpuBackend;
use crate::core::video::VideoMode;

/// Software GPU with VRAM, a GP0 decoder and a frame log
///
/// # Examples
///
/// ```
/// use psot::core::gpu::{GpuBackend, HeadlessGpu};
///
/// let mut gpu = HeadlessGpu::new();
/// gpu.write_gp0(0x6000_00FF); // red tile
/// gpu.write_gp0(0x0000_0000); // at (0, 0)
/// gpu.write_gp0(0x0001_0001); // 1×1
/// assert_eq!(gpu.read_vram(0, 0), 0x001F);
/// ```
pub struct HeadlessGpu {
    /// VRAM: 1024×512 pixels, 16-bit per pixel, row-major
    vram: Vec<u16>,

    /// Box rasterizer carrying clip rectangle and offset
    rasterizer: Rasterizer,

    /// Current draw mode (texture page for sprites)
    draw_mode: DrawMode,

    /// Region output to the display
    display_area: DisplayArea,

    /// Command FIFO buffer
    command_fifo: VecDeque<u32>,

    /// Commands decoded since the last drawing environment was applied
    frame_log: Vec<DrawCommand>,

    /// Busy polls reported after each completed command
    draw_latency: usize,

    /// Busy polls left before the draw queue reports idle
    busy_polls: usize,

    /// Vertical blank counter
    vblank_counter: u32,

    /// Video timing
    video_mode: VideoMode,

    /// Output enabled
    display_enabled: bool,

    /// Text queued by `print_text`
    text_queue: String,

    /// Text shown by the last `flush_text`
    overlay: Vec<String>,

    /// Number of display environments applied
    flips: u64,
}

impl HeadlessGpu {
    /// VRAM width in pixels
    pub const VRAM_WIDTH: usize = 1024;

    /// VRAM height in pixels
    pub const VRAM_HEIGHT: usize = 512;

    /// Total VRAM size in pixels
    pub const VRAM_SIZE: usize = Self::VRAM_WIDTH * Self::VRAM_HEIGHT;

    /// Create a GPU with black VRAM and an idle draw queue
    pub fn new() -> Self {
        Self {
            vram: vec![0x0000; Self::VRAM_SIZE],
            rasterizer: Rasterizer::new(),
            draw_mode: DrawMode::default(),
            display_area: DisplayArea::default(),
            command_fifo: VecDeque::new(),
            frame_log: Vec::new(),
            draw_latency: 0,
            busy_polls: 0,
            vblank_counter: 0,
            video_mode: VideoMode::Ntsc,
            display_enabled: false,
            text_queue: String::new(),
            overlay: Vec::new(),
            flips: 0,
        }
    }

    /// Report `polls` busy draw-sync polls after every drawn command
    ///
    /// `usize::MAX` models a GPU that never drains.
    pub fn with_draw_latency(mut self, polls: usize) -> Self {
        self.draw_latency = polls;
        self
    }

    /// Number of words a GP0 command occupies, given its first word
    pub fn command_length(first_word: u32) -> usize {
        decode::command_length(first_word)
    }

    /// Read a 16-bit pixel from VRAM, wrapping coordinates
    #[inline(always)]
    pub fn read_vram(&self, x: u16, y: u16) -> u16 {
        self.vram[Self::vram_index(x, y)]
    }

    /// Write a 16-bit pixel to VRAM, wrapping coordinates
    #[inline(always)]
    pub fn write_vram(&mut self, x: u16, y: u16, value: u16) {
        let index = Self::vram_index(x, y);
        self.vram[index] = value;
    }

    #[inline(always)]
    fn vram_index(x: u16, y: u16) -> usize {
        let x = (x & 0x3FF) as usize;
        let y = (y & 0x1FF) as usize;
        y * Self::VRAM_WIDTH + x
    }

    /// Commands decoded for the frame currently being drawn
    pub fn frame_log(&self) -> &[DrawCommand] {
        &self.frame_log
    }

    /// Text lines shown by the last overlay flush
    pub fn overlay(&self) -> &[String] {
        &self.overlay
    }

    /// Active video timing
    pub fn video_mode(&self) -> VideoMode {
        self.video_mode
    }

    /// Whether video output is enabled
    pub fn display_enabled(&self) -> bool {
        self.display_enabled
    }

    /// Region of VRAM currently on screen
    pub fn display_area(&self) -> DisplayArea {
        self.display_area
    }

    /// Number of display environments applied since reset
    pub fn flips(&self) -> u64 {
        self.flips
    }

    /// Generate an RGB24 image of the display area
    ///
    /// Each 5-bit channel is widened to 8 bits by a left shift of 3.
    pub fn get_framebuffer(&self) -> Vec<u8> {
        let width = self.display_area.width as usize;
        let height = self.display_area.height as usize;
        let mut framebuffer = vec![0u8; width * height * 3];

        for y in 0..height {
            for x in 0..width {
                let vram_x = (self.display_area.x as usize + x) % Self::VRAM_WIDTH;
                let vram_y = (self.display_area.y as usize + y) % Self::VRAM_HEIGHT;
                let (r, g, b) = rgb15_to_rgb24(self.vram[vram_y * Self::VRAM_WIDTH + vram_x]);

                let fb_index = (y * width + x) * 3;
                framebuffer[fb_index] = r;
                framebuffer[fb_index + 1] = g;
                framebuffer[fb_index + 2] = b;
            }
        }

        framebuffer
    }

    /// Execute the command at the front of the FIFO if it is complete
    fn try_process_command(&mut self) {
        while let Some(&first) = self.command_fifo.front() {
            let len = decode::command_length(first);
            if self.command_fifo.len() < len {
                return;
            }
            let words: Vec<u32> = self.command_fifo.drain(..len).collect();
            let command = decode::decode(&words);
            self.execute(&command);
            self.frame_log.push(command);
        }
    }

    fn execute(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::FillRect {
                origin,
                size,
                color,
            } => Rasterizer::fill(&mut self.vram, *origin, size.w, size.h, color),
            DrawCommand::FlatQuad { vertices, color } => {
                let (origin, w, h) = Rasterizer::quad_bounds(vertices);
                self.rasterizer
                    .draw_rectangle(&mut self.vram, origin, w, h, color);
            }
            DrawCommand::ShadedQuad { vertices, colors } => {
                let (origin, w, h) = Rasterizer::quad_bounds(vertices);
                self.rasterizer
                    .draw_shaded_rectangle(&mut self.vram, origin, w, h, colors);
            }
            DrawCommand::TexturedQuad {
                vertices,
                texcoords,
                texture,
                color,
                raw,
            } => {
                let (origin, w, h) = Rasterizer::quad_bounds(vertices);
                self.rasterizer.draw_textured_quad(
                    &mut self.vram,
                    origin,
                    w,
                    h,
                    texcoords,
                    texture,
                    &[*color; 4],
                    *raw,
                );
            }
            DrawCommand::ShadedTexturedQuad {
                vertices,
                texcoords,
                texture,
                colors,
            } => {
                let (origin, w, h) = Rasterizer::quad_bounds(vertices);
                self.rasterizer.draw_textured_quad(
                    &mut self.vram,
                    origin,
                    w,
                    h,
                    texcoords,
                    texture,
                    colors,
                    false,
                );
            }
            DrawCommand::Rectangle {
                origin,
                size,
                color,
            } => {
                self.rasterizer
                    .draw_rectangle(&mut self.vram, *origin, size.w, size.h, color);
            }
            DrawCommand::TexturedRectangle {
                origin,
                size,
                texcoord,
                clut,
                color,
                raw,
            } => {
                let texture = self.sprite_texture(*clut);
                self.rasterizer.draw_textured_rectangle(
                    &mut self.vram,
                    *origin,
                    size.w,
                    size.h,
                    *texcoord,
                    &texture,
                    color,
                    *raw,
                );
            }
            DrawCommand::DrawMode { texpage } => {
                self.draw_mode = DrawMode::from_word(*texpage as u32);
            }
            DrawCommand::Unsupported { opcode } => {
                log::warn!("Unsupported GP0 command: 0x{:02X}", opcode);
                return;
            }
        }
        self.busy_polls = self.draw_latency;
    }

    /// Texture info for a sprite: page from the draw mode, palette from the packet
    fn sprite_texture(&self, clut: u16) -> TextureInfo {
        let tpage = (self.draw_mode.texture_page_x_base / 64)
            | ((self.draw_mode.texture_page_y_base / 256) << 4)
            | ((self.draw_mode.texture_depth as u16) << 7);
        TextureInfo::from_ids(tpage, clut)
    }
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for HeadlessGpu {
    fn reset(&mut self) {
        self.vram.fill(0x0000);
        self.rasterizer = Rasterizer::new();
        self.draw_mode = DrawMode::default();
        self.display_area = DisplayArea::default();
        self.command_fifo.clear();
        self.frame_log.clear();
        self.busy_polls = 0;
        self.vblank_counter = 0;
        self.text_queue.clear();
        self.overlay.clear();
        self.flips = 0;
    }

    fn set_video_mode(&mut self, mode: VideoMode) {
        log::info!("Video mode: {:?}", mode);
        self.video_mode = mode;
    }

    fn draw_sync(&mut self) -> usize {
        if self.busy_polls == 0 {
            return 0;
        }
        let remaining = self.busy_polls;
        if self.busy_polls != usize::MAX {
            self.busy_polls -= 1;
        }
        remaining
    }

    fn wait_vblank(&mut self) {
        self.vblank_counter = self.vblank_counter.wrapping_add(1);
    }

    fn vblank_count(&self) -> u32 {
        self.vblank_counter
    }

    fn put_draw_env(&mut self, env: &DrawEnv) {
        self.frame_log.clear();
        self.rasterizer.set_clip(DrawingArea::from(env.clip));
        self.rasterizer.set_offset(env.offset);
        self.draw_mode = DrawMode::from_word(env.tpage as u32);
        self.draw_mode.dithering = env.dither;
        self.draw_mode.draw_to_display = env.draw_on_display;

        if env.isbg {
            let origin = super::Vertex::new(env.clip.x as i16, env.clip.y as i16);
            Rasterizer::fill(
                &mut self.vram,
                origin,
                env.clip.w,
                env.clip.h,
                &env.background,
            );
        }
    }

    fn put_disp_env(&mut self, env: &DispEnv) {
        self.display_area = DisplayArea {
            x: env.disp.x,
            y: env.disp.y,
            width: env.disp.w,
            height: env.disp.h,
        };
        self.flips += 1;
    }

    fn write_gp0(&mut self, word: u32) {
        self.command_fifo.push_back(word);
        self.try_process_command();
    }

    fn load_image(&mut self, rect: Rect, pixels: &[u16]) {
        if pixels.len() < rect.area() {
            log::warn!(
                "LoadImage: {} pixels supplied for a {}x{} rectangle",
                pixels.len(),
                rect.w,
                rect.h
            );
        }
        for (i, &pixel) in pixels.iter().take(rect.area()).enumerate() {
            let dx = (i % rect.w as usize) as u16;
            let dy = (i / rect.w as usize) as u16;
            self.write_vram(rect.x.wrapping_add(dx), rect.y.wrapping_add(dy), pixel);
        }
    }

    fn print_text(&mut self, text: &str) {
        self.text_queue.push_str(text);
    }

    fn flush_text(&mut self) {
        self.overlay = self.text_queue.lines().map(str::to_owned).collect();
        self.text_queue.clear();
    }

    fn set_display_mask(&mut self, enabled: bool) {
        self.display_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::{Dimensions, Vertex};

    #[test]
    fn test_fifo_waits_for_complete_command() {
        let mut gpu = HeadlessGpu::new();
        gpu.write_gp0(0x2800_FF00);
        gpu.write_gp0(Vertex::new(0, 0).to_u32());
        assert!(gpu.frame_log().is_empty());

        gpu.write_gp0(Vertex::new(4, 0).to_u32());
        gpu.write_gp0(Vertex::new(0, 4).to_u32());
        gpu.write_gp0(Vertex::new(4, 4).to_u32());
        assert_eq!(gpu.frame_log().len(), 1);
        assert_eq!(gpu.read_vram(3, 3), Color::new(0, 255, 0).to_rgb15());
        assert_eq!(gpu.read_vram(4, 4), 0);
    }

    #[test]
    fn test_draw_env_clears_background_and_log() {
        let mut gpu = HeadlessGpu::new();
        gpu.write_gp0(0xE100_0000);
        assert_eq!(gpu.frame_log().len(), 1);

        let env = DrawEnv::new(0, 240, 320, 240).with_background(Color::new(0, 0, 255));
        gpu.put_draw_env(&env);
        assert!(gpu.frame_log().is_empty());
        assert_eq!(gpu.read_vram(0, 240), 0x7C00);
        assert_eq!(gpu.read_vram(319, 479), 0x7C00);
        assert_eq!(gpu.read_vram(0, 0), 0);
    }

    #[test]
    fn test_draw_latency_counts_down() {
        let mut gpu = HeadlessGpu::new().with_draw_latency(2);
        assert_eq!(gpu.draw_sync(), 0);

        gpu.write_gp0(0x6000_0000);
        gpu.write_gp0(0);
        gpu.write_gp0(Dimensions::new(1, 1).to_u32());
        assert_eq!(gpu.draw_sync(), 2);
        assert_eq!(gpu.draw_sync(), 1);
        assert_eq!(gpu.draw_sync(), 0);
    }

    #[test]
    fn test_stalled_gpu_never_drains() {
        let mut gpu = HeadlessGpu::new().with_draw_latency(usize::MAX);
        gpu.write_gp0(0xE100_0000);
        for _ in 0..100 {
            assert_ne!(gpu.draw_sync(), 0);
        }
    }

    #[test]
    fn test_load_image_row_major() {
        let mut gpu = HeadlessGpu::new();
        gpu.load_image(Rect::new(640, 0, 2, 2), &[1, 2, 3, 4]);
        assert_eq!(gpu.read_vram(640, 0), 1);
        assert_eq!(gpu.read_vram(641, 0), 2);
        assert_eq!(gpu.read_vram(640, 1), 3);
        assert_eq!(gpu.read_vram(641, 1), 4);
    }

    #[test]
    fn test_overlay_lines() {
        let mut gpu = HeadlessGpu::new();
        gpu.print_text("Title\nMessage\n1F");
        assert!(gpu.overlay().is_empty());
        gpu.flush_text();
        assert_eq!(gpu.overlay(), &["Title", "Message", "1F"]);
    }

    #[test]
    fn test_framebuffer_follows_display_area() {
        let mut gpu = HeadlessGpu::new();
        gpu.write_vram(0, 240, 0x7FFF);
        gpu.put_disp_env(&DispEnv::new(0, 240, 320, 240));
        let fb = gpu.get_framebuffer();
        assert_eq!(fb.len(), 320 * 240 * 3);
        assert_eq!(&fb[0..3], &[248, 248, 248]);
        assert_eq!(gpu.flips(), 1);
    }
}
