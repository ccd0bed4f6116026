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

//! GPU register state and drawing/display environments
//!
//! [`DrawEnv`] and [`DispEnv`] are the per-framebuffer configurations pushed
//! to the GPU at flip time. [`DrawMode`], [`DrawingArea`] and [`DisplayArea`]
//! are the register views a backend derives from them.

use serde::Serialize;

use super::primitives::Color;

/// VRAM rectangle (x, y, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rect {
    /// Left edge
    pub x: u16,
    /// Top edge
    pub y: u16,
    /// Width
    pub w: u16,
    /// Height
    pub h: u16,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Number of 16-bit cells covered
    pub fn area(&self) -> usize {
        self.w as usize * self.h as usize
    }
}

/// Drawing mode state (GP0 E1 "draw mode setting")
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawMode {
    /// Texture page base X coordinate (N × 64)
    pub texture_page_x_base: u16,

    /// Texture page base Y coordinate (0 or 256)
    pub texture_page_y_base: u16,

    /// Semi-transparency mode (0-3)
    pub semi_transparency: u8,

    /// Texture color depth (0=4bit, 1=8bit, 2=15bit)
    pub texture_depth: u8,

    /// Dithering enabled
    pub dithering: bool,

    /// Drawing to display area allowed
    pub draw_to_display: bool,
}

impl DrawMode {
    /// Decode the low bits of an E1 command word
    pub fn from_word(word: u32) -> Self {
        Self {
            texture_page_x_base: ((word & 0xF) as u16) * 64,
            texture_page_y_base: (((word >> 4) & 1) as u16) * 256,
            semi_transparency: ((word >> 5) & 3) as u8,
            texture_depth: ((word >> 7) & 3) as u8,
            dithering: (word >> 9) & 1 != 0,
            draw_to_display: (word >> 10) & 1 != 0,
        }
    }
}

/// Drawing area (clipping rectangle), inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingArea {
    /// Left edge X coordinate (inclusive)
    pub left: u16,

    /// Top edge Y coordinate (inclusive)
    pub top: u16,

    /// Right edge X coordinate (inclusive)
    pub right: u16,

    /// Bottom edge Y coordinate (inclusive)
    pub bottom: u16,
}

impl Default for DrawingArea {
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            right: 1023,
            bottom: 511,
        }
    }
}

impl From<Rect> for DrawingArea {
    fn from(rect: Rect) -> Self {
        Self {
            left: rect.x,
            top: rect.y,
            right: rect.x.saturating_add(rect.w).saturating_sub(1).min(1023),
            bottom: rect.y.saturating_add(rect.h).saturating_sub(1).min(511),
        }
    }
}

/// Region of VRAM that is output to the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayArea {
    /// Display area X coordinate in VRAM
    pub x: u16,

    /// Display area Y coordinate in VRAM
    pub y: u16,

    /// Display width in pixels
    pub width: u16,

    /// Display height in pixels
    pub height: u16,
}

impl Default for DisplayArea {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 320,
            height: 240,
        }
    }
}

/// Drawing environment of one framebuffer
///
/// Mirrors what the GPU needs to start rendering into a buffer: the clip
/// rectangle, the drawing offset, the default texture page and an optional
/// background clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEnv {
    /// Clipping rectangle; drawing outside it is discarded
    pub clip: Rect,
    /// Offset added to every vertex
    pub offset: (i16, i16),
    /// Default texture page id
    pub tpage: u16,
    /// Dithering enabled
    pub dither: bool,
    /// Drawing into the displayed area allowed
    pub draw_on_display: bool,
    /// Clear the clip rectangle to `background` when applied
    pub isbg: bool,
    /// Background clear color
    pub background: Color,
}

impl DrawEnv {
    /// Default drawing environment for a `w`×`h` region at (`x`, `y`)
    ///
    /// The offset equals the region origin so primitives use screen
    /// coordinates. Background clearing is off until requested.
    pub fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self {
            clip: Rect::new(x, y, w, h),
            offset: (x as i16, y as i16),
            tpage: 0,
            dither: true,
            draw_on_display: false,
            isbg: false,
            background: Color::BLACK,
        }
    }

    /// Enable background clearing with the given color
    pub fn with_background(mut self, color: Color) -> Self {
        self.isbg = true;
        self.background = color;
        self
    }
}

/// Display environment of one framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispEnv {
    /// VRAM region shown on screen
    pub disp: Rect,
    /// Interlaced output
    pub interlaced: bool,
    /// 24-bit color output
    pub rgb24: bool,
}

impl DispEnv {
    /// Default display environment for a `w`×`h` region at (`x`, `y`)
    pub fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self {
            disp: Rect::new(x, y, w, h),
            interlaced: false,
            rgb24: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_mode_from_word() {
        let mode = DrawMode::from_word(0xE100_0000 | (1 << 10) | (1 << 7) | (1 << 4) | 5);
        assert_eq!(mode.texture_page_x_base, 320);
        assert_eq!(mode.texture_page_y_base, 256);
        assert_eq!(mode.texture_depth, 1);
        assert!(mode.draw_to_display);
        assert!(!mode.dithering);
    }

    #[test]
    fn test_drawing_area_from_rect() {
        let area = DrawingArea::from(Rect::new(0, 240, 320, 240));
        assert_eq!(area.left, 0);
        assert_eq!(area.top, 240);
        assert_eq!(area.right, 319);
        assert_eq!(area.bottom, 479);
    }

    #[test]
    fn test_draw_env_offset_follows_origin() {
        let env = DrawEnv::new(0, 240, 320, 240).with_background(Color::new(1, 2, 3));
        assert_eq!(env.offset, (0, 240));
        assert!(env.isbg);
        assert_eq!(env.background, Color::new(1, 2, 3));
    }
}
