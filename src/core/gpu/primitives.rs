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

//! GPU value types
//!
//! Colors, vertices, texture coordinates and sizes in the exact bit layout
//! the GP0 packet words use, plus the texture page / palette id encodings.

use serde::{Deserialize, Serialize};

/// A 24-bit RGB color used in GPU commands
///
/// PlayStation GPU commands use 24-bit RGB colors (8 bits per channel)
/// which are converted to 15-bit RGB for VRAM storage.
///
/// # Examples
///
/// ```
/// use psot::core::gpu::Color;
///
/// let color = Color::from_u32(0x00FF8040);
/// assert_eq!(color.r, 0x40);
/// assert_eq!(color.g, 0x80);
/// assert_eq!(color.b, 0xFF);
/// assert_eq!(color.to_u32(), 0x00FF8040);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Neutral modulation color (texels pass through unchanged)
    pub const NEUTRAL: Self = Self::new(128, 128, 128);

    /// Create a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a Color from a 32-bit command word
    ///
    /// The color is encoded in the lower 24 bits:
    /// - Bits 0-7: Red
    /// - Bits 8-15: Green
    /// - Bits 16-23: Blue
    pub fn from_u32(value: u32) -> Self {
        Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
        }
    }

    /// Encode into the low 24 bits of a command word
    pub fn to_u32(&self) -> u32 {
        ((self.b as u32) << 16) | ((self.g as u32) << 8) | (self.r as u32)
    }

    /// Convert 24-bit RGB to 15-bit RGB format for VRAM
    ///
    /// Converts each 8-bit channel to 5-bit by right-shifting by 3.
    ///
    /// # Examples
    ///
    /// ```
    /// use psot::core::gpu::Color;
    ///
    /// let rgb15 = Color::new(255, 128, 64).to_rgb15();
    /// assert_eq!(rgb15 & 0x1F, 31);
    /// assert_eq!((rgb15 >> 5) & 0x1F, 16);
    /// assert_eq!((rgb15 >> 10) & 0x1F, 8);
    /// ```
    pub fn to_rgb15(&self) -> u16 {
        let r = ((self.r as u16) >> 3) & 0x1F;
        let g = ((self.g as u16) >> 3) & 0x1F;
        let b = ((self.b as u16) >> 3) & 0x1F;
        (b << 10) | (g << 5) | r
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// A 2D vertex position
///
/// Vertices are signed 16-bit screen coordinates relative to the drawing
/// offset.
///
/// # Examples
///
/// ```
/// use psot::core::gpu::Vertex;
///
/// let vertex = Vertex::from_u32(0x00640032);
/// assert_eq!(vertex.x, 50);
/// assert_eq!(vertex.y, 100);
/// assert_eq!(vertex.to_u32(), 0x00640032);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vertex {
    /// X coordinate (signed 16-bit)
    pub x: i16,
    /// Y coordinate (signed 16-bit)
    pub y: i16,
}

impl Vertex {
    /// Create a vertex
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Decode a vertex word (bits 0-15 X, bits 16-31 Y)
    pub fn from_u32(value: u32) -> Self {
        let x = (value & 0xFFFF) as i16;
        let y = ((value >> 16) & 0xFFFF) as i16;
        Self { x, y }
    }

    /// Encode a vertex word
    pub fn to_u32(&self) -> u32 {
        ((self.y as u16 as u32) << 16) | (self.x as u16 as u32)
    }

    /// Offset by a size, wrapping like the hardware's 16-bit registers
    pub fn offset(&self, dx: u16, dy: u16) -> Self {
        Self {
            x: self.x.wrapping_add(dx as i16),
            y: self.y.wrapping_add(dy as i16),
        }
    }
}

/// Texture coordinate for textured primitives
///
/// Coordinates are in texel units within the texture page and wrap at 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TexCoord {
    /// U coordinate (horizontal, 0-255)
    pub u: u8,
    /// V coordinate (vertical, 0-255)
    pub v: u8,
}

impl TexCoord {
    /// Create a texture coordinate
    pub const fn new(u: u8, v: u8) -> Self {
        Self { u, v }
    }

    /// Decode the low 16 bits of a command word
    pub fn from_u32(value: u32) -> Self {
        Self {
            u: (value & 0xFF) as u8,
            v: ((value >> 8) & 0xFF) as u8,
        }
    }

    /// Encode into the low 16 bits of a command word
    pub fn to_u32(&self) -> u32 {
        ((self.v as u32) << 8) | (self.u as u32)
    }

    /// Offset by a size, wrapping inside the texture page
    pub fn offset(&self, du: u16, dv: u16) -> Self {
        Self {
            u: self.u.wrapping_add(du as u8),
            v: self.v.wrapping_add(dv as u8),
        }
    }
}

/// Width and height of a primitive or region
///
/// In a rectangle packet the size word carries the width in bits 0-15 and
/// the height in bits 16-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels
    pub w: u16,
    /// Height in pixels
    pub h: u16,
}

impl Dimensions {
    /// Create a size
    pub const fn new(w: u16, h: u16) -> Self {
        Self { w, h }
    }

    /// Decode a rectangle size word
    pub fn from_u32(value: u32) -> Self {
        Self {
            w: (value & 0xFFFF) as u16,
            h: ((value >> 16) & 0xFFFF) as u16,
        }
    }

    /// Encode a rectangle size word
    pub fn to_u32(&self) -> u32 {
        ((self.h as u32) << 16) | (self.w as u32)
    }
}

/// Texture color depth modes
///
/// - 4-bit: 16 colors using a 16-color CLUT (Color Lookup Table)
/// - 8-bit: 256 colors using a 256-color CLUT
/// - 15-bit: Direct color (no CLUT needed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDepth {
    /// 4-bit indexed color (16 colors, uses CLUT)
    T4Bit,
    /// 8-bit indexed color (256 colors, uses CLUT)
    T8Bit,
    /// 15-bit direct color (no CLUT)
    T15Bit,
}

impl TextureDepth {
    /// Two-bit value used in texture page ids and draw mode words
    pub fn bits(&self) -> u16 {
        match self {
            TextureDepth::T4Bit => 0,
            TextureDepth::T8Bit => 1,
            TextureDepth::T15Bit => 2,
        }
    }

    /// Texels stored per 16-bit VRAM word
    pub fn texels_per_word(&self) -> u16 {
        match self {
            TextureDepth::T4Bit => 4,
            TextureDepth::T8Bit => 2,
            TextureDepth::T15Bit => 1,
        }
    }
}

impl From<u8> for TextureDepth {
    /// Convert a texture depth field (0=4bit, 1=8bit, 2/3=15bit)
    fn from(value: u8) -> Self {
        match value & 3 {
            0 => TextureDepth::T4Bit,
            1 => TextureDepth::T8Bit,
            _ => TextureDepth::T15Bit,
        }
    }
}

/// Texture mapping information decoded from page and palette ids
///
/// # Examples
///
/// ```
/// use psot::core::gpu::{tpage_id, clut_id, TextureDepth, TextureInfo};
///
/// let tpage = tpage_id(TextureDepth::T8Bit, 0, 640, 256);
/// let clut = clut_id(0, 480);
/// let info = TextureInfo::from_ids(tpage, clut);
/// assert_eq!(info.page_x, 640);
/// assert_eq!(info.page_y, 256);
/// assert_eq!(info.clut_y, 480);
/// assert_eq!(info.depth, TextureDepth::T8Bit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureInfo {
    /// Texture page base X coordinate (in VRAM words)
    pub page_x: u16,

    /// Texture page base Y coordinate (0 or 256)
    pub page_y: u16,

    /// CLUT X position in VRAM (for 4-bit/8-bit textures)
    pub clut_x: u16,

    /// CLUT Y position in VRAM (for 4-bit/8-bit textures)
    pub clut_y: u16,

    /// Texture color depth
    pub depth: TextureDepth,
}

impl TextureInfo {
    /// Decode a texture page id and a palette id
    pub fn from_ids(tpage: u16, clut: u16) -> Self {
        Self {
            page_x: (tpage & 0xF) * 64,
            page_y: ((tpage >> 4) & 1) * 256,
            clut_x: (clut & 0x3F) * 16,
            clut_y: (clut >> 6) & 0x1FF,
            depth: TextureDepth::from(((tpage >> 7) & 3) as u8),
        }
    }
}

/// Build a texture page id
///
/// Layout: bits 0-3 page X / 64, bit 4 page Y / 256, bits 5-6
/// semi-transparency mode, bits 7-8 color depth.
pub fn tpage_id(depth: TextureDepth, abr: u16, x: u16, y: u16) -> u16 {
    ((depth.bits() & 3) << 7) | ((abr & 3) << 5) | ((y & 0x100) >> 4) | ((x & 0x3FF) >> 6)
}

/// Build a palette (CLUT) id
///
/// Layout: bits 0-5 X / 16, bits 6-14 Y.
pub fn clut_id(x: u16, y: u16) -> u16 {
    (y << 6) | ((x >> 4) & 0x3F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_round_trip_word() {
        let color = Color::new(0x12, 0x34, 0x56);
        assert_eq!(color.to_u32(), 0x0056_3412);
        assert_eq!(Color::from_u32(0x2856_3412), color);
    }

    #[test]
    fn test_negative_vertex_encoding() {
        let v = Vertex::new(-1, -2);
        assert_eq!(v.to_u32(), 0xFFFE_FFFF);
        assert_eq!(Vertex::from_u32(v.to_u32()), v);
    }

    #[test]
    fn test_dimensions_word_puts_width_low() {
        let size = Dimensions::new(32, 16);
        assert_eq!(size.to_u32(), 0x0010_0020);
    }

    #[test]
    fn test_texcoord_offset_wraps() {
        let tc = TexCoord::new(250, 10).offset(10, 5);
        assert_eq!(tc, TexCoord::new(4, 15));
    }

    #[test]
    fn test_tpage_id_fields() {
        assert_eq!(tpage_id(TextureDepth::T15Bit, 0, 320, 0), (2 << 7) | 5);
        assert_eq!(tpage_id(TextureDepth::T4Bit, 1, 0, 256), (1 << 5) | (1 << 4));
    }

    #[test]
    fn test_clut_id_fields() {
        assert_eq!(clut_id(32, 481), (481 << 6) | 2);
        let info = TextureInfo::from_ids(0, clut_id(32, 481));
        assert_eq!(info.clut_x, 32);
        assert_eq!(info.clut_y, 481);
    }
}
