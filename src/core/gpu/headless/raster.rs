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

//! Software rasterizer for axis-aligned primitives
//!
//! Every primitive the engine emits is an axis-aligned box: quads are built
//! with corners (x, y), (x+w, y), (x, y+h), (x+w, y+h) and rectangles carry an
//! explicit size. The rasterizer therefore fills boxes and interpolates colors
//! and texture coordinates bilinearly across them.
//!
//! # Pixel Rules
//!
//! - The right and bottom edges are exclusive
//! - The drawing offset is applied before clipping
//! - Pixels outside the drawing area are discarded
//! - Texel 0x0000 in a paletted texture is transparent

use super::super::primitives::{Color, TexCoord, TextureDepth, TextureInfo, Vertex};
use super::super::registers::DrawingArea;

/// VRAM width in pixels
const VRAM_WIDTH: usize = 1024;

/// Box rasterizer with a clip rectangle and drawing offset
#[derive(Debug, Clone)]
pub(crate) struct Rasterizer {
    /// Clipping rectangle, inclusive
    clip: DrawingArea,

    /// Offset added to every vertex
    offset: (i16, i16),
}

/// Screen-space box after offset and clipping
#[derive(Debug, Clone, Copy)]
struct Span {
    /// Unclipped left edge
    x0: i32,
    /// Unclipped top edge
    y0: i32,
    /// Unclipped width
    w: i32,
    /// Unclipped height
    h: i32,
    /// Clipped bounds, right/bottom exclusive
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Rasterizer {
    /// Create a rasterizer clipping to all of VRAM
    pub(crate) fn new() -> Self {
        Self {
            clip: DrawingArea::default(),
            offset: (0, 0),
        }
    }

    /// Set the clipping rectangle
    pub(crate) fn set_clip(&mut self, clip: DrawingArea) {
        self.clip = clip;
    }

    /// Set the drawing offset
    pub(crate) fn set_offset(&mut self, offset: (i16, i16)) {
        self.offset = offset;
    }

    /// Fill a VRAM rectangle directly (GP0 0x02 semantics: no clip, no offset)
    pub(crate) fn fill(vram: &mut [u16], origin: Vertex, w: u16, h: u16, color: &Color) {
        let color15 = color.to_rgb15();
        for dy in 0..h as usize {
            let y = (origin.y as u16 as usize + dy) & 0x1FF;
            for dx in 0..w as usize {
                let x = (origin.x as u16 as usize + dx) & 0x3FF;
                vram[y * VRAM_WIDTH + x] = color15;
            }
        }
    }

    /// Compute the clipped span of a box, or `None` if nothing is visible
    fn span(&self, origin: Vertex, w: u16, h: u16) -> Option<Span> {
        let x0 = origin.x as i32 + self.offset.0 as i32;
        let y0 = origin.y as i32 + self.offset.1 as i32;
        let w = w as i32;
        let h = h as i32;

        let left = x0.max(self.clip.left as i32).max(0);
        let top = y0.max(self.clip.top as i32).max(0);
        let right = (x0 + w).min(self.clip.right as i32 + 1).min(1024);
        let bottom = (y0 + h).min(self.clip.bottom as i32 + 1).min(512);

        if left >= right || top >= bottom {
            return None;
        }

        Some(Span {
            x0,
            y0,
            w,
            h,
            left,
            top,
            right,
            bottom,
        })
    }

    /// Bounding box of four quad corners as (origin, width, height)
    pub(crate) fn quad_bounds(vertices: &[Vertex; 4]) -> (Vertex, u16, u16) {
        let min_x = vertices.iter().map(|v| v.x).min().unwrap_or(0);
        let min_y = vertices.iter().map(|v| v.y).min().unwrap_or(0);
        let max_x = vertices.iter().map(|v| v.x).max().unwrap_or(0);
        let max_y = vertices.iter().map(|v| v.y).max().unwrap_or(0);
        let w = (max_x as i32 - min_x as i32).clamp(0, 1023) as u16;
        let h = (max_y as i32 - min_y as i32).clamp(0, 511) as u16;
        (Vertex::new(min_x, min_y), w, h)
    }

    /// Draw a monochrome box
    pub(crate) fn draw_rectangle(
        &self,
        vram: &mut [u16],
        origin: Vertex,
        w: u16,
        h: u16,
        color: &Color,
    ) {
        let Some(span) = self.span(origin, w, h) else {
            return;
        };
        let color15 = color.to_rgb15();

        for py in span.top..span.bottom {
            let row = py as usize * VRAM_WIDTH;
            for px in span.left..span.right {
                vram[row + px as usize] = color15;
            }
        }
    }

    /// Draw a box with bilinearly interpolated corner colors
    ///
    /// Corners are top-left, top-right, bottom-left, bottom-right.
    pub(crate) fn draw_shaded_rectangle(
        &self,
        vram: &mut [u16],
        origin: Vertex,
        w: u16,
        h: u16,
        colors: &[Color; 4],
    ) {
        let Some(span) = self.span(origin, w, h) else {
            return;
        };

        for py in span.top..span.bottom {
            let fy = fraction(py - span.y0, span.h);
            let row = py as usize * VRAM_WIDTH;
            for px in span.left..span.right {
                let fx = fraction(px - span.x0, span.w);
                let color = bilinear_color(colors, fx, fy);
                vram[row + px as usize] = color.to_rgb15();
            }
        }
    }

    /// Draw a textured box with bilinearly interpolated texture coordinates
    ///
    /// `colors` modulate the texel unless `raw` is set; pass four equal
    /// colors for flat shading.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw_textured_quad(
        &self,
        vram: &mut [u16],
        origin: Vertex,
        w: u16,
        h: u16,
        texcoords: &[TexCoord; 4],
        texture: &TextureInfo,
        colors: &[Color; 4],
        raw: bool,
    ) {
        let Some(span) = self.span(origin, w, h) else {
            return;
        };

        for py in span.top..span.bottom {
            let fy = fraction(py - span.y0, span.h);
            for px in span.left..span.right {
                let fx = fraction(px - span.x0, span.w);
                let top_u = lerp(texcoords[0].u as i32, texcoords[1].u as i32, fx);
                let top_v = lerp(texcoords[0].v as i32, texcoords[1].v as i32, fx);
                let bottom_u = lerp(texcoords[2].u as i32, texcoords[3].u as i32, fx);
                let bottom_v = lerp(texcoords[2].v as i32, texcoords[3].v as i32, fx);
                let u = lerp(top_u, bottom_u, fy) as u8;
                let v = lerp(top_v, bottom_v, fy) as u8;

                let Some(texel) = Self::sample_texture(vram, u, v, texture) else {
                    continue;
                };
                let tint = if raw {
                    None
                } else {
                    Some(bilinear_color(colors, fx, fy))
                };
                vram[py as usize * VRAM_WIDTH + px as usize] = Self::shade(texel, tint);
            }
        }
    }

    /// Draw a textured rectangle (sprite)
    ///
    /// Texture coordinates advance one texel per pixel from `texcoord`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw_textured_rectangle(
        &self,
        vram: &mut [u16],
        origin: Vertex,
        w: u16,
        h: u16,
        texcoord: TexCoord,
        texture: &TextureInfo,
        color: &Color,
        raw: bool,
    ) {
        let Some(span) = self.span(origin, w, h) else {
            return;
        };

        for py in span.top..span.bottom {
            let v = texcoord.v.wrapping_add((py - span.y0) as u8);
            for px in span.left..span.right {
                let u = texcoord.u.wrapping_add((px - span.x0) as u8);
                let Some(texel) = Self::sample_texture(vram, u, v, texture) else {
                    continue;
                };
                let tint = if raw { None } else { Some(*color) };
                vram[py as usize * VRAM_WIDTH + px as usize] = Self::shade(texel, tint);
            }
        }
    }

    /// Apply modulation to a texel: (texel × color) / 128 per channel
    fn shade(texel: u16, tint: Option<Color>) -> u16 {
        let Some(color) = tint else {
            return texel;
        };
        let (r, g, b) = rgb15_to_rgb24(texel);
        let r = ((r as u16 * color.r as u16) / 128).min(255) as u8;
        let g = ((g as u16 * color.g as u16) / 128).min(255) as u8;
        let b = ((b as u16 * color.b as u16) / 128).min(255) as u8;
        Color::new(r, g, b).to_rgb15()
    }

    /// Sample a texel, returning `None` for transparent paletted texels
    fn sample_texture(vram: &[u16], u: u8, v: u8, info: &TextureInfo) -> Option<u16> {
        let tex_y = (info.page_y + v as u16) & 0x1FF;

        let texel = match info.depth {
            TextureDepth::T4Bit => {
                // 4 indices per word
                let tex_x = (info.page_x + (u as u16 / 4)) & 0x3FF;
                let word = read_vram_pixel(vram, tex_x, tex_y);
                let index = (word >> ((u % 4) * 4)) & 0xF;
                read_vram_pixel(vram, (info.clut_x + index) & 0x3FF, info.clut_y)
            }
            TextureDepth::T8Bit => {
                // 2 indices per word
                let tex_x = (info.page_x + (u as u16 / 2)) & 0x3FF;
                let word = read_vram_pixel(vram, tex_x, tex_y);
                let index = if u % 2 == 0 { word & 0xFF } else { word >> 8 };
                read_vram_pixel(vram, (info.clut_x + index) & 0x3FF, info.clut_y)
            }
            TextureDepth::T15Bit => {
                let tex_x = (info.page_x + u as u16) & 0x3FF;
                read_vram_pixel(vram, tex_x, tex_y)
            }
        };

        if texel == 0x0000 && info.depth != TextureDepth::T15Bit {
            return None;
        }
        Some(texel)
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Position `t` of `len` as a 16.16 fraction
fn fraction(t: i32, len: i32) -> i32 {
    if len <= 0 {
        0
    } else {
        (t << 16) / len
    }
}

/// Interpolate between `a` and `b` by a 16.16 fraction
fn lerp(a: i32, b: i32, f: i32) -> i32 {
    a + (((b - a) * f) >> 16)
}

/// Bilinear blend of TL, TR, BL, BR colors
fn bilinear_color(colors: &[Color; 4], fx: i32, fy: i32) -> Color {
    let channel = |pick: fn(&Color) -> u8| {
        let top = lerp(pick(&colors[0]) as i32, pick(&colors[1]) as i32, fx);
        let bottom = lerp(pick(&colors[2]) as i32, pick(&colors[3]) as i32, fx);
        lerp(top, bottom, fy).clamp(0, 255) as u8
    };
    Color::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b))
}

/// Convert 15-bit RGB to 24-bit RGB by left-shifting each channel
pub(crate) fn rgb15_to_rgb24(color: u16) -> (u8, u8, u8) {
    let r = ((color & 0x1F) << 3) as u8;
    let g = (((color >> 5) & 0x1F) << 3) as u8;
    let b = (((color >> 10) & 0x1F) << 3) as u8;
    (r, g, b)
}

/// Read a VRAM cell, wrapping coordinates
fn read_vram_pixel(vram: &[u16], x: u16, y: u16) -> u16 {
    let index = ((y & 0x1FF) as usize) * VRAM_WIDTH + (x & 0x3FF) as usize;
    vram[index]
}
