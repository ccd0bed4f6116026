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

//! GP0 packet decoding
//!
//! Turns the word stream produced by an ordering table walk back into
//! structured [`DrawCommand`] values. Polygon and rectangle opcodes are
//! decoded from their attribute bits rather than one function per opcode:
//!
//! ```text
//! Polygon (0x20-0x3F):  001G QTSR   G=gouraud Q=quad T=textured S=semi R=raw
//! Rectangle (0x60-0x7F): 011Z ZTSR  ZZ=size (0=variable, 1=1x1, 2=8x8, 3=16x16)
//! ```

use serde::Serialize;

use super::super::primitives::{Color, Dimensions, TexCoord, TextureInfo, Vertex};

/// One decoded GP0 command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// GP0(0x02): fill a VRAM rectangle, ignoring clip and offset
    FillRect {
        /// Top-left corner in VRAM
        origin: Vertex,
        /// Size in pixels
        size: Dimensions,
        /// Fill color
        color: Color,
    },

    /// GP0(0x28): flat-shaded quad
    FlatQuad {
        /// Corner vertices in packet order
        vertices: [Vertex; 4],
        /// Fill color
        color: Color,
    },

    /// GP0(0x38): Gouraud-shaded quad
    ShadedQuad {
        /// Corner vertices in packet order
        vertices: [Vertex; 4],
        /// Per-corner colors
        colors: [Color; 4],
    },

    /// GP0(0x2C): flat textured quad
    TexturedQuad {
        /// Corner vertices in packet order
        vertices: [Vertex; 4],
        /// Per-corner texture coordinates
        texcoords: [TexCoord; 4],
        /// Page and palette
        texture: TextureInfo,
        /// Modulation color
        color: Color,
        /// Texels copied without modulation
        raw: bool,
    },

    /// GP0(0x3C): Gouraud-shaded textured quad
    ShadedTexturedQuad {
        /// Corner vertices in packet order
        vertices: [Vertex; 4],
        /// Per-corner texture coordinates
        texcoords: [TexCoord; 4],
        /// Page and palette
        texture: TextureInfo,
        /// Per-corner modulation colors
        colors: [Color; 4],
    },

    /// GP0(0x60): monochrome rectangle
    Rectangle {
        /// Top-left corner
        origin: Vertex,
        /// Size in pixels
        size: Dimensions,
        /// Fill color
        color: Color,
    },

    /// GP0(0x64): textured rectangle (sprite), page from the draw mode
    TexturedRectangle {
        /// Top-left corner
        origin: Vertex,
        /// Size in pixels
        size: Dimensions,
        /// Texture coordinate of the top-left texel
        texcoord: TexCoord,
        /// Palette id
        clut: u16,
        /// Modulation color
        color: Color,
        /// Texels copied without modulation
        raw: bool,
    },

    /// GP0(0xE1): draw mode / texture page
    DrawMode {
        /// Low 11 bits of the command word
        texpage: u16,
    },

    /// Any other opcode, consumed but not rendered
    Unsupported {
        /// Command byte
        opcode: u8,
    },
}

/// Number of words a GP0 command occupies, given its first word
///
/// # Examples
///
/// ```
/// use psot::core::gpu::HeadlessGpu;
///
/// assert_eq!(HeadlessGpu::command_length(0x2800_0000), 5);  // flat quad
/// assert_eq!(HeadlessGpu::command_length(0x3C00_0000), 12); // shaded textured quad
/// assert_eq!(HeadlessGpu::command_length(0x6400_0000), 4);  // sprite
/// ```
pub(crate) fn command_length(first: u32) -> usize {
    let opcode = (first >> 24) as u8;
    match opcode {
        0x02 => 3,
        0x20..=0x3F => {
            let gouraud = opcode & 0x10 != 0;
            let vertices = if opcode & 0x08 != 0 { 4 } else { 3 };
            let textured = opcode & 0x04 != 0;
            let per_vertex = 1 + usize::from(textured);
            let extra_colors = if gouraud { vertices - 1 } else { 0 };
            1 + vertices * per_vertex + extra_colors
        }
        0x60..=0x7F => {
            let textured = opcode & 0x04 != 0;
            let variable = (opcode >> 3) & 3 == 0;
            2 + usize::from(textured) + usize::from(variable)
        }
        _ => 1,
    }
}

/// Decode one complete command
///
/// `words` must hold exactly [`command_length`] words.
pub(crate) fn decode(words: &[u32]) -> DrawCommand {
    let opcode = (words[0] >> 24) as u8;
    match opcode {
        0x02 => DrawCommand::FillRect {
            origin: Vertex::from_u32(words[1]),
            size: Dimensions::from_u32(words[2]),
            color: Color::from_u32(words[0]),
        },
        0x28..=0x2B => DrawCommand::FlatQuad {
            vertices: [
                Vertex::from_u32(words[1]),
                Vertex::from_u32(words[2]),
                Vertex::from_u32(words[3]),
                Vertex::from_u32(words[4]),
            ],
            color: Color::from_u32(words[0]),
        },
        0x2C..=0x2F => decode_textured_quad(words, opcode),
        0x38..=0x3B => DrawCommand::ShadedQuad {
            vertices: [
                Vertex::from_u32(words[1]),
                Vertex::from_u32(words[3]),
                Vertex::from_u32(words[5]),
                Vertex::from_u32(words[7]),
            ],
            colors: [
                Color::from_u32(words[0]),
                Color::from_u32(words[2]),
                Color::from_u32(words[4]),
                Color::from_u32(words[6]),
            ],
        },
        0x3C..=0x3F => decode_shaded_textured_quad(words),
        0x60..=0x7F => decode_rectangle(words, opcode),
        0xE1 => DrawCommand::DrawMode {
            texpage: (words[0] & 0x7FF) as u16,
        },
        _ => DrawCommand::Unsupported { opcode },
    }
}

/// GP0(0x2C-0x2F): Textured Quad
///
/// ```text
/// Word 0: 0x2CBBGGRR - Command + modulation color
/// Word 1: YYYYXXXX   - Vertex 0
/// Word 2: CLUTVVUU   - Palette id + texcoord 0
/// Word 3: YYYYXXXX   - Vertex 1
/// Word 4: PAGEVVUU   - Texture page + texcoord 1
/// Word 5: YYYYXXXX   - Vertex 2
/// Word 6: 0000VVUU   - Texcoord 2
/// Word 7: YYYYXXXX   - Vertex 3
/// Word 8: 0000VVUU   - Texcoord 3
/// ```
fn decode_textured_quad(words: &[u32], opcode: u8) -> DrawCommand {
    let clut = (words[2] >> 16) as u16;
    let tpage = (words[4] >> 16) as u16;
    DrawCommand::TexturedQuad {
        vertices: [
            Vertex::from_u32(words[1]),
            Vertex::from_u32(words[3]),
            Vertex::from_u32(words[5]),
            Vertex::from_u32(words[7]),
        ],
        texcoords: [
            TexCoord::from_u32(words[2]),
            TexCoord::from_u32(words[4]),
            TexCoord::from_u32(words[6]),
            TexCoord::from_u32(words[8]),
        ],
        texture: TextureInfo::from_ids(tpage, clut),
        color: Color::from_u32(words[0]),
        raw: opcode & 0x01 != 0,
    }
}

/// GP0(0x3C-0x3F): Gouraud-Shaded Textured Quad
///
/// Color, vertex and texcoord words interleave per corner; the palette id
/// rides on texcoord 0 and the texture page on texcoord 1.
fn decode_shaded_textured_quad(words: &[u32]) -> DrawCommand {
    let clut = (words[2] >> 16) as u16;
    let tpage = (words[5] >> 16) as u16;
    DrawCommand::ShadedTexturedQuad {
        vertices: [
            Vertex::from_u32(words[1]),
            Vertex::from_u32(words[4]),
            Vertex::from_u32(words[7]),
            Vertex::from_u32(words[10]),
        ],
        texcoords: [
            TexCoord::from_u32(words[2]),
            TexCoord::from_u32(words[5]),
            TexCoord::from_u32(words[8]),
            TexCoord::from_u32(words[11]),
        ],
        texture: TextureInfo::from_ids(tpage, clut),
        colors: [
            Color::from_u32(words[0]),
            Color::from_u32(words[3]),
            Color::from_u32(words[6]),
            Color::from_u32(words[9]),
        ],
    }
}

/// GP0(0x60-0x7F): Rectangles
///
/// ```text
/// Word 0: CMDBGGRR - Command + color
/// Word 1: YYYYXXXX - Top-left vertex
/// Word 2: CLUTVVUU - Palette id + texcoord (textured only)
/// Word 3: HHHHWWWW - Size (variable-size only)
/// ```
fn decode_rectangle(words: &[u32], opcode: u8) -> DrawCommand {
    let textured = opcode & 0x04 != 0;
    let origin = Vertex::from_u32(words[1]);
    let color = Color::from_u32(words[0]);
    let size = match (opcode >> 3) & 3 {
        0 => Dimensions::from_u32(words[if textured { 3 } else { 2 }]),
        1 => Dimensions::new(1, 1),
        2 => Dimensions::new(8, 8),
        _ => Dimensions::new(16, 16),
    };

    if textured {
        DrawCommand::TexturedRectangle {
            origin,
            size,
            texcoord: TexCoord::from_u32(words[2]),
            clut: (words[2] >> 16) as u16,
            color,
            raw: opcode & 0x01 != 0,
        }
    } else {
        DrawCommand::Rectangle {
            origin,
            size,
            color,
        }
    }
}
