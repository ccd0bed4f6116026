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

//! Packed GP0 primitive records
//!
//! A [`PackedPrimitive`] holds a tag word plus up to 12 payload words in the
//! layout the GPU consumes. Field writers locate their words through a
//! per-type layout table, so `set_rgb`, `set_xywh` and friends work on every
//! type and silently ignore fields the type does not have.

use crate::core::gpu::{Color, Dimensions, TexCoord, Vertex};
use crate::core::params::PrimitiveType;

/// Largest payload of any supported packet (textured Gouraud quad)
pub const MAX_PACKET_WORDS: usize = 12;

/// What a packed record currently encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// A drawable primitive
    Primitive(PrimitiveType),
    /// A draw-mode (texture page) command
    DrawPage,
}

/// Word positions of each field inside a packet
struct Layout {
    code: u8,
    len: u8,
    rgb: &'static [usize],
    xy: &'static [usize],
    uv: &'static [usize],
    clut: Option<usize>,
    tpage: Option<usize>,
    wh: Option<usize>,
}

const FLAT_QUAD: Layout = Layout {
    code: 0x28,
    len: 5,
    rgb: &[0],
    xy: &[1, 2, 3, 4],
    uv: &[],
    clut: None,
    tpage: None,
    wh: None,
};

const TEXTURED_FLAT_QUAD: Layout = Layout {
    code: 0x2C,
    len: 9,
    rgb: &[0],
    xy: &[1, 3, 5, 7],
    uv: &[2, 4, 6, 8],
    clut: Some(2),
    tpage: Some(4),
    wh: None,
};

const GOURAUD_QUAD: Layout = Layout {
    code: 0x38,
    len: 8,
    rgb: &[0, 2, 4, 6],
    xy: &[1, 3, 5, 7],
    uv: &[],
    clut: None,
    tpage: None,
    wh: None,
};

const TEXTURED_GOURAUD_QUAD: Layout = Layout {
    code: 0x3C,
    len: 12,
    rgb: &[0, 3, 6, 9],
    xy: &[1, 4, 7, 10],
    uv: &[2, 5, 8, 11],
    clut: Some(2),
    tpage: Some(5),
    wh: None,
};

const SPRITE: Layout = Layout {
    code: 0x64,
    len: 4,
    rgb: &[0],
    xy: &[1],
    uv: &[2],
    clut: Some(2),
    tpage: None,
    wh: Some(3),
};

const TILE: Layout = Layout {
    code: 0x60,
    len: 3,
    rgb: &[0],
    xy: &[1],
    uv: &[],
    clut: None,
    tpage: None,
    wh: Some(2),
};

const NO_FIELDS: Layout = Layout {
    code: 0,
    len: 0,
    rgb: &[],
    xy: &[],
    uv: &[],
    clut: None,
    tpage: None,
    wh: None,
};

fn layout(kind: PrimitiveType) -> &'static Layout {
    match kind {
        PrimitiveType::FlatQuad => &FLAT_QUAD,
        PrimitiveType::TexturedFlatQuad => &TEXTURED_FLAT_QUAD,
        PrimitiveType::GouraudQuad => &GOURAUD_QUAD,
        PrimitiveType::TexturedGouraudQuad => &TEXTURED_GOURAUD_QUAD,
        PrimitiveType::Sprite => &SPRITE,
        PrimitiveType::Tile => &TILE,
    }
}

/// One hardware-native draw record owned by a (framebuffer, slot) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPrimitive {
    /// Tag word: payload length and link to the next packet
    pub tag: u32,
    kind: Option<PacketKind>,
    words: [u32; MAX_PACKET_WORDS],
}

impl Default for PackedPrimitive {
    fn default() -> Self {
        Self::empty()
    }
}

impl PackedPrimitive {
    /// A record that has never been synthesized
    pub const fn empty() -> Self {
        Self {
            tag: 0,
            kind: None,
            words: [0; MAX_PACKET_WORDS],
        }
    }

    /// Reset the record to an empty packet of `kind` (SetPolyF4, SetSprt, ...)
    ///
    /// Writes the command code and payload length; every field is zeroed.
    pub fn init(&mut self, kind: PrimitiveType) {
        let layout = layout(kind);
        self.words = [0; MAX_PACKET_WORDS];
        self.words[0] = (layout.code as u32) << 24;
        self.tag = (layout.len as u32) << 24;
        self.kind = Some(PacketKind::Primitive(kind));
    }

    /// Turn the record into a draw-mode packet selecting `tpage` (SetDrawTPage)
    ///
    /// Drawing to the display area is enabled and dithering is off.
    pub fn init_draw_page(&mut self, tpage: u16) {
        self.words = [0; MAX_PACKET_WORDS];
        self.words[0] = 0xE100_0000 | (tpage as u32 & 0x9FF) | (1 << 10);
        self.tag = 1 << 24;
        self.kind = Some(PacketKind::DrawPage);
    }

    /// What the record encodes, `None` before first synthesis
    pub fn kind(&self) -> Option<PacketKind> {
        self.kind
    }

    /// Primitive type, `None` for draw-page packets and empty records
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self.kind {
            Some(PacketKind::Primitive(kind)) => Some(kind),
            _ => None,
        }
    }

    /// Payload words
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len()]
    }

    /// Payload length in words
    pub fn len(&self) -> usize {
        (self.tag >> 24) as usize
    }

    /// Whether the record has no payload
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fields(&self) -> &'static Layout {
        match self.kind {
            Some(PacketKind::Primitive(kind)) => layout(kind),
            _ => &NO_FIELDS,
        }
    }

    /// Set color `n` (0-3); the command byte of word 0 is preserved
    pub fn set_rgb(&mut self, n: usize, color: Color) {
        if let Some(&idx) = self.fields().rgb.get(n) {
            self.words[idx] = (self.words[idx] & 0xFF00_0000) | color.to_u32();
        }
    }

    /// Set vertex `n` (0-3)
    pub fn set_xy(&mut self, n: usize, vertex: Vertex) {
        if let Some(&idx) = self.fields().xy.get(n) {
            self.words[idx] = vertex.to_u32();
        }
    }

    /// Set texture coordinate `n` (0-3); the upper half (clut/tpage) is preserved
    pub fn set_uv(&mut self, n: usize, uv: TexCoord) {
        if let Some(&idx) = self.fields().uv.get(n) {
            self.words[idx] = (self.words[idx] & 0xFFFF_0000) | uv.to_u32();
        }
    }

    /// Set the rectangle size of a sprite or tile
    pub fn set_wh(&mut self, size: Dimensions) {
        if let Some(idx) = self.fields().wh {
            self.words[idx] = size.to_u32();
        }
    }

    /// Set the palette id
    pub fn set_clut(&mut self, clut: u16) {
        if let Some(idx) = self.fields().clut {
            self.words[idx] = (self.words[idx] & 0x0000_FFFF) | ((clut as u32) << 16);
        }
    }

    /// Set the texture page id of a textured quad
    pub fn set_tpage(&mut self, tpage: u16) {
        if let Some(idx) = self.fields().tpage {
            self.words[idx] = (self.words[idx] & 0x0000_FFFF) | ((tpage as u32) << 16);
        }
    }

    /// Place the primitive at `origin` with `size` (setXYWH / setXY0 + setWH)
    ///
    /// Quads get corners (x,y), (x+w,y), (x,y+h), (x+w,y+h); rectangles get
    /// the origin and a size word.
    pub fn set_xywh(&mut self, origin: Vertex, size: Dimensions) {
        if self.fields().xy.len() == 4 {
            self.set_xy(0, origin);
            self.set_xy(1, origin.offset(size.w, 0));
            self.set_xy(2, origin.offset(0, size.h));
            self.set_xy(3, origin.offset(size.w, size.h));
        } else {
            self.set_xy(0, origin);
            self.set_wh(size);
        }
    }

    /// Set the texture window (setUVWH / setUV0)
    pub fn set_uvwh(&mut self, uv: TexCoord, size: Dimensions) {
        if self.fields().uv.len() == 4 {
            self.set_uv(0, uv);
            self.set_uv(1, uv.offset(size.w, 0));
            self.set_uv(2, uv.offset(0, size.h));
            self.set_uv(3, uv.offset(size.w, size.h));
        } else {
            self.set_uv(0, uv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_code_and_length() {
        let mut p = PackedPrimitive::empty();
        assert_eq!(p.kind(), None);
        p.init(PrimitiveType::TexturedGouraudQuad);
        assert_eq!(p.len(), 12);
        assert_eq!(p.words()[0], 0x3C00_0000);
        assert_eq!(p.primitive_type(), Some(PrimitiveType::TexturedGouraudQuad));
    }

    #[test]
    fn test_flat_quad_geometry() {
        let mut p = PackedPrimitive::empty();
        p.init(PrimitiveType::FlatQuad);
        p.set_rgb(0, Color::new(0x11, 0x22, 0x33));
        p.set_xywh(Vertex::new(10, 20), Dimensions::new(30, 40));
        assert_eq!(
            p.words(),
            &[0x2833_2211, 0x0014_000A, 0x0014_0028, 0x003C_000A, 0x003C_0028]
        );
    }

    #[test]
    fn test_textured_quad_ids_share_uv_words() {
        let mut p = PackedPrimitive::empty();
        p.init(PrimitiveType::TexturedFlatQuad);
        p.set_uvwh(TexCoord::new(0, 0), Dimensions::new(64, 64));
        p.set_clut(0x7FC0);
        p.set_tpage(0x0008);
        assert_eq!(p.words()[2], 0x7FC0_0000);
        assert_eq!(p.words()[4], 0x0008_0040);
        assert_eq!(p.words()[6], 0x0000_4000);
        assert_eq!(p.words()[8], 0x0000_4040);

        p.set_uv(0, TexCoord::new(1, 2));
        assert_eq!(p.words()[2], 0x7FC0_0201);
    }

    #[test]
    fn test_sprite_layout() {
        let mut p = PackedPrimitive::empty();
        p.init(PrimitiveType::Sprite);
        p.set_rgb(0, Color::NEUTRAL);
        p.set_xywh(Vertex::new(5, 6), Dimensions::new(32, 16));
        p.set_uvwh(TexCoord::new(8, 9), Dimensions::new(32, 16));
        p.set_clut(0x1234);
        p.set_tpage(0xFFFF);
        assert_eq!(
            p.words(),
            &[0x6480_8080, 0x0006_0005, 0x1234_0908, 0x0010_0020]
        );
    }

    #[test]
    fn test_missing_fields_are_ignored() {
        let mut p = PackedPrimitive::empty();
        p.init(PrimitiveType::Tile);
        p.set_rgb(3, Color::new(255, 255, 255));
        p.set_uv(0, TexCoord::new(1, 1));
        p.set_clut(1);
        assert_eq!(p.words(), &[0x6000_0000, 0, 0]);
    }

    #[test]
    fn test_draw_page_word() {
        let mut p = PackedPrimitive::empty();
        p.init_draw_page(0x0FFF);
        assert_eq!(p.words(), &[0xE100_0000 | 0x09FF | 0x400]);
        assert_eq!(p.kind(), Some(PacketKind::DrawPage));
        p.set_rgb(0, Color::new(1, 1, 1));
        assert_eq!(p.words()[0], 0xE100_0DFF);
    }
}
