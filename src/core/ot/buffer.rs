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

//! Per-framebuffer ordering table buffer
//!
//! A [`FrameBuffer`] owns everything the GPU reads while the buffer is in
//! flight: its ordering table, one packed record per slot, one draw-page
//! packet per slot (used only by sprites) and its draw/display environments.
//! Nothing here is shared with the other framebuffers.

use super::packet::PackedPrimitive;
use super::{tag_next, Node, OrderingTable, LINK_MASK};
use crate::core::error::{EngineError, Result};
use crate::core::gpu::{Color, DispEnv, DrawEnv, Rect};
use crate::core::params::{PrimitiveParam, PrimitiveType};

/// One packet visited by a chain walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry<'a> {
    /// Which packet this is
    pub node: Node,
    /// Payload words streamed to GP0 (empty for bucket heads)
    pub words: &'a [u32],
}

/// Ordering table, packed records and display geometry of one framebuffer
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    index: usize,
    ot: OrderingTable,
    primitives: Vec<PackedPrimitive>,
    pages: Vec<PackedPrimitive>,
    draw_env: DrawEnv,
    disp_env: DispEnv,
    synced_revision: u64,
}

impl FrameBuffer {
    /// Allocate buffer `index` with `slots` buckets for a `width`×`height` screen
    ///
    /// The buffer starts placed for flip phase `index` (see
    /// [`place`](Self::place)) and clears to `background`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] if any per-slot array cannot be
    /// reserved.
    pub fn new(
        index: usize,
        slots: usize,
        width: u16,
        height: u16,
        background: Color,
    ) -> Result<Self> {
        let ot = OrderingTable::new(slots)?;
        let primitives = alloc_packets(slots, "packed primitives")?;
        let pages = alloc_packets(slots, "draw-page packets")?;

        let mut buffer = Self {
            index,
            ot,
            primitives,
            pages,
            draw_env: DrawEnv::new(0, 0, width, height).with_background(background),
            disp_env: DispEnv::new(0, 0, width, height),
            synced_revision: 0,
        };
        buffer.place(index);
        Ok(buffer)
    }

    /// Point the environments at the VRAM halves for flip `phase`
    ///
    /// Even phases display the top half and draw into the bottom half; odd
    /// phases do the reverse. The half drawn on one flip is the half shown on
    /// the next, whatever the ring size.
    pub(crate) fn place(&mut self, phase: usize) {
        let Rect { w, h, .. } = self.draw_env.clip;
        let (disp_y, draw_y) = if phase % 2 == 0 { (0, h) } else { (h, 0) };
        self.draw_env = DrawEnv {
            clip: Rect::new(0, draw_y, w, h),
            offset: (0, draw_y as i16),
            ..self.draw_env
        };
        self.disp_env.disp = Rect::new(0, disp_y, w, h);
    }

    /// Position of this buffer in the scheduler's ring
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of slots / buckets
    pub fn slots(&self) -> usize {
        self.ot.len()
    }

    /// The ordering table
    pub fn ot(&self) -> &OrderingTable {
        &self.ot
    }

    /// Packed record of `slot`
    pub fn primitive(&self, slot: usize) -> &PackedPrimitive {
        &self.primitives[slot]
    }

    /// Draw-page packet of `slot`
    pub fn page(&self, slot: usize) -> &PackedPrimitive {
        &self.pages[slot]
    }

    /// Drawing environment applied when this buffer is submitted
    pub fn draw_env(&self) -> &DrawEnv {
        &self.draw_env
    }

    /// Display environment applied when this buffer is submitted
    pub fn disp_env(&self) -> &DispEnv {
        &self.disp_env
    }

    /// Parameter revision the packed records were last written from
    pub fn synced_revision(&self) -> u64 {
        self.synced_revision
    }

    pub(crate) fn mark_synced(&mut self, revision: u64) {
        self.synced_revision = revision;
    }

    /// Empty every bucket
    pub fn clear_ot(&mut self) {
        self.ot.clear();
    }

    /// Link the packed record of `slot` at the front of bucket `slot`
    pub fn link_primitive(&mut self, slot: usize) {
        let tag = self.primitives[slot].tag;
        self.primitives[slot].tag = self.ot.insert(slot, Node::Primitive(slot), tag);
    }

    /// Link the draw-page packet of `slot` at the front of bucket `slot`
    ///
    /// Call after [`link_primitive`](Self::link_primitive) so the page is
    /// visited first.
    pub fn link_page(&mut self, slot: usize) {
        let tag = self.pages[slot].tag;
        self.pages[slot].tag = self.ot.insert(slot, Node::DrawPage(slot), tag);
    }

    /// Rebuild the packed record of `slot` from scratch
    ///
    /// Writes the command code, every field the type uses and the texture
    /// ids from the slot's handle. A sprite with a handle also gets its
    /// draw-page packet; for every other case the page is reset. Returns
    /// whether a draw page is present.
    pub fn synthesize(&mut self, slot: usize, param: &PrimitiveParam) -> bool {
        let kind = param.primitive_type();
        let record = &mut self.primitives[slot];
        record.init(kind);
        write_fields(record, param);

        let handle = param.texture_handle();
        if let Some(handle) = handle {
            record.set_clut(handle.clut);
            record.set_tpage(handle.tpage);
        }

        match (kind, handle) {
            (PrimitiveType::Sprite, Some(handle)) => {
                self.pages[slot].init_draw_page(handle.tpage);
                true
            }
            _ => {
                self.pages[slot] = PackedPrimitive::empty();
                false
            }
        }
    }

    /// Re-run the field writers of `slot` without touching type or linkage
    ///
    /// Colors, geometry and texture coordinates are rewritten in place; the
    /// tag word is left alone, so the chain stays intact.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnrecognizedType`] if the slot was never synthesized,
    /// [`EngineError::TypeMismatch`] if the record and the parameters
    /// disagree on the type. The record is left as it was in both cases.
    pub fn update_fields(&mut self, slot: usize, param: &PrimitiveParam) -> Result<()> {
        let record = &mut self.primitives[slot];
        let expected = param.primitive_type();
        match record.primitive_type() {
            Some(found) if found == expected => {
                write_fields(record, param);
                Ok(())
            }
            Some(found) => Err(EngineError::TypeMismatch {
                slot,
                expected,
                found,
            }),
            None => Err(EngineError::UnrecognizedType {
                slot,
                name: "unsynthesized".to_string(),
            }),
        }
    }

    /// Write texture ids from the slot's handle into the existing records
    ///
    /// Quads take page and palette in their own fields; sprites take the
    /// palette and get a draw-page packet. Returns `false` when the record
    /// cannot carry a texture (nothing is written).
    pub fn apply_texture(&mut self, slot: usize, param: &PrimitiveParam) -> bool {
        let Some(handle) = param.texture_handle() else {
            return false;
        };
        let record = &mut self.primitives[slot];
        match record.primitive_type() {
            Some(PrimitiveType::TexturedFlatQuad) | Some(PrimitiveType::TexturedGouraudQuad) => {
                record.set_tpage(handle.tpage);
                record.set_clut(handle.clut);
                true
            }
            Some(PrimitiveType::Sprite) => {
                record.set_clut(handle.clut);
                let page = &mut self.pages[slot];
                let link = (!page.is_empty()).then(|| tag_next(page.tag));
                page.init_draw_page(handle.tpage);
                if let Some(link) = link {
                    // Already in the chain: keep its successor
                    page.tag = (page.tag & !LINK_MASK) | link;
                }
                true
            }
            _ => false,
        }
    }

    /// Walk the chain from bucket 0 to the end marker
    ///
    /// The walk visits at most every node once; a cycle is logged and cut.
    pub fn chain(&self) -> Chain<'_> {
        let slots = self.ot.len();
        Chain {
            buffer: self,
            next: (slots > 0).then_some(Node::Head(0)),
            budget: 3 * slots + 1,
        }
    }

    /// Packets linked in `bucket`, in traversal order, excluding its head
    pub fn bucket_entries(&self, bucket: usize) -> Vec<Node> {
        let slots = self.ot.len();
        let mut nodes = Vec::new();
        let mut link = self.ot.head(bucket);
        for _ in 0..2 * slots {
            match Node::decode(link, slots) {
                Some(Node::Head(_)) | None => break,
                Some(node) => {
                    nodes.push(node);
                    link = self.tag(node);
                }
            }
        }
        nodes
    }

    /// Number of primitive packets reachable from bucket 0
    pub fn reachable_primitives(&self) -> usize {
        self.chain()
            .filter(|entry| matches!(entry.node, Node::Primitive(_)))
            .count()
    }

    fn tag(&self, node: Node) -> u32 {
        match node {
            Node::Head(i) => self.ot.head(i),
            Node::DrawPage(i) => self.pages[i].tag,
            Node::Primitive(i) => self.primitives[i].tag,
        }
    }

    fn payload(&self, node: Node) -> &[u32] {
        match node {
            Node::Head(_) => &[],
            Node::DrawPage(i) => self.pages[i].words(),
            Node::Primitive(i) => self.primitives[i].words(),
        }
    }
}

/// Iterator over an ordering table chain
pub struct Chain<'a> {
    buffer: &'a FrameBuffer,
    next: Option<Node>,
    budget: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = ChainEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        if self.budget == 0 {
            log::error!(
                "Ordering table chain of buffer {} does not terminate",
                self.buffer.index
            );
            self.next = None;
            return None;
        }
        self.budget -= 1;

        let buffer: &'a FrameBuffer = self.buffer;
        self.next = Node::decode(tag_next(buffer.tag(node)), buffer.slots());
        Some(ChainEntry {
            node,
            words: buffer.payload(node),
        })
    }
}

fn alloc_packets(slots: usize, what: &'static str) -> Result<Vec<PackedPrimitive>> {
    let mut packets = Vec::new();
    packets
        .try_reserve_exact(slots)
        .map_err(|_| EngineError::Allocation {
            what,
            requested: slots,
        })?;
    packets.resize(slots, PackedPrimitive::empty());
    Ok(packets)
}

/// Type-specific field writers shared by full and partial synthesis
fn write_fields(record: &mut PackedPrimitive, param: &PrimitiveParam) {
    record.set_xywh(param.origin, param.size);
    for (n, color) in param.colors().into_iter().enumerate() {
        record.set_rgb(n, color);
    }
    if let Some((uv, size)) = param.texture_window() {
        record.set_uvwh(uv, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::{Dimensions, TexCoord, Vertex};
    use crate::core::texture::TextureHandle;

    fn flat(color: Color) -> PrimitiveParam {
        PrimitiveParam::flat_quad(Vertex::new(0, 0), Dimensions::new(10, 10), color)
    }

    #[test]
    fn test_geometry_by_parity() {
        let even = FrameBuffer::new(0, 1, 320, 240, Color::BLACK).unwrap();
        let odd = FrameBuffer::new(1, 1, 320, 240, Color::BLACK).unwrap();
        assert_eq!(even.disp_env().disp.y, 0);
        assert_eq!(even.draw_env().clip.y, 240);
        assert_eq!(odd.disp_env().disp.y, 240);
        assert_eq!(odd.draw_env().clip.y, 0);
        assert!(even.draw_env().isbg);
    }

    #[test]
    fn test_place_swaps_halves_and_keeps_background() {
        let blue = Color::new(0, 0, 255);
        let mut buffer = FrameBuffer::new(2, 1, 320, 240, blue).unwrap();
        assert_eq!(buffer.draw_env().clip.y, 240);

        buffer.place(3);
        assert_eq!(buffer.disp_env().disp.y, 240);
        assert_eq!(buffer.draw_env().clip, Rect::new(0, 0, 320, 240));
        assert_eq!(buffer.draw_env().offset, (0, 0));
        assert_eq!(buffer.draw_env().background, blue);
        assert!(buffer.draw_env().isbg);
    }

    #[test]
    fn test_empty_chain_visits_heads_only() {
        let buffer = FrameBuffer::new(0, 3, 320, 240, Color::BLACK).unwrap();
        let nodes: Vec<Node> = buffer.chain().map(|e| e.node).collect();
        assert_eq!(nodes, vec![Node::Head(0), Node::Head(1), Node::Head(2)]);
        assert_eq!(buffer.reachable_primitives(), 0);
    }

    #[test]
    fn test_link_in_bucket_order() {
        let mut buffer = FrameBuffer::new(0, 2, 320, 240, Color::BLACK).unwrap();
        for slot in 0..2 {
            buffer.synthesize(slot, &flat(Color::new(slot as u8, 0, 0)));
            buffer.link_primitive(slot);
        }
        let nodes: Vec<Node> = buffer.chain().map(|e| e.node).collect();
        assert_eq!(
            nodes,
            vec![
                Node::Head(0),
                Node::Primitive(0),
                Node::Head(1),
                Node::Primitive(1)
            ]
        );
        assert_eq!(buffer.bucket_entries(0), vec![Node::Primitive(0)]);
    }

    #[test]
    fn test_sprite_page_precedes_sprite() {
        let mut buffer = FrameBuffer::new(0, 1, 320, 240, Color::BLACK).unwrap();
        let mut sprite = PrimitiveParam::sprite(
            Vertex::new(0, 0),
            Dimensions::new(16, 16),
            Color::NEUTRAL,
            TexCoord::new(0, 0),
        );
        sprite.set_texture_handle(TextureHandle {
            tpage: 0x0A,
            clut: 0x7FC0,
        });

        assert!(buffer.synthesize(0, &sprite));
        buffer.link_primitive(0);
        buffer.link_page(0);

        assert_eq!(
            buffer.bucket_entries(0),
            vec![Node::DrawPage(0), Node::Primitive(0)]
        );
        let words: Vec<u32> = buffer.chain().flat_map(|e| e.words.to_vec()).collect();
        assert_eq!(words[0], 0xE100_040A);
        assert_eq!(words[1] >> 24, 0x64);
        assert_eq!(words[3] >> 16, 0x7FC0);
    }

    #[test]
    fn test_update_fields_keeps_tag() {
        let mut buffer = FrameBuffer::new(0, 2, 320, 240, Color::BLACK).unwrap();
        buffer.synthesize(0, &flat(Color::BLACK));
        buffer.link_primitive(0);
        let tag = buffer.primitive(0).tag;

        let mut moved = flat(Color::new(9, 9, 9));
        moved.origin = Vertex::new(3, 4);
        buffer.update_fields(0, &moved).unwrap();
        assert_eq!(buffer.primitive(0).tag, tag);
        assert_eq!(buffer.primitive(0).words()[1], Vertex::new(3, 4).to_u32());
    }

    #[test]
    fn test_update_fields_rejects_other_type() {
        let mut buffer = FrameBuffer::new(0, 1, 320, 240, Color::BLACK).unwrap();
        let tile = PrimitiveParam::tile(Vertex::new(0, 0), Dimensions::new(1, 1), Color::BLACK);
        assert!(matches!(
            buffer.update_fields(0, &tile),
            Err(EngineError::UnrecognizedType { slot: 0, .. })
        ));

        buffer.synthesize(0, &flat(Color::BLACK));
        let before = buffer.primitive(0).clone();
        assert!(matches!(
            buffer.update_fields(0, &tile),
            Err(EngineError::TypeMismatch {
                expected: PrimitiveType::Tile,
                found: PrimitiveType::FlatQuad,
                ..
            })
        ));
        assert_eq!(buffer.primitive(0), &before);
    }
}
