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

//! Ordering tables
//!
//! An ordering table is an array of chain heads, one per depth bucket. Every
//! packet starts with a tag word:
//!
//! ```text
//! Bits 24-31: number of payload words that follow
//! Bits  0-23: address of the next packet (0xFFFFFF = end of chain)
//! ```
//!
//! Addresses here are not RAM addresses but [`Node`] numbers inside one
//! [`FrameBuffer`]: heads, draw-page packets and primitive packets each get a
//! contiguous range. The GPU side walks the chain from bucket 0, streaming
//! payload words, the way the linked-list DMA channel does.
//!
//! # References
//!
//! - [PSX-SPX: DMA Linked-list mode](http://problemkaputt.de/psx-spx.htm#dmachannels)

mod buffer;
mod packet;

pub use buffer::{ChainEntry, FrameBuffer};
pub use packet::{PackedPrimitive, PacketKind};

use super::error::{EngineError, Result};

/// Terminator stored in the link field of the last packet
pub const OT_END: u32 = 0x00FF_FFFF;

/// Mask of the link field of a tag word
pub const LINK_MASK: u32 = 0x00FF_FFFF;

/// A packet addressable from a tag word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// Empty head entry of bucket `i`
    Head(usize),
    /// Draw-page packet linked ahead of the sprite in slot `i`
    DrawPage(usize),
    /// Packed primitive of slot `i`
    Primitive(usize),
}

impl Node {
    /// Largest slot count whose node numbers all fit in a link field
    pub const fn max_slots() -> usize {
        (OT_END as usize) / 3
    }

    /// Link field value for this node in a table of `slots` buckets
    pub fn encode(&self, slots: usize) -> u32 {
        let index = match *self {
            Node::Head(i) => i,
            Node::DrawPage(i) => slots + i,
            Node::Primitive(i) => 2 * slots + i,
        };
        index as u32 & LINK_MASK
    }

    /// Resolve a link field, `None` for the end marker or a dangling link
    pub fn decode(link: u32, slots: usize) -> Option<Self> {
        let link = (link & LINK_MASK) as usize;
        if link == OT_END as usize {
            return None;
        }
        match link / slots.max(1) {
            0 => Some(Node::Head(link)),
            1 => Some(Node::DrawPage(link - slots)),
            2 => Some(Node::Primitive(link - 2 * slots)),
            _ => None,
        }
    }
}

/// Extract the payload word count from a tag
#[inline(always)]
pub fn tag_len(tag: u32) -> usize {
    (tag >> 24) as usize
}

/// Extract the link field from a tag
#[inline(always)]
pub fn tag_next(tag: u32) -> u32 {
    tag & LINK_MASK
}

/// Depth-bucketed chain heads of one framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingTable {
    heads: Vec<u32>,
}

impl OrderingTable {
    /// Allocate `slots` heads, linked and empty
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] if the table cannot be reserved or
    /// its node numbers would not fit in a link field.
    pub fn new(slots: usize) -> Result<Self> {
        let allocation_error = EngineError::Allocation {
            what: "ordering table entries",
            requested: slots,
        };
        if slots > Node::max_slots() {
            return Err(allocation_error);
        }

        let mut heads = Vec::new();
        heads
            .try_reserve_exact(slots)
            .map_err(|_| allocation_error)?;
        heads.resize(slots, OT_END);

        let mut ot = Self { heads };
        ot.clear();
        Ok(ot)
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Whether the table has no buckets
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Reset every bucket to empty (ClearOTag)
    ///
    /// Head `i` links to head `i + 1`; the last head carries the end marker,
    /// so a walk from bucket 0 visits buckets in increasing order.
    pub fn clear(&mut self) {
        let slots = self.heads.len();
        for i in 0..slots {
            self.heads[i] = if i + 1 == slots {
                OT_END
            } else {
                Node::Head(i + 1).encode(slots)
            };
        }
        log::trace!("Ordering table cleared ({} entries)", slots);
    }

    /// Tag word of bucket `i`
    pub fn head(&self, bucket: usize) -> u32 {
        self.heads[bucket]
    }

    /// Splice a packet at the front of `bucket` (AddPrim)
    ///
    /// The packet inherits the bucket's old link and the bucket now points at
    /// it. Returns the packet's new tag word.
    pub(crate) fn insert(&mut self, bucket: usize, node: Node, packet_tag: u32) -> u32 {
        let slots = self.heads.len();
        let head = &mut self.heads[bucket];
        let tag = (packet_tag & !LINK_MASK) | tag_next(*head);
        *head = (*head & !LINK_MASK) | node.encode(slots);
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_links_forward() {
        let ot = OrderingTable::new(3).unwrap();
        assert_eq!(ot.head(0), 1);
        assert_eq!(ot.head(1), 2);
        assert_eq!(ot.head(2), OT_END);
    }

    #[test]
    fn test_single_bucket_is_terminated() {
        let ot = OrderingTable::new(1).unwrap();
        assert_eq!(ot.head(0), OT_END);
    }

    #[test]
    fn test_node_encoding_ranges() {
        let slots = 6;
        for i in 0..slots {
            for node in [Node::Head(i), Node::DrawPage(i), Node::Primitive(i)] {
                assert_eq!(Node::decode(node.encode(slots), slots), Some(node));
            }
        }
        assert_eq!(Node::decode(OT_END, slots), None);
        assert_eq!(Node::decode(3 * slots as u32, slots), None);
    }

    #[test]
    fn test_insert_takes_old_link() {
        let mut ot = OrderingTable::new(2).unwrap();
        let tag = ot.insert(0, Node::Primitive(0), 5 << 24);
        assert_eq!(tag, (5 << 24) | 1);
        assert_eq!(ot.head(0), Node::Primitive(0).encode(2));
    }

    #[test]
    fn test_oversized_table_rejected() {
        assert!(matches!(
            OrderingTable::new(Node::max_slots() + 1),
            Err(EngineError::Allocation { .. })
        ));
    }
}
