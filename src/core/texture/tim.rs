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

//! TIM texture container
//!
//! ```text
//! Offset  Size  Field
//! 0x00    4     ID (0x00000010)
//! 0x04    4     Flags: bits 0-2 pixel mode, bit 3 CLUT present
//! ...           CLUT block (if present)
//! ...           Pixel block
//!
//! Block:
//! 0x00    4     Block length in bytes, header included
//! 0x04    2     VRAM X
//! 0x06    2     VRAM Y
//! 0x08    2     Width in 16-bit units
//! 0x0A    2     Height
//! 0x0C    ...   Width × Height halfwords
//! ```
//!
//! # References
//!
//! - [PSX-SPX: TIM](http://problemkaputt.de/psx-spx.htm#cdromfileformats)

use crate::core::error::TimError;
use crate::core::gpu::{clut_id, tpage_id, Rect, TextureDepth};

/// Identifier word at offset 0
pub const TIM_MAGIC: u32 = 0x10;

/// Flag bit announcing a CLUT block
const FLAG_CLUT: u32 = 1 << 3;

/// Size of a block header in bytes
const BLOCK_HEADER: usize = 12;

/// One VRAM-bound rectangle of halfwords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    /// Destination rectangle in VRAM
    pub rect: Rect,
    /// Row-major 16-bit cells
    pub data: Vec<u16>,
}

/// Parsed TIM image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimImage {
    /// Pixel depth
    pub depth: TextureDepth,
    /// Pixel data block
    pub pixels: ImageBlock,
    /// Palette block, for 4-bit and 8-bit images
    pub clut: Option<ImageBlock>,
}

impl TimImage {
    /// Parse a TIM blob
    ///
    /// # Errors
    ///
    /// - [`TimError::BadMagic`] if the identifier is not 0x10
    /// - [`TimError::UnsupportedMode`] for 24-bit and mixed images
    /// - [`TimError::Truncated`] if a header or block runs past the end
    /// - [`TimError::BlockSize`] if a block length disagrees with its rectangle
    ///
    /// # Examples
    ///
    /// ```
    /// use psot::core::texture::TimImage;
    ///
    /// let mut blob = Vec::new();
    /// blob.extend_from_slice(&0x10u32.to_le_bytes());
    /// blob.extend_from_slice(&2u32.to_le_bytes()); // 15-bit, no CLUT
    /// blob.extend_from_slice(&14u32.to_le_bytes());
    /// for v in [640u16, 0, 1, 1, 0x7FFF] {
    ///     blob.extend_from_slice(&v.to_le_bytes());
    /// }
    ///
    /// let tim = TimImage::parse(&blob).unwrap();
    /// assert_eq!(tim.pixels.data, vec![0x7FFF]);
    /// assert!(tim.clut.is_none());
    /// ```
    pub fn parse(blob: &[u8]) -> Result<Self, TimError> {
        let id = read_u32(blob, 0)?;
        if id != TIM_MAGIC {
            return Err(TimError::BadMagic(id));
        }

        let flags = read_u32(blob, 4)?;
        let mode = flags & 0x7;
        let depth = match mode {
            0 => TextureDepth::T4Bit,
            1 => TextureDepth::T8Bit,
            2 => TextureDepth::T15Bit,
            other => return Err(TimError::UnsupportedMode(other)),
        };

        let mut offset = 8;
        let clut = if flags & FLAG_CLUT != 0 {
            let (block, next) = read_block(blob, offset)?;
            offset = next;
            Some(block)
        } else {
            None
        };
        let (pixels, _) = read_block(blob, offset)?;

        Ok(Self {
            depth,
            pixels,
            clut,
        })
    }

    /// Texture page id of the pixel block (semi-transparency mode 0)
    pub fn tpage_id(&self) -> u16 {
        tpage_id(self.depth, 0, self.pixels.rect.x, self.pixels.rect.y)
    }

    /// Palette id of the CLUT block, 0 without one
    pub fn clut_id(&self) -> u16 {
        self.clut
            .as_ref()
            .map_or(0, |clut| clut_id(clut.rect.x, clut.rect.y))
    }
}

fn read_block(blob: &[u8], offset: usize) -> Result<(ImageBlock, usize), TimError> {
    let declared = read_u32(blob, offset)?;
    let x = read_u16(blob, offset + 4)?;
    let y = read_u16(blob, offset + 6)?;
    let w = read_u16(blob, offset + 8)?;
    let h = read_u16(blob, offset + 10)?;

    let cells = w as usize * h as usize;
    let expected = BLOCK_HEADER + cells * 2;
    if declared as usize != expected {
        return Err(TimError::BlockSize {
            declared,
            width: w,
            height: h,
        });
    }

    let start = offset + BLOCK_HEADER;
    let end = offset + expected;
    let bytes = blob.get(start..end).ok_or(TimError::Truncated {
        needed: end,
        available: blob.len(),
    })?;
    let data = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok((
        ImageBlock {
            rect: Rect::new(x, y, w, h),
            data,
        },
        end,
    ))
}

fn read_u32(blob: &[u8], offset: usize) -> Result<u32, TimError> {
    blob.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(TimError::Truncated {
            needed: offset + 4,
            available: blob.len(),
        })
}

fn read_u16(blob: &[u8], offset: usize) -> Result<u16, TimError> {
    blob.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(TimError::Truncated {
            needed: offset + 2,
            available: blob.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x: u16, y: u16, w: u16, h: u16, fill: u16) -> Vec<u8> {
        let mut out = Vec::new();
        let len = BLOCK_HEADER as u32 + w as u32 * h as u32 * 2;
        out.extend_from_slice(&len.to_le_bytes());
        for v in [x, y, w, h] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for _ in 0..(w as usize * h as usize) {
            out.extend_from_slice(&fill.to_le_bytes());
        }
        out
    }

    fn header(flags: u32) -> Vec<u8> {
        let mut out = TIM_MAGIC.to_le_bytes().to_vec();
        out.extend_from_slice(&flags.to_le_bytes());
        out
    }

    #[test]
    fn test_parse_4bit_with_clut() {
        let mut blob = header(FLAG_CLUT);
        blob.extend(block(0, 480, 16, 1, 0x7FFF));
        blob.extend(block(640, 256, 4, 16, 0x1111));

        let tim = TimImage::parse(&blob).unwrap();
        assert_eq!(tim.depth, TextureDepth::T4Bit);
        assert_eq!(tim.pixels.rect, Rect::new(640, 256, 4, 16));
        assert_eq!(tim.pixels.data.len(), 64);
        assert_eq!(tim.clut.as_ref().unwrap().data.len(), 16);
        assert_eq!(tim.tpage_id(), 0x1A);
        assert_eq!(tim.clut_id(), 480 << 6);
    }

    #[test]
    fn test_bad_magic() {
        let mut blob = 0x11u32.to_le_bytes().to_vec();
        blob.extend_from_slice(&[0; 4]);
        assert_eq!(TimImage::parse(&blob), Err(TimError::BadMagic(0x11)));
    }

    #[test]
    fn test_24bit_rejected() {
        let blob = header(3);
        assert_eq!(TimImage::parse(&blob), Err(TimError::UnsupportedMode(3)));
    }

    #[test]
    fn test_truncated_pixels() {
        let mut blob = header(2);
        let mut pixels = block(0, 0, 4, 4, 0);
        pixels.truncate(20);
        blob.extend(pixels);
        assert!(matches!(
            TimImage::parse(&blob),
            Err(TimError::Truncated { needed: 52, .. })
        ));
    }

    #[test]
    fn test_block_length_mismatch() {
        let mut blob = header(2);
        let mut pixels = block(0, 0, 2, 2, 0);
        pixels[0] = 99;
        blob.extend(pixels);
        assert!(matches!(
            TimImage::parse(&blob),
            Err(TimError::BlockSize { declared: 99, .. })
        ));
    }
}
