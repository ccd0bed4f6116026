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

//! Primitive parameter store
//!
//! One [`PrimitiveParam`] per ordering-table slot describes what should be
//! drawn there. Slot indices are fixed for the session and double as depth
//! buckets. The store is shared by every framebuffer: synthesis reads it,
//! the update loop writes it.
//!
//! Each [`PrimitiveShape`] variant carries exactly the fields its primitive
//! type uses:
//!
//! | type                  | geometry      | colors    | texture                      |
//! |-----------------------|---------------|-----------|------------------------------|
//! | FlatQuad              | origin + size | color0    | -                            |
//! | TexturedFlatQuad      | origin + size | color0    | uv origin + size, page/clut  |
//! | GouraudQuad           | origin + size | color0..3 | -                            |
//! | TexturedGouraudQuad   | origin + size | color0..3 | uv origin + size, page/clut  |
//! | Sprite                | origin, size  | color0    | uv origin, page via DrawPage |
//! | Tile                  | origin, size  | color0    | -                            |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{EngineError, Result};
use super::gpu::{Color, Dimensions, TexCoord, Vertex};
use super::texture::TextureHandle;

/// Closed set of drawable primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    /// Flat-shaded quad (GP0 0x28)
    FlatQuad,
    /// Flat-shaded textured quad (GP0 0x2C)
    TexturedFlatQuad,
    /// Gouraud-shaded quad (GP0 0x38)
    GouraudQuad,
    /// Gouraud-shaded textured quad (GP0 0x3C)
    TexturedGouraudQuad,
    /// Textured rectangle (GP0 0x64)
    Sprite,
    /// Monochrome rectangle (GP0 0x60)
    Tile,
}

impl PrimitiveType {
    /// Every type, in dispatch-table order
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::FlatQuad,
        PrimitiveType::TexturedFlatQuad,
        PrimitiveType::GouraudQuad,
        PrimitiveType::TexturedGouraudQuad,
        PrimitiveType::Sprite,
        PrimitiveType::Tile,
    ];

    /// Name used in scene files and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::FlatQuad => "flat-quad",
            PrimitiveType::TexturedFlatQuad => "textured-flat-quad",
            PrimitiveType::GouraudQuad => "gouraud-quad",
            PrimitiveType::TexturedGouraudQuad => "textured-gouraud-quad",
            PrimitiveType::Sprite => "sprite",
            PrimitiveType::Tile => "tile",
        }
    }

    /// Whether the type samples a texture
    pub fn is_textured(&self) -> bool {
        matches!(
            self,
            PrimitiveType::TexturedFlatQuad
                | PrimitiveType::TexturedGouraudQuad
                | PrimitiveType::Sprite
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PrimitiveType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl TryFrom<u8> for PrimitiveType {
    type Error = u8;

    /// Decode the type byte stored in a slot layout record
    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        PrimitiveType::ALL
            .get(value as usize)
            .copied()
            .ok_or(value)
    }
}

impl From<PrimitiveType> for u8 {
    fn from(value: PrimitiveType) -> Self {
        value as u8
    }
}

/// Texture window of a textured quad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextureRegion {
    /// Texture coordinate of the top-left corner
    pub uv: TexCoord,
    /// Size of the window in texels
    pub size: Dimensions,
    /// Page and palette, once uploaded
    pub handle: Option<TextureHandle>,
}

/// Type-specific payload of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PrimitiveShape {
    /// Flat-shaded quad
    FlatQuad {
        /// Fill color
        color: Color,
    },
    /// Flat-shaded textured quad
    TexturedFlatQuad {
        /// Modulation color
        color: Color,
        /// Texture window
        texture: TextureRegion,
    },
    /// Gouraud-shaded quad
    GouraudQuad {
        /// Corner colors: top-left, top-right, bottom-left, bottom-right
        colors: [Color; 4],
    },
    /// Gouraud-shaded textured quad
    TexturedGouraudQuad {
        /// Corner modulation colors
        colors: [Color; 4],
        /// Texture window
        texture: TextureRegion,
    },
    /// Textured rectangle
    Sprite {
        /// Modulation color
        color: Color,
        /// Texture coordinate of the top-left texel
        uv: TexCoord,
        /// Page and palette, once uploaded
        handle: Option<TextureHandle>,
    },
    /// Monochrome rectangle
    Tile {
        /// Fill color
        color: Color,
    },
}

/// Descriptor of one ordering-table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveParam {
    /// Top-left vertex in screen coordinates
    pub origin: Vertex,
    /// Width and height in pixels
    pub size: Dimensions,
    /// Type-specific fields
    pub shape: PrimitiveShape,
}

impl PrimitiveParam {
    /// Flat quad at `origin`
    pub fn flat_quad(origin: Vertex, size: Dimensions, color: Color) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::FlatQuad { color },
        }
    }

    /// Textured flat quad; the handle is filled in by the texture pass
    pub fn textured_flat_quad(
        origin: Vertex,
        size: Dimensions,
        color: Color,
        uv: TexCoord,
        uv_size: Dimensions,
    ) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::TexturedFlatQuad {
                color,
                texture: TextureRegion {
                    uv,
                    size: uv_size,
                    handle: None,
                },
            },
        }
    }

    /// Gouraud quad with corner colors TL, TR, BL, BR
    pub fn gouraud_quad(origin: Vertex, size: Dimensions, colors: [Color; 4]) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::GouraudQuad { colors },
        }
    }

    /// Textured Gouraud quad; the handle is filled in by the texture pass
    pub fn textured_gouraud_quad(
        origin: Vertex,
        size: Dimensions,
        colors: [Color; 4],
        uv: TexCoord,
        uv_size: Dimensions,
    ) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::TexturedGouraudQuad {
                colors,
                texture: TextureRegion {
                    uv,
                    size: uv_size,
                    handle: None,
                },
            },
        }
    }

    /// Sprite; the handle is filled in by the texture pass
    pub fn sprite(origin: Vertex, size: Dimensions, color: Color, uv: TexCoord) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::Sprite {
                color,
                uv,
                handle: None,
            },
        }
    }

    /// Monochrome tile
    pub fn tile(origin: Vertex, size: Dimensions, color: Color) -> Self {
        Self {
            origin,
            size,
            shape: PrimitiveShape::Tile { color },
        }
    }

    /// Dispatch type of this slot
    pub fn primitive_type(&self) -> PrimitiveType {
        match self.shape {
            PrimitiveShape::FlatQuad { .. } => PrimitiveType::FlatQuad,
            PrimitiveShape::TexturedFlatQuad { .. } => PrimitiveType::TexturedFlatQuad,
            PrimitiveShape::GouraudQuad { .. } => PrimitiveType::GouraudQuad,
            PrimitiveShape::TexturedGouraudQuad { .. } => PrimitiveType::TexturedGouraudQuad,
            PrimitiveShape::Sprite { .. } => PrimitiveType::Sprite,
            PrimitiveShape::Tile { .. } => PrimitiveType::Tile,
        }
    }

    /// First (or only) color
    pub fn color0(&self) -> Color {
        match self.shape {
            PrimitiveShape::FlatQuad { color }
            | PrimitiveShape::TexturedFlatQuad { color, .. }
            | PrimitiveShape::Sprite { color, .. }
            | PrimitiveShape::Tile { color } => color,
            PrimitiveShape::GouraudQuad { colors }
            | PrimitiveShape::TexturedGouraudQuad { colors, .. } => colors[0],
        }
    }

    /// Replace the first (or only) color
    pub fn set_color0(&mut self, value: Color) {
        match &mut self.shape {
            PrimitiveShape::FlatQuad { color }
            | PrimitiveShape::TexturedFlatQuad { color, .. }
            | PrimitiveShape::Sprite { color, .. }
            | PrimitiveShape::Tile { color } => *color = value,
            PrimitiveShape::GouraudQuad { colors }
            | PrimitiveShape::TexturedGouraudQuad { colors, .. } => colors[0] = value,
        }
    }

    /// Corner colors in packet order; flat types repeat color0
    pub fn colors(&self) -> [Color; 4] {
        match self.shape {
            PrimitiveShape::GouraudQuad { colors }
            | PrimitiveShape::TexturedGouraudQuad { colors, .. } => colors,
            _ => [self.color0(); 4],
        }
    }

    /// Texture handle, if the type is textured and one has been assigned
    pub fn texture_handle(&self) -> Option<TextureHandle> {
        match self.shape {
            PrimitiveShape::TexturedFlatQuad { texture, .. }
            | PrimitiveShape::TexturedGouraudQuad { texture, .. } => texture.handle,
            PrimitiveShape::Sprite { handle, .. } => handle,
            _ => None,
        }
    }

    /// Assign the uploaded texture
    ///
    /// Returns `false` (and leaves the slot untouched) for untextured types.
    pub fn set_texture_handle(&mut self, value: TextureHandle) -> bool {
        match &mut self.shape {
            PrimitiveShape::TexturedFlatQuad { texture, .. }
            | PrimitiveShape::TexturedGouraudQuad { texture, .. } => {
                texture.handle = Some(value);
                true
            }
            PrimitiveShape::Sprite { handle, .. } => {
                *handle = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Texture window origin and size; sprites use their own size
    pub fn texture_window(&self) -> Option<(TexCoord, Dimensions)> {
        match self.shape {
            PrimitiveShape::TexturedFlatQuad { texture, .. }
            | PrimitiveShape::TexturedGouraudQuad { texture, .. } => {
                Some((texture.uv, texture.size))
            }
            PrimitiveShape::Sprite { uv, .. } => Some((uv, self.size)),
            _ => None,
        }
    }
}

/// Slot-indexed parameter table shared by all framebuffers
///
/// Every mutable access bumps a revision counter, which lets the scheduler
/// tell whether a framebuffer was synthesized from the latest parameters.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    slots: Vec<Option<PrimitiveParam>>,
    revision: u64,
}

impl ParamStore {
    /// Allocate `count` unset slots
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Allocation`] if the table cannot be reserved.
    pub fn with_slots(count: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(count)
            .map_err(|_| EngineError::Allocation {
                what: "primitive parameter slots",
                requested: count,
            })?;
        slots.resize(count, None);
        Ok(Self { slots, revision: 0 })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parameters of `slot`, if set
    pub fn get(&self, slot: usize) -> Option<&PrimitiveParam> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Mutable parameters of `slot`, if set
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut PrimitiveParam> {
        let param = self.slots.get_mut(slot).and_then(Option::as_mut);
        if param.is_some() {
            self.revision += 1;
        }
        param
    }

    /// Replace the parameters of `slot`
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SlotOutOfRange`] for an index past the table.
    pub fn set(&mut self, slot: usize, param: PrimitiveParam) -> Result<()> {
        let len = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(EngineError::SlotOutOfRange { slot, len })?;
        *entry = Some(param);
        self.revision += 1;
        Ok(())
    }

    /// Iterate over `(slot, parameters)` for every slot
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&PrimitiveParam>)> {
        self.slots.iter().enumerate().map(|(i, p)| (i, p.as_ref()))
    }

    /// Monotonic edit counter
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for t in PrimitiveType::ALL {
            assert_eq!(t.name().parse::<PrimitiveType>(), Ok(t));
        }
        assert_eq!("hexagon".parse::<PrimitiveType>(), Err("hexagon".to_string()));
    }

    #[test]
    fn test_type_byte() {
        assert_eq!(PrimitiveType::try_from(4), Ok(PrimitiveType::Sprite));
        assert_eq!(u8::from(PrimitiveType::Tile), 5);
        assert_eq!(PrimitiveType::try_from(6), Err(6));
    }

    #[test]
    fn test_color0_on_gouraud() {
        let mut p = PrimitiveParam::gouraud_quad(
            Vertex::new(0, 0),
            Dimensions::new(8, 8),
            [Color::BLACK; 4],
        );
        p.set_color0(Color::new(1, 2, 3));
        assert_eq!(p.colors()[0], Color::new(1, 2, 3));
        assert_eq!(p.colors()[1], Color::BLACK);
    }

    #[test]
    fn test_texture_handle_only_on_textured() {
        let handle = TextureHandle {
            tpage: 0x0A,
            clut: 0x7FC0,
        };
        let mut tile = PrimitiveParam::tile(Vertex::new(0, 0), Dimensions::new(1, 1), Color::BLACK);
        assert!(!tile.set_texture_handle(handle));
        assert_eq!(tile.texture_handle(), None);

        let mut sprite = PrimitiveParam::sprite(
            Vertex::new(0, 0),
            Dimensions::new(16, 16),
            Color::NEUTRAL,
            TexCoord::new(0, 0),
        );
        assert!(sprite.set_texture_handle(handle));
        assert_eq!(sprite.texture_handle(), Some(handle));
        assert_eq!(
            sprite.texture_window(),
            Some((TexCoord::new(0, 0), Dimensions::new(16, 16)))
        );
    }

    #[test]
    fn test_store_bounds_and_revision() {
        let mut store = ParamStore::with_slots(2).unwrap();
        assert!(store.get(0).is_none());
        assert!(store.get_mut(0).is_none());
        assert_eq!(store.revision(), 0);

        let p = PrimitiveParam::tile(Vertex::new(0, 0), Dimensions::new(1, 1), Color::BLACK);
        store.set(1, p).unwrap();
        assert_eq!(store.revision(), 1);
        store.get_mut(1).unwrap().origin.x = 3;
        assert_eq!(store.revision(), 2);

        assert!(matches!(
            store.set(2, p),
            Err(EngineError::SlotOutOfRange { slot: 2, len: 2 })
        ));
    }
}
