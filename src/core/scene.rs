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

//! Scene files and slot layout records
//!
//! A scene lists one `[[slot]]` table per ordering-table slot:
//!
//! ```toml
//! [[slot]]
//! type = "textured-flat-quad"
//! x = 16
//! y = 16
//! w = 64
//! h = 64
//! colors = [[128, 128, 128]]
//! uv = [0, 0]
//! uv_size = [64, 64]
//! texture = "\\DATA\\BRICK.TIM;1"
//! ```
//!
//! `colors` takes one entry, or four for Gouraud types (top-left,
//! top-right, bottom-left, bottom-right). A slot whose type is not known is
//! reported and left unset.
//!
//! [`SlotLayoutRecord`] is the fixed-length save record holding slot
//! positions on the memory card.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{EngineError, Result};
use super::gpu::{Color, Dimensions, TexCoord, Vertex};
use super::params::{ParamStore, PrimitiveParam, PrimitiveType};

/// One `[[slot]]` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSpec {
    /// Type name, e.g. `"flat-quad"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Origin X
    pub x: i16,
    /// Origin Y
    pub y: i16,
    /// Width
    pub w: u16,
    /// Height
    pub h: u16,
    /// One or four `[r, g, b]` colors
    pub colors: Vec<[u8; 3]>,
    /// Texture coordinate of the top-left corner
    pub uv: [u8; 2],
    /// Texture window size; defaults to the primitive size
    pub uv_size: Option<[u16; 2]>,
    /// Storage path of the texture image
    pub texture: Option<String>,
}

impl SlotSpec {
    /// Build the slot's parameters
    ///
    /// # Errors
    ///
    /// [`EngineError::UnrecognizedType`] if `kind` is not a known type.
    pub fn to_param(&self, slot: usize) -> Result<PrimitiveParam> {
        let kind: PrimitiveType = self
            .kind
            .parse()
            .map_err(|name| EngineError::UnrecognizedType { slot, name })?;

        let origin = Vertex::new(self.x, self.y);
        let size = Dimensions::new(self.w, self.h);
        let color = self.color(0);
        let colors = [self.color(0), self.color(1), self.color(2), self.color(3)];
        let uv = TexCoord::new(self.uv[0], self.uv[1]);
        let uv_size = self
            .uv_size
            .map_or(size, |[w, h]| Dimensions::new(w, h));

        Ok(match kind {
            PrimitiveType::FlatQuad => PrimitiveParam::flat_quad(origin, size, color),
            PrimitiveType::TexturedFlatQuad => {
                PrimitiveParam::textured_flat_quad(origin, size, color, uv, uv_size)
            }
            PrimitiveType::GouraudQuad => PrimitiveParam::gouraud_quad(origin, size, colors),
            PrimitiveType::TexturedGouraudQuad => {
                PrimitiveParam::textured_gouraud_quad(origin, size, colors, uv, uv_size)
            }
            PrimitiveType::Sprite => PrimitiveParam::sprite(origin, size, color, uv),
            PrimitiveType::Tile => PrimitiveParam::tile(origin, size, color),
        })
    }

    /// Color `n`, falling back to the first color, then neutral grey
    fn color(&self, n: usize) -> Color {
        self.colors
            .get(n)
            .or_else(|| self.colors.first())
            .map_or(Color::NEUTRAL, |&rgb| Color::from(rgb))
    }
}

/// A scene file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Slot entries in slot order
    #[serde(default, rename = "slot")]
    pub slots: Vec<SlotSpec>,
}

impl Scene {
    /// Load a scene from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read scene {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse scene TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse scene: {}", e)))
    }

    /// Write every recognized slot into `store`
    ///
    /// Entries past the end of the store are ignored with a warning;
    /// entries with an unknown type are logged and their slot left unset.
    ///
    /// # Returns
    ///
    /// Number of slots written
    pub fn apply(&self, store: &mut ParamStore) -> Result<usize> {
        let mut written = 0;
        for (slot, entry) in self.slots.iter().enumerate() {
            if slot >= store.len() {
                log::warn!(
                    "Scene has {} slots, ordering table only {}",
                    self.slots.len(),
                    store.len()
                );
                break;
            }
            match entry.to_param(slot) {
                Ok(param) => {
                    store.set(slot, param)?;
                    written += 1;
                }
                Err(err) => log::error!("{}", err),
            }
        }
        Ok(written)
    }

    /// Texture path of every slot, in slot order
    pub fn texture_paths(&self) -> Vec<Option<&str>> {
        self.slots.iter().map(|s| s.texture.as_deref()).collect()
    }
}

/// The moving-squares demo: `count` flat quads stacked at the origin
///
/// Slot `i` is `240 / (i + 1)` pixels square with a random color, so later
/// (smaller) slots sit on top of earlier ones.
pub fn moving_squares<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<PrimitiveParam> {
    (0..count)
        .map(|i| {
            let side = (240 / (i + 1)) as u16;
            let color = Color::new(rng.gen(), rng.gen(), rng.gen());
            PrimitiveParam::flat_quad(Vertex::new(0, 0), Dimensions::new(side, side), color)
        })
        .collect()
}

/// Bytes per slot in a [`SlotLayoutRecord`]
pub const SLOT_RECORD_SIZE: usize = 8;

/// Saved position, size and type of every slot
///
/// Layout per slot, little-endian: `x: i16, y: i16, w: u16, h: u8, type: u8`.
/// Heights above 255 are clamped. Unset slots store type 0xFF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayoutRecord {
    entries: Vec<Option<(Vertex, Dimensions, PrimitiveType)>>,
}

impl SlotLayoutRecord {
    /// Capture the layout of a parameter store
    pub fn capture(store: &ParamStore) -> Self {
        Self {
            entries: store
                .iter()
                .map(|(_, p)| p.map(|p| (p.origin, p.size, p.primitive_type())))
                .collect(),
        }
    }

    /// Record length for `slots` slots
    pub fn len_for(slots: usize) -> usize {
        slots * SLOT_RECORD_SIZE
    }

    /// Encode to the fixed-length byte form
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::len_for(self.entries.len()));
        for entry in &self.entries {
            match entry {
                Some((origin, size, kind)) => {
                    out.extend_from_slice(&origin.x.to_le_bytes());
                    out.extend_from_slice(&origin.y.to_le_bytes());
                    out.extend_from_slice(&size.w.to_le_bytes());
                    out.push(size.h.min(255) as u8);
                    out.push(u8::from(*kind));
                }
                None => out.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0xFF]),
            }
        }
        out
    }

    /// Decode a record
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] if the length is not a whole number of slots.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % SLOT_RECORD_SIZE != 0 {
            return Err(EngineError::Config(format!(
                "slot layout record of {} bytes is not a multiple of {}",
                bytes.len(),
                SLOT_RECORD_SIZE
            )));
        }
        let entries = bytes
            .chunks_exact(SLOT_RECORD_SIZE)
            .map(|b| {
                PrimitiveType::try_from(b[7]).ok().map(|kind| {
                    (
                        Vertex::new(
                            i16::from_le_bytes([b[0], b[1]]),
                            i16::from_le_bytes([b[2], b[3]]),
                        ),
                        Dimensions::new(u16::from_le_bytes([b[4], b[5]]), b[6] as u16),
                        kind,
                    )
                })
            })
            .collect();
        Ok(Self { entries })
    }

    /// Move every slot whose saved type matches to its saved position
    ///
    /// # Returns
    ///
    /// Number of slots restored
    pub fn restore(&self, store: &mut ParamStore) -> usize {
        let mut restored = 0;
        for (slot, entry) in self.entries.iter().enumerate() {
            let Some((origin, _, kind)) = entry else {
                continue;
            };
            if store.get(slot).map(PrimitiveParam::primitive_type) != Some(*kind) {
                continue;
            }
            if let Some(param) = store.get_mut(slot) {
                param.origin = *origin;
                restored += 1;
            }
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const SCENE: &str = r#"
        [[slot]]
        type = "gouraud-quad"
        x = 10
        y = 20
        w = 30
        h = 40
        colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]]

        [[slot]]
        type = "hexagon"

        [[slot]]
        type = "sprite"
        w = 16
        h = 16
        uv = [32, 0]
        texture = "\\DATA\\BALL.TIM;1"
    "#;

    #[test]
    fn test_apply_skips_unknown_type() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        let mut store = ParamStore::with_slots(3).unwrap();
        assert_eq!(scene.apply(&mut store).unwrap(), 2);

        let quad = store.get(0).unwrap();
        assert_eq!(quad.primitive_type(), PrimitiveType::GouraudQuad);
        assert_eq!(quad.colors()[2], Color::new(0, 0, 255));
        assert!(store.get(1).is_none());
        assert_eq!(store.get(2).unwrap().primitive_type(), PrimitiveType::Sprite);
        assert_eq!(
            scene.texture_paths(),
            vec![None, None, Some("\\DATA\\BALL.TIM;1")]
        );
    }

    #[test]
    fn test_unknown_type_error() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert!(matches!(
            scene.slots[1].to_param(1),
            Err(EngineError::UnrecognizedType { slot: 1, ref name }) if name == "hexagon"
        ));
    }

    #[test]
    fn test_single_color_fills_corners() {
        let entry = SlotSpec {
            kind: "textured-gouraud-quad".into(),
            colors: vec![[1, 2, 3]],
            w: 8,
            h: 8,
            ..Default::default()
        };
        let param = entry.to_param(0).unwrap();
        assert_eq!(param.colors(), [Color::new(1, 2, 3); 4]);
        assert_eq!(
            param.texture_window(),
            Some((TexCoord::new(0, 0), Dimensions::new(8, 8)))
        );
    }

    #[test]
    fn test_moving_squares_sizes() {
        let mut rng = SmallRng::seed_from_u64(7);
        let squares = moving_squares(6, &mut rng);
        let sides: Vec<u16> = squares.iter().map(|p| p.size.w).collect();
        assert_eq!(sides, vec![240, 120, 80, 60, 48, 40]);
        assert!(squares.iter().all(|p| p.origin == Vertex::new(0, 0)));
    }

    #[test]
    fn test_layout_record_restores_positions() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut store = ParamStore::with_slots(3).unwrap();
        for (i, p) in moving_squares(2, &mut rng).into_iter().enumerate() {
            store.set(i, p).unwrap();
        }
        store.get_mut(1).unwrap().origin = Vertex::new(-3, 17);

        let bytes = SlotLayoutRecord::capture(&store).encode();
        assert_eq!(bytes.len(), SlotLayoutRecord::len_for(3));
        assert_eq!(bytes[23], 0xFF);

        store.get_mut(1).unwrap().origin = Vertex::new(0, 0);
        let record = SlotLayoutRecord::decode(&bytes).unwrap();
        assert_eq!(record.restore(&mut store), 2);
        assert_eq!(store.get(1).unwrap().origin, Vertex::new(-3, 17));
    }

    #[test]
    fn test_layout_record_length_checked() {
        assert!(SlotLayoutRecord::decode(&[0; 9]).is_err());
    }
}
