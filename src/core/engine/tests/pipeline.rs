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

//! Texture association, full synthesis and partial update

use proptest::prelude::*;

use super::*;
use crate::core::config::TextureFailurePolicy;
use crate::core::error::{EngineError, TimError};
use crate::core::gpu::{DrawCommand, TexCoord};
use crate::core::ot::Node;
use crate::core::params::PrimitiveType;

fn any_param() -> impl Strategy<Value = PrimitiveParam> {
    (
        0usize..6,
        0i16..200,
        0i16..200,
        1u16..64,
        1u16..64,
        any::<[u8; 3]>(),
    )
        .prop_map(|(kind, x, y, w, h, rgb)| {
            let origin = Vertex::new(x, y);
            let size = Dimensions::new(w, h);
            let color = Color::from(rgb);
            let uv = TexCoord::new(rgb[0], rgb[1]);
            match PrimitiveType::ALL[kind] {
                PrimitiveType::FlatQuad => PrimitiveParam::flat_quad(origin, size, color),
                PrimitiveType::TexturedFlatQuad => {
                    PrimitiveParam::textured_flat_quad(origin, size, color, uv, size)
                }
                PrimitiveType::GouraudQuad => {
                    PrimitiveParam::gouraud_quad(origin, size, [color, Color::BLACK, color, Color::NEUTRAL])
                }
                PrimitiveType::TexturedGouraudQuad => {
                    PrimitiveParam::textured_gouraud_quad(origin, size, [color; 4], uv, size)
                }
                PrimitiveType::Sprite => PrimitiveParam::sprite(origin, size, color, uv),
                PrimitiveType::Tile => PrimitiveParam::tile(origin, size, color),
            }
        })
}

fn engine_from(params: &[PrimitiveParam]) -> Engine<HeadlessGpu> {
    let mut engine = engine(params.len());
    for (slot, param) in params.iter().enumerate() {
        engine.set_param(slot, *param).unwrap();
    }
    engine
}

proptest! {
    #[test]
    fn prop_every_bucket_holds_its_own_slot(params in prop::collection::vec(any_param(), 1..24)) {
        let mut engine = engine_from(&params);
        engine.populate_ot();

        for buffer in engine.buffers() {
            for slot in 0..params.len() {
                prop_assert_eq!(buffer.bucket_entries(slot), vec![Node::Primitive(slot)]);
            }
            prop_assert_eq!(buffer.reachable_primitives(), params.len());
        }
    }

    #[test]
    fn prop_full_synthesis_is_idempotent(params in prop::collection::vec(any_param(), 1..24)) {
        let mut engine = engine_from(&params);
        engine.populate_ot();
        let first: Vec<_> = engine.buffers().to_vec();
        engine.populate_ot();

        for (before, after) in first.iter().zip(engine.buffers()) {
            for slot in 0..params.len() {
                prop_assert_eq!(before.primitive(slot), after.primitive(slot));
                prop_assert_eq!(before.page(slot), after.page(slot));
            }
            prop_assert_eq!(before.ot(), after.ot());
        }
    }

    #[test]
    fn prop_partial_update_keeps_linkage(
        params in prop::collection::vec(any_param(), 1..24),
        dx in -20i16..20,
        dy in -20i16..20,
    ) {
        let mut engine = engine_from(&params);
        engine.populate_ot();
        let heads_before = engine.current_buffer().ot().clone();

        for slot in 0..params.len() {
            let param = engine.params_mut().get_mut(slot).unwrap();
            param.origin = Vertex::new(param.origin.x + dx, param.origin.y + dy);
        }
        engine.update_prim();

        let buffer = engine.current_buffer();
        prop_assert_eq!(buffer.reachable_primitives(), params.len());
        prop_assert_eq!(buffer.ot(), &heads_before);
        for slot in 0..params.len() {
            prop_assert_eq!(buffer.bucket_entries(slot), vec![Node::Primitive(slot)]);
        }
    }
}

#[test]
fn test_six_flat_quads_draw_in_bucket_order() {
    let mut engine = engine(6);
    fill_flat(&mut engine);
    engine.populate_ot();
    engine.display().unwrap();

    let colors: Vec<Color> = engine
        .gpu()
        .frame_log()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::FlatQuad { color, .. } => Some(*color),
            _ => None,
        })
        .collect();
    let expected: Vec<Color> = (0..6).map(palette).collect();
    assert_eq!(colors, expected);
}

#[test]
fn test_partial_update_touches_only_current_buffer() {
    let mut engine = engine(3);
    fill_flat(&mut engine);
    engine.populate_ot();

    engine.params_mut().get_mut(1).unwrap().set_color0(Color::new(1, 2, 3));
    engine.update_prim();

    let rgb = |engine: &Engine<HeadlessGpu>, buffer: usize| {
        engine.buffer(buffer).unwrap().primitive(1).words()[0] & 0x00FF_FFFF
    };
    assert_eq!(rgb(&engine, 0), Color::new(1, 2, 3).to_u32());
    assert_eq!(rgb(&engine, 1), palette(1).to_u32());
}

#[test]
fn test_update_with_changed_type_leaves_record_stale() {
    let mut engine = engine(2);
    fill_flat(&mut engine);
    engine.populate_ot();
    let before = engine.current_buffer().primitive(0).clone();

    let tile = PrimitiveParam::tile(Vertex::new(50, 50), Dimensions::new(4, 4), Color::BLACK);
    engine.set_param(0, tile).unwrap();
    engine.update_prim();

    assert_eq!(engine.current_buffer().primitive(0), &before);
    assert_eq!(engine.current_buffer().reachable_primitives(), 2);
}

#[test]
fn test_unset_slot_leaves_bucket_empty() {
    let mut engine = engine(3);
    engine.set_param(0, flat(0, 0, 8, 8, Color::BLACK)).unwrap();
    engine.set_param(2, flat(4, 4, 8, 8, Color::BLACK)).unwrap();
    engine.populate_ot();

    let buffer = engine.current_buffer();
    assert!(buffer.bucket_entries(1).is_empty());
    assert_eq!(buffer.reachable_primitives(), 2);
}

#[test]
fn test_texture_handle_reaches_every_buffer() {
    let mut engine = engine(4);
    fill_flat(&mut engine);
    let textured = PrimitiveParam::textured_flat_quad(
        Vertex::new(10, 10),
        Dimensions::new(16, 16),
        Color::NEUTRAL,
        TexCoord::new(0, 0),
        Dimensions::new(16, 16),
    );
    engine.set_param(2, textured).unwrap();
    engine.populate_ot();

    let blob = tim_4bit();
    let report = engine
        .populate_tpage(&[None, None, Some(blob.as_slice())])
        .unwrap();
    assert_eq!(report.textured, vec![2]);

    let handle = engine.params().get(2).unwrap().texture_handle().unwrap();
    assert_eq!((handle.tpage, handle.clut), (0x001A, 0x7800));
    for buffer in engine.buffers() {
        let words = buffer.primitive(2).words();
        assert_eq!(words[2] >> 16, handle.clut as u32);
        assert_eq!(words[4] >> 16, handle.tpage as u32);
    }
}

#[test]
fn test_texture_pass_before_synthesis() {
    let mut engine = engine(1);
    let quad = PrimitiveParam::textured_gouraud_quad(
        Vertex::new(0, 0),
        Dimensions::new(8, 8),
        [Color::NEUTRAL; 4],
        TexCoord::new(0, 0),
        Dimensions::new(8, 8),
    );
    engine.set_param(0, quad).unwrap();

    let blob = tim_15bit();
    engine.populate_tpage(&[Some(blob.as_slice())]).unwrap();
    engine.populate_ot();

    let words = engine.current_buffer().primitive(0).words();
    assert_eq!(words[5] >> 16, 0x010C);
    assert_eq!(words[2] >> 16, 0);
}

#[test]
fn test_sprite_page_linked_once_ahead_of_sprite() {
    let mut engine = engine(2);
    fill_flat(&mut engine);
    let sprite = PrimitiveParam::sprite(
        Vertex::new(0, 0),
        Dimensions::new(16, 16),
        Color::NEUTRAL,
        TexCoord::new(0, 0),
    );
    engine.set_param(1, sprite).unwrap();
    engine.populate_ot();

    let blob = tim_4bit();
    let sources = [None, Some(blob.as_slice())];
    engine.populate_tpage(&sources).unwrap();
    engine.populate_tpage(&sources).unwrap();
    assert_eq!(engine.textures().uploads(), 2);

    for buffer in engine.buffers() {
        assert_eq!(
            buffer.bucket_entries(1),
            vec![Node::DrawPage(1), Node::Primitive(1)]
        );
        assert_eq!(buffer.page(1).words(), &[0xE100_0000 | 0x001A | 1 << 10]);
        assert_eq!(buffer.primitive(1).words()[2] >> 16, 0x7800);
    }

    // Full synthesis rebuilds the same chain
    engine.populate_ot();
    assert_eq!(
        engine.current_buffer().bucket_entries(1),
        vec![Node::DrawPage(1), Node::Primitive(1)]
    );

    engine.display().unwrap();
    let log = engine.gpu().frame_log();
    let page = log
        .iter()
        .position(|c| matches!(c, DrawCommand::DrawMode { .. }))
        .unwrap();
    let sprite = log
        .iter()
        .position(|c| matches!(c, DrawCommand::TexturedRectangle { .. }))
        .unwrap();
    assert!(page < sprite);
}

#[test]
fn test_bad_texture_skipped_by_default() {
    let mut engine = engine(2);
    let textured = PrimitiveParam::textured_flat_quad(
        Vertex::new(0, 0),
        Dimensions::new(8, 8),
        Color::NEUTRAL,
        TexCoord::new(0, 0),
        Dimensions::new(8, 8),
    );
    engine.set_param(0, textured).unwrap();
    engine.set_param(1, textured).unwrap();

    let good = tim_15bit();
    let bad = [0x10, 0, 0, 0];
    let report = engine
        .populate_tpage(&[Some(bad.as_slice()), Some(good.as_slice())])
        .unwrap();

    assert_eq!(report.textured, vec![1]);
    assert!(matches!(
        report.failed.as_slice(),
        [(0, TimError::Truncated { .. })]
    ));
    assert!(engine.params().get(0).unwrap().texture_handle().is_none());
}

#[test]
fn test_bad_texture_aborts_when_configured() {
    let mut engine = engine_with(1, |c| c.engine.texture_failure = TextureFailurePolicy::Abort);
    let sprite = PrimitiveParam::sprite(
        Vertex::new(0, 0),
        Dimensions::new(8, 8),
        Color::NEUTRAL,
        TexCoord::new(0, 0),
    );
    engine.set_param(0, sprite).unwrap();

    let mut bad = tim_15bit();
    bad[0] = 0x11;
    let err = engine.populate_tpage(&[Some(bad.as_slice())]).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Texture {
            slot: 0,
            source: TimError::BadMagic(0x11)
        }
    ));
}

#[test]
fn test_texture_pass_sorts_textured_flat_and_unset_slots() {
    let mut engine = engine(3);
    let textured = PrimitiveParam::textured_flat_quad(
        Vertex::new(0, 0),
        Dimensions::new(16, 16),
        Color::NEUTRAL,
        TexCoord::new(0, 0),
        Dimensions::new(16, 16),
    );
    engine.set_param(0, textured).unwrap();
    engine.set_param(1, flat(20, 20, 8, 8, palette(1))).unwrap();

    let blob = tim_4bit();
    let report = engine
        .populate_tpage(&[Some(blob.as_slice()), Some(blob.as_slice()), Some(blob.as_slice())])
        .unwrap();

    assert_eq!(report.textured, vec![0]);
    assert_eq!(report.ignored, vec![1, 2]);
    assert!(report.failed.is_empty());
    assert_eq!(
        engine.params().get(0).unwrap().texture_handle().map(|h| h.tpage),
        Some(0x001A)
    );
    assert_eq!(engine.params().get(1).unwrap().texture_handle(), None);
}

#[test]
fn test_texture_for_untextured_slot_is_ignored() {
    let mut engine = engine(1);
    fill_flat(&mut engine);
    engine.populate_ot();
    let before = engine.current_buffer().primitive(0).clone();

    let blob = tim_15bit();
    let report = engine.populate_tpage(&[Some(blob.as_slice())]).unwrap();
    assert_eq!(report.ignored, vec![0]);
    assert_eq!(engine.current_buffer().primitive(0), &before);
}
