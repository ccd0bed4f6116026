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

//! Input/update loop: selection, recolor, movement bounds

use proptest::prelude::*;

use super::*;
use crate::core::controller::{InputSource, PadButtons, VirtualPad, NO_PAD};

fn held(buttons: PadButtons) -> VirtualPad {
    let mut pad = VirtualPad::new();
    pad.press(buttons);
    pad
}

fn run(engine: &mut Engine<HeadlessGpu>, pad: &mut VirtualPad, frames: usize) {
    for _ in 0..frames {
        engine.run_frame(pad).unwrap();
    }
}

fn ready(slots: usize) -> Engine<HeadlessGpu> {
    let mut engine = engine(slots);
    fill_flat(&mut engine);
    engine.populate_ot();
    engine
}

#[test]
fn test_circle_is_debounced() {
    let mut engine = ready(3);
    let mut pad = held(PadButtons::CIRCLE);

    run(&mut engine, &mut pad, 1);
    assert_eq!(engine.selected_slot(), 1);
    run(&mut engine, &mut pad, 60);
    assert_eq!(engine.selected_slot(), 1);
    run(&mut engine, &mut pad, 1);
    assert_eq!(engine.selected_slot(), 2);
}

#[test]
fn test_selection_wraps() {
    let mut engine = ready(2);
    let mut pad = held(PadButtons::CIRCLE);
    run(&mut engine, &mut pad, 62);
    assert_eq!(engine.selected_slot(), 0);
}

#[test]
fn test_cross_recolors_selected_slot() {
    let mut engine = ready(2);
    let mut pad = held(PadButtons::CROSS);
    run(&mut engine, &mut pad, 1);

    let color = engine.params().get(0).unwrap().color0();
    assert_ne!(color, palette(0));
    assert_eq!(engine.params().get(1).unwrap().color0(), palette(1));

    // The partial update wrote it into the buffer being built
    let rgb = engine.current_buffer().primitive(0).words()[0] & 0x00FF_FFFF;
    assert_eq!(rgb, color.to_u32());
}

#[test]
fn test_same_seed_same_colors() {
    let colors = |seed: u64| {
        let mut engine = engine_with(1, |c| c.engine.seed = seed);
        fill_flat(&mut engine);
        engine.populate_ot();
        let mut pad = held(PadButtons::CROSS);
        run(&mut engine, &mut pad, 1);
        engine.params().get(0).unwrap().color0()
    };
    assert_eq!(colors(7), colors(7));
}

#[test]
fn test_move_right_stops_at_screen_edge() {
    let mut engine = ready(1);
    let mut pad = held(PadButtons::RIGHT | PadButtons::DOWN);
    run(&mut engine, &mut pad, 400);

    let param = engine.params().get(0).unwrap();
    assert_eq!(param.origin, Vertex::new(299, 219));
    assert!(param.origin.x as i32 + param.size.w as i32 <= 319);
}

#[test]
fn test_move_left_stops_at_zero() {
    let mut engine = ready(1);
    let mut pad = held(PadButtons::LEFT | PadButtons::UP);
    run(&mut engine, &mut pad, 5);
    assert_eq!(engine.params().get(0).unwrap().origin, Vertex::new(0, 0));
}

#[test]
fn test_moves_apply_to_selected_slot_only() {
    let mut engine = ready(3);
    let mut pad = held(PadButtons::CIRCLE);
    run(&mut engine, &mut pad, 1);

    pad.release_all();
    pad.press(PadButtons::DOWN);
    run(&mut engine, &mut pad, 3);

    assert_eq!(engine.params().get(1).unwrap().origin, Vertex::new(10, 13));
    assert_eq!(engine.params().get(0).unwrap().origin, Vertex::new(0, 0));
    let xy = engine.current_buffer().primitive(1).words()[1];
    assert_eq!(xy, Vertex::new(10, 13).to_u32());
}

#[test]
fn test_idle_pad_changes_nothing() {
    let mut engine = ready(2);
    let revision = engine.params().revision();
    let mut pad = VirtualPad::new();
    run(&mut engine, &mut pad, 10);
    assert_eq!(engine.params().revision(), revision);
    assert_eq!(engine.selected_slot(), 0);
}

#[test]
fn test_second_port_decoded_separately() {
    struct SecondPortOnly(VirtualPad);

    impl InputSource for SecondPortOnly {
        fn poll(&mut self, port: usize) -> [u8; 4] {
            if port == 1 {
                self.0.report()
            } else {
                NO_PAD
            }
        }
    }

    let mut engine = ready(2);
    let mut input = SecondPortOnly(held(PadButtons::CIRCLE | PadButtons::RIGHT));
    engine.poll_input(&mut input);
    engine.move_prim();

    assert!(!engine.pad(0).unwrap().is_connected());
    assert!(engine.pad(1).unwrap().buttons.circle);
    assert_eq!(engine.selected_slot(), 0);
    assert_eq!(engine.params().get(0).unwrap().origin, Vertex::new(0, 0));
}

fn direction() -> impl Strategy<Value = PadButtons> {
    prop::sample::select(vec![
        PadButtons::UP,
        PadButtons::RIGHT,
        PadButtons::DOWN,
        PadButtons::LEFT,
        PadButtons::UP | PadButtons::RIGHT,
        PadButtons::DOWN | PadButtons::LEFT,
        PadButtons::empty(),
    ])
}

proptest! {
    #[test]
    fn prop_primitive_stays_on_screen(
        x in 0i16..100,
        y in 0i16..100,
        side in 1u16..120,
        moves in prop::collection::vec((direction(), 1usize..80), 1..12),
    ) {
        let mut engine = engine(1);
        engine.set_param(0, flat(x, y, side, side, Color::BLACK)).unwrap();
        engine.populate_ot();

        let mut pad = VirtualPad::new();
        for (buttons, frames) in moves {
            pad.release_all();
            pad.press(buttons);
            for _ in 0..frames {
                engine.poll_input(&mut pad);
                engine.move_prim();
            }
            let param = engine.params().get(0).unwrap();
            let (px, py) = (param.origin.x as i32, param.origin.y as i32);
            prop_assert!(px >= 0 && py >= 0);
            prop_assert!(px + (side as i32) < 320);
            prop_assert!(py + (side as i32) < 240);
        }
    }
}
