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

//! Controller input collaborator
//!
//! The pad driver fills a 4-byte report per port every frame:
//!
//! - Byte 0: Status (0x00 = valid data, 0xFF = no pad)
//! - Byte 1: Upper nibble controller type, lower nibble reply size in halfwords
//!   (0x41 = digital pad)
//! - Byte 2: select, L3, R3, start, up, right, down, left (bits 0-7)
//! - Byte 3: L2, R2, L1, R1, triangle, circle, cross, square (bits 0-7)
//!
//! # Button Encoding
//!
//! Buttons use active-low encoding (0 = pressed, 1 = released).
//! [`PadState::decode`] converts a report once into named booleans; nothing
//! past this module looks at bit positions.

use bitflags::bitflags;

bitflags! {
    /// Pressed-button mask of one pad (active high after decoding)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PadButtons: u16 {
        /// SELECT button (bit 0)
        const SELECT = 1 << 0;
        /// L3 button (left stick press) (bit 1)
        const L3 = 1 << 1;
        /// R3 button (right stick press) (bit 2)
        const R3 = 1 << 2;
        /// START button (bit 3)
        const START = 1 << 3;
        /// D-Pad UP (bit 4)
        const UP = 1 << 4;
        /// D-Pad RIGHT (bit 5)
        const RIGHT = 1 << 5;
        /// D-Pad DOWN (bit 6)
        const DOWN = 1 << 6;
        /// D-Pad LEFT (bit 7)
        const LEFT = 1 << 7;
        /// L2 shoulder button (bit 8)
        const L2 = 1 << 8;
        /// R2 shoulder button (bit 9)
        const R2 = 1 << 9;
        /// L1 shoulder button (bit 10)
        const L1 = 1 << 10;
        /// R1 shoulder button (bit 11)
        const R1 = 1 << 11;
        /// Triangle button (bit 12)
        const TRIANGLE = 1 << 12;
        /// Circle button (bit 13)
        const CIRCLE = 1 << 13;
        /// Cross (X) button (bit 14)
        const CROSS = 1 << 14;
        /// Square button (bit 15)
        const SQUARE = 1 << 15;
    }
}

impl PadButtons {
    /// Look up a button by name, case-insensitive
    ///
    /// # Examples
    ///
    /// ```
    /// use psot::core::controller::PadButtons;
    ///
    /// assert_eq!(PadButtons::by_name("cross"), Some(PadButtons::CROSS));
    /// assert_eq!(PadButtons::by_name("Start"), Some(PadButtons::START));
    /// assert_eq!(PadButtons::by_name("turbo"), None);
    /// ```
    pub fn by_name(name: &str) -> Option<Self> {
        Self::from_name(&name.trim().to_ascii_uppercase())
    }
}

/// Controller type nibble of a digital pad
pub const DIGITAL_PAD: u8 = 0x4;

/// Decoded button state of one pad, one field per button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub select: bool,
    pub l3: bool,
    pub r3: bool,
    pub start: bool,
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
    pub l2: bool,
    pub r2: bool,
    pub l1: bool,
    pub r1: bool,
    pub triangle: bool,
    pub circle: bool,
    pub cross: bool,
    pub square: bool,
}

impl From<PadButtons> for Buttons {
    fn from(pressed: PadButtons) -> Self {
        Self {
            select: pressed.contains(PadButtons::SELECT),
            l3: pressed.contains(PadButtons::L3),
            r3: pressed.contains(PadButtons::R3),
            start: pressed.contains(PadButtons::START),
            up: pressed.contains(PadButtons::UP),
            right: pressed.contains(PadButtons::RIGHT),
            down: pressed.contains(PadButtons::DOWN),
            left: pressed.contains(PadButtons::LEFT),
            l2: pressed.contains(PadButtons::L2),
            r2: pressed.contains(PadButtons::R2),
            l1: pressed.contains(PadButtons::L1),
            r1: pressed.contains(PadButtons::R1),
            triangle: pressed.contains(PadButtons::TRIANGLE),
            circle: pressed.contains(PadButtons::CIRCLE),
            cross: pressed.contains(PadButtons::CROSS),
            square: pressed.contains(PadButtons::SQUARE),
        }
    }
}

/// Snapshot of one controller port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadState {
    /// Status byte (0x00 when the report is valid)
    pub status: u8,
    /// Controller type nibble
    pub kind: u8,
    /// Reply size nibble
    pub recv_size: u8,
    /// Pressed buttons
    pub buttons: Buttons,
}

impl Default for PadState {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl PadState {
    /// State of an empty port: nothing pressed
    pub const fn disconnected() -> Self {
        Self {
            status: 0xFF,
            kind: 0,
            recv_size: 0,
            buttons: Buttons {
                select: false,
                l3: false,
                r3: false,
                start: false,
                up: false,
                right: false,
                down: false,
                left: false,
                l2: false,
                r2: false,
                l1: false,
                r1: false,
                triangle: false,
                circle: false,
                cross: false,
                square: false,
            },
        }
    }

    /// Decode a raw port report
    ///
    /// Reports shorter than four bytes, or with a non-zero status, read as
    /// a port with nothing pressed.
    ///
    /// # Examples
    ///
    /// ```
    /// use psot::core::controller::PadState;
    ///
    /// // Circle held (bit 5 of byte 3 cleared)
    /// let pad = PadState::decode(&[0x00, 0x41, 0xFF, 0xDF]);
    /// assert!(pad.buttons.circle);
    /// assert!(!pad.buttons.cross);
    /// ```
    pub fn decode(raw: &[u8]) -> Self {
        let [status, id, lo, hi] = match raw {
            [a, b, c, d, ..] => [*a, *b, *c, *d],
            _ => return Self::disconnected(),
        };

        let pressed = if status == 0x00 {
            PadButtons::from_bits_truncate(!u16::from_le_bytes([lo, hi]))
        } else {
            PadButtons::empty()
        };

        Self {
            status,
            kind: id >> 4,
            recv_size: id & 0x0F,
            buttons: Buttons::from(pressed),
        }
    }

    /// Whether the port answered with valid data
    pub fn is_connected(&self) -> bool {
        self.status == 0x00
    }
}

/// Source of raw controller reports
pub trait InputSource {
    /// Latest report for `port` (0 or 1)
    fn poll(&mut self, port: usize) -> [u8; 4];

    /// Move on to the next frame
    fn advance(&mut self) {}
}

/// Report returned for a port with nothing plugged in
pub const NO_PAD: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];

/// Software digital pad on port 0
///
/// # Examples
///
/// ```
/// use psot::core::controller::{InputSource, PadButtons, VirtualPad};
///
/// let mut pad = VirtualPad::new();
/// pad.press(PadButtons::CROSS);
/// assert_eq!(pad.get_buttons() & PadButtons::CROSS.bits(), 0);
/// assert_eq!(pad.poll(0), [0x00, 0x41, 0xFF, 0xBF]);
/// ```
#[derive(Debug, Clone)]
pub struct VirtualPad {
    /// Button state bitfield (active low: 0 = pressed, 1 = released)
    buttons: u16,
}

impl VirtualPad {
    /// Create a pad with all buttons released
    pub fn new() -> Self {
        Self { buttons: 0xFFFF }
    }

    /// Press buttons (clear their bits)
    #[inline]
    pub fn press(&mut self, buttons: PadButtons) {
        self.buttons &= !buttons.bits();
    }

    /// Release buttons (set their bits)
    #[inline]
    pub fn release(&mut self, buttons: PadButtons) {
        self.buttons |= buttons.bits();
    }

    /// Set button state directly
    ///
    /// # Arguments
    ///
    /// * `buttons` - Buttons to change
    /// * `pressed` - true to press, false to release
    #[inline]
    pub fn set_button_state(&mut self, buttons: PadButtons, pressed: bool) {
        if pressed {
            self.press(buttons);
        } else {
            self.release(buttons);
        }
    }

    /// Release every button
    pub fn release_all(&mut self) {
        self.buttons = 0xFFFF;
    }

    /// Raw button word (active low)
    #[inline]
    pub fn get_buttons(&self) -> u16 {
        self.buttons
    }

    /// Digital pad report: status, ID, button low byte, button high byte
    pub fn report(&self) -> [u8; 4] {
        let [lo, hi] = self.buttons.to_le_bytes();
        [0x00, (DIGITAL_PAD << 4) | 0x1, lo, hi]
    }
}

impl Default for VirtualPad {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for VirtualPad {
    fn poll(&mut self, port: usize) -> [u8; 4] {
        if port == 0 {
            self.report()
        } else {
            NO_PAD
        }
    }
}
