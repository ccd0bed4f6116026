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

//! Video timing and region detection

use serde::{Deserialize, Serialize};

/// Offset of the region character in the BIOS image (address 0xBFC7FF52)
pub const BIOS_REGION_OFFSET: usize = 0x7_FF52;

/// Field timing standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    /// 60 fields per second
    #[default]
    Ntsc,
    /// 50 fields per second
    Pal,
}

impl VideoMode {
    /// Pick the timing from a BIOS image
    ///
    /// European BIOSes carry `'E'` at [`BIOS_REGION_OFFSET`]; anything else,
    /// including a missing or short image, selects NTSC.
    ///
    /// # Examples
    ///
    /// ```
    /// use psot::core::video::{VideoMode, BIOS_REGION_OFFSET};
    ///
    /// let mut bios = vec![0u8; 512 * 1024];
    /// assert_eq!(VideoMode::detect(Some(&bios)), VideoMode::Ntsc);
    ///
    /// bios[BIOS_REGION_OFFSET] = b'E';
    /// assert_eq!(VideoMode::detect(Some(&bios)), VideoMode::Pal);
    /// assert_eq!(VideoMode::detect(None), VideoMode::Ntsc);
    /// ```
    pub fn detect(bios: Option<&[u8]>) -> Self {
        match bios.and_then(|image| image.get(BIOS_REGION_OFFSET)) {
            Some(b'E') => VideoMode::Pal,
            _ => VideoMode::Ntsc,
        }
    }

    /// Vertical blanks per second
    pub fn frame_rate(&self) -> f64 {
        match self {
            VideoMode::Ntsc => 60.0,
            VideoMode::Pal => 50.0,
        }
    }
}
