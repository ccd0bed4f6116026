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

//! Error types for the primitive engine
//!
//! Storage, allocation, configuration and device-timeout failures are
//! propagated to the caller. Type-dispatch failures inside the frame loop are
//! logged and the affected slot keeps its previous record, so they only
//! surface as values when a caller asks for them explicitly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::params::PrimitiveType;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading a file from the storage device failed
    #[error("storage error on {}: {source}", path.display())]
    Storage {
        /// Resolved host path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The storage device could not locate the requested file
    #[error("file not found on storage: {path}")]
    NotFound {
        /// Path as requested by the caller
        path: String,
    },

    /// A session-lifetime allocation could not be satisfied
    #[error("failed to allocate {requested} {what}")]
    Allocation {
        /// What was being allocated
        what: &'static str,
        /// Number of elements requested
        requested: usize,
    },

    /// A primitive type name is not part of the dispatch table
    #[error("unrecognized primitive type '{name}' at slot {slot}")]
    UnrecognizedType {
        /// Slot index
        slot: usize,
        /// Offending type name
        name: String,
    },

    /// The packed record and the slot parameters disagree on the primitive type
    #[error("slot {slot} holds a {found} record but its parameters describe a {expected}")]
    TypeMismatch {
        /// Slot index
        slot: usize,
        /// Type described by the parameters
        expected: PrimitiveType,
        /// Type of the packed record
        found: PrimitiveType,
    },

    /// Slot index outside the ordering table
    #[error("slot {slot} out of range (ordering table has {len} slots)")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Ordering table size
        len: usize,
    },

    /// A texture for a particular slot could not be uploaded
    #[error("texture upload failed for slot {slot}: {source}")]
    Texture {
        /// Slot index
        slot: usize,
        /// Parse failure
        #[source]
        source: TimError,
    },

    /// Texture container parse failure
    #[error(transparent)]
    Tim(#[from] TimError),

    /// Memory card failure
    #[error(transparent)]
    Card(#[from] CardError),

    /// A bounded hardware wait ran out of attempts
    #[error("{operation} did not complete after {attempts} polls")]
    Timeout {
        /// Name of the operation being waited on
        operation: &'static str,
        /// Number of polls performed
        attempts: u32,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// TIM texture container errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimError {
    /// The identifier word is not 0x10
    #[error("bad TIM identifier 0x{0:08X}")]
    BadMagic(u32),

    /// The blob ended before a header or block was complete
    #[error("TIM truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// Pixel mode the GPU cannot sample from (24-bit or mixed)
    #[error("unsupported TIM pixel mode {0}")]
    UnsupportedMode(u32),

    /// Declared block length disagrees with the block rectangle
    #[error("TIM block length {declared} does not match its {width}x{height} rectangle")]
    BlockSize {
        /// Length stored in the block header
        declared: u32,
        /// Rectangle width in 16-bit units
        width: u16,
        /// Rectangle height
        height: u16,
    },
}

/// Memory card errors
#[derive(Debug, Error)]
pub enum CardError {
    /// No card answered on the port
    #[error("no memory card present")]
    NoCard,

    /// The named record could not be opened
    #[error("failed to open record '{name}'")]
    OpenFailed {
        /// Record name
        name: String,
    },

    /// A read was rejected or reported failure
    #[error("memory card read failed")]
    ReadFailed,

    /// A write was rejected or reported failure
    #[error("memory card write failed")]
    WriteFailed,

    /// Backing store error
    #[error("memory card I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
