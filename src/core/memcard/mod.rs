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

//! Memory card collaborator
//!
//! Records are fixed-length byte strings stored under a name. Every access
//! runs the same sequence:
//!
//! ```text
//! start → accept → (wait) → open → read/write → (wait) → close → stop
//! ```
//!
//! Completion is polled, but every wait is bounded: after `poll_limit`
//! busy polls the operation fails with [`EngineError::Timeout`] instead of
//! wedging the frame loop.

use std::path::PathBuf;

use super::error::{CardError, EngineError, Result};

/// How a record is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing record, read access
    Read,
    /// Record created or truncated, write access
    Write,
}

/// Completion status of the pending card operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStatus {
    /// Still in progress
    Busy,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

/// Low-level memory card driver
pub trait CardDevice {
    /// Power up the card interface
    fn start(&mut self);

    /// Start detecting a card; completion is reported by [`poll`](Self::poll)
    fn accept(&mut self) -> std::result::Result<(), CardError>;

    /// Open the named record
    fn open(&mut self, name: &str, mode: OpenMode) -> std::result::Result<(), CardError>;

    /// Start reading `len` bytes from the open record
    fn begin_read(&mut self, len: usize) -> std::result::Result<(), CardError>;

    /// Start writing `data` to the open record
    fn begin_write(&mut self, data: &[u8]) -> std::result::Result<(), CardError>;

    /// Status of the pending operation
    fn poll(&mut self) -> CardStatus;

    /// Bytes produced by the last completed read
    fn take_data(&mut self) -> Vec<u8>;

    /// Close the open record, if any
    fn close(&mut self);

    /// Power down the card interface
    fn stop(&mut self);
}

/// Record-level access with bounded waits
pub struct MemoryCard<D: CardDevice> {
    device: D,
    poll_limit: u32,
}

impl<D: CardDevice> MemoryCard<D> {
    /// Wrap a device; each wait gives up after `poll_limit` busy polls
    pub fn new(device: D, poll_limit: u32) -> Self {
        Self {
            device,
            poll_limit: poll_limit.max(1),
        }
    }

    /// The underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Read a fixed-length record
    ///
    /// # Arguments
    ///
    /// * `name` - Record name
    /// * `len` - Record length in bytes
    ///
    /// # Returns
    ///
    /// Exactly `len` bytes
    ///
    /// # Errors
    ///
    /// [`EngineError::Card`] for device failures, [`EngineError::Timeout`]
    /// if a wait runs out of polls.
    pub fn read_record(&mut self, name: &str, len: usize) -> Result<Vec<u8>> {
        self.session(|card| {
            card.device.open(name, OpenMode::Read)?;
            card.device.begin_read(len)?;
            card.wait("memory card read", CardError::ReadFailed)?;
            let data = card.device.take_data();
            if data.len() != len {
                return Err(CardError::ReadFailed.into());
            }
            log::info!("Read record '{}' ({} bytes)", name, len);
            Ok(data)
        })
    }

    /// Write a record
    ///
    /// # Errors
    ///
    /// [`EngineError::Card`] for device failures, [`EngineError::Timeout`]
    /// if a wait runs out of polls.
    pub fn write_record(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.session(|card| {
            card.device.open(name, OpenMode::Write)?;
            card.device.begin_write(data)?;
            card.wait("memory card write", CardError::WriteFailed)?;
            log::info!("Wrote record '{}' ({} bytes)", name, data.len());
            Ok(())
        })
    }

    /// Run `body` between start/accept and close/stop
    ///
    /// The device is closed and stopped on every path.
    fn session<T>(&mut self, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.device.start();
        let result = self
            .device
            .accept()
            .map_err(EngineError::from)
            .and_then(|()| self.wait("memory card accept", CardError::NoCard))
            .and_then(|()| body(self));
        self.device.close();
        self.device.stop();
        result
    }

    fn wait(&mut self, operation: &'static str, failure: CardError) -> Result<()> {
        for _ in 0..self.poll_limit {
            match self.device.poll() {
                CardStatus::Busy => continue,
                CardStatus::Done => return Ok(()),
                CardStatus::Failed => return Err(failure.into()),
            }
        }
        log::error!("{} timed out after {} polls", operation, self.poll_limit);
        Err(EngineError::Timeout {
            operation,
            attempts: self.poll_limit,
        })
    }
}

/// Memory card backed by a host directory, one file per record
///
/// Each operation reports `latency` busy polls before completing;
/// `u32::MAX` models a card that never answers.
#[derive(Debug)]
pub struct HostCard {
    dir: PathBuf,
    latency: u32,
    pending: Option<(u32, CardStatus)>,
    open: Option<(PathBuf, OpenMode)>,
    data: Vec<u8>,
}

impl HostCard {
    /// Card whose records live in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            latency: 0,
            pending: None,
            open: None,
            data: Vec::new(),
        }
    }

    /// Report `polls` busy polls before each completion
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    fn schedule(&mut self, status: CardStatus) {
        self.pending = Some((self.latency, status));
    }

    fn open_path(&self, mode: OpenMode) -> std::result::Result<&PathBuf, CardError> {
        match &self.open {
            Some((path, open_mode)) if *open_mode == mode => Ok(path),
            _ => Err(match mode {
                OpenMode::Read => CardError::ReadFailed,
                OpenMode::Write => CardError::WriteFailed,
            }),
        }
    }
}

impl CardDevice for HostCard {
    fn start(&mut self) {
        self.pending = None;
        self.data.clear();
    }

    fn accept(&mut self) -> std::result::Result<(), CardError> {
        if !self.dir.is_dir() {
            return Err(CardError::NoCard);
        }
        self.schedule(CardStatus::Done);
        Ok(())
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> std::result::Result<(), CardError> {
        let path = self.dir.join(name);
        if mode == OpenMode::Read && !path.is_file() {
            return Err(CardError::OpenFailed {
                name: name.to_string(),
            });
        }
        self.open = Some((path, mode));
        Ok(())
    }

    fn begin_read(&mut self, len: usize) -> std::result::Result<(), CardError> {
        let path = self.open_path(OpenMode::Read)?;
        let mut bytes = std::fs::read(path)?;
        let status = if bytes.len() >= len {
            bytes.truncate(len);
            CardStatus::Done
        } else {
            CardStatus::Failed
        };
        self.data = bytes;
        self.schedule(status);
        Ok(())
    }

    fn begin_write(&mut self, data: &[u8]) -> std::result::Result<(), CardError> {
        let path = self.open_path(OpenMode::Write)?;
        std::fs::write(path, data)?;
        self.schedule(CardStatus::Done);
        Ok(())
    }

    fn poll(&mut self) -> CardStatus {
        match &mut self.pending {
            Some((0, status)) => {
                let status = *status;
                self.pending = None;
                status
            }
            Some((remaining, _)) => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                CardStatus::Busy
            }
            None => CardStatus::Done,
        }
    }

    fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    fn close(&mut self) {
        self.open = None;
    }

    fn stop(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let mut card = MemoryCard::new(HostCard::new(dir.path()).with_latency(3), 10);
        card.write_record("BESLOTS", &[1, 2, 3, 4]).unwrap();
        assert_eq!(card.read_record("BESLOTS", 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(card.read_record("BESLOTS", 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_short_record_fails() {
        let dir = TempDir::new().unwrap();
        let mut card = MemoryCard::new(HostCard::new(dir.path()), 10);
        card.write_record("SHORT", &[1]).unwrap();
        assert!(matches!(
            card.read_record("SHORT", 8),
            Err(EngineError::Card(CardError::ReadFailed))
        ));
    }

    #[test]
    fn test_missing_record() {
        let dir = TempDir::new().unwrap();
        let mut card = MemoryCard::new(HostCard::new(dir.path()), 10);
        assert!(matches!(
            card.read_record("NOPE", 8),
            Err(EngineError::Card(CardError::OpenFailed { .. }))
        ));
    }

    #[test]
    fn test_no_card() {
        let dir = TempDir::new().unwrap();
        let mut card = MemoryCard::new(HostCard::new(dir.path().join("absent")), 10);
        assert!(matches!(
            card.write_record("X", &[0]),
            Err(EngineError::Card(CardError::NoCard))
        ));
    }

    #[test]
    fn test_stuck_card_times_out() {
        let dir = TempDir::new().unwrap();
        let mut card = MemoryCard::new(HostCard::new(dir.path()).with_latency(u32::MAX), 25);
        match card.write_record("X", &[0]) {
            Err(EngineError::Timeout {
                operation,
                attempts,
            }) => {
                assert_eq!(operation, "memory card accept");
                assert_eq!(attempts, 25);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(card.device().open.is_none());
    }
}
