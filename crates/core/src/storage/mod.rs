/*
 * Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */
//! Byte sources a scan reads from.

pub mod reader;

use std::io;

use crate::hfile::error::Result;
pub use reader::ScanRangeStream;

/// A contiguous byte range of one file, the unit of scan work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanRange {
    pub path: String,
    pub offset: u64,
    pub len: u64,
}

impl ScanRange {
    pub fn new(path: impl Into<String>, offset: u64, len: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            len,
        }
    }

    /// Offset one past the last byte of the range.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Sequential reader over one scan range.
///
/// Reads may continue past the end of the range up to the end of the file,
/// since a block that starts inside the range is read in full.
pub trait ByteStream {
    fn filename(&self) -> &str;

    /// Absolute file offset of the next byte to be read.
    fn file_offset(&self) -> u64;

    /// Whether the cursor has reached the end of the scan range.
    fn eos(&self) -> bool;

    /// Whether decoded values must be copied out of stream buffers instead of
    /// referencing them.
    fn compact_data(&self) -> bool;

    /// Read up to `max` bytes, stopping early at the end of the file. A `max`
    /// of zero reads the rest of the scan range.
    fn get_bytes(&mut self, max: usize) -> Result<Vec<u8>>;

    /// Fill `buf` completely or fail with an I/O error.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()>;

    fn skip_bytes(&mut self, len: u64) -> Result<()>;

    /// Read exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }
}

pub(crate) fn unexpected_eof(filename: &str, offset: u64, wanted: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("{filename}: need {wanted} bytes at offset {offset}, reached end of file"),
    )
}
