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
use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;

use crate::hfile::error::Result;
use crate::storage::{unexpected_eof, ByteStream, ScanRange};

/// [ByteStream] over one [ScanRange] of any seekable reader.
#[derive(Debug)]
pub struct ScanRangeStream<R> {
    reader: R,
    range: ScanRange,
    position: u64,
    compact_data: bool,
}

impl ScanRangeStream<BufReader<File>> {
    /// Open the file at `range.path` positioned at the start of the range.
    pub fn open(range: ScanRange, compact_data: bool) -> Result<Self> {
        let file = File::open(Path::new(&range.path))?;
        Self::new(BufReader::new(file), range, compact_data)
    }
}

impl ScanRangeStream<BufReader<Cursor<Bytes>>> {
    /// Stream over a file already held in memory.
    pub fn from_bytes(bytes: Bytes, range: ScanRange, compact_data: bool) -> Result<Self> {
        let reader = BufReader::with_capacity(bytes.len().max(1), Cursor::new(bytes));
        Self::new(reader, range, compact_data)
    }
}

impl<R: Read + Seek> ScanRangeStream<R> {
    pub fn new(mut reader: R, range: ScanRange, compact_data: bool) -> Result<Self> {
        reader.seek(SeekFrom::Start(range.offset))?;
        let position = range.offset;
        Ok(Self {
            reader,
            range,
            position,
            compact_data,
        })
    }

    pub fn range(&self) -> &ScanRange {
        &self.range
    }
}

impl<R: Read + Seek> ByteStream for ScanRangeStream<R> {
    fn filename(&self) -> &str {
        &self.range.path
    }

    fn file_offset(&self) -> u64 {
        self.position
    }

    fn eos(&self) -> bool {
        self.position >= self.range.end()
    }

    fn compact_data(&self) -> bool {
        self.compact_data
    }

    fn get_bytes(&mut self, max: usize) -> Result<Vec<u8>> {
        let limit = if max == 0 {
            self.range.end().saturating_sub(self.position)
        } else {
            max as u64
        };
        let mut buf = Vec::new();
        (&mut self.reader).take(limit).read_to_end(&mut buf)?;
        self.position += buf.len() as u64;
        Ok(buf)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(unexpected_eof(&self.range.path, self.position, buf.len() as u64).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn skip_bytes(&mut self, len: u64) -> Result<()> {
        let target = self.position + len;
        let end = self.reader.seek(SeekFrom::End(0))?;
        if target > end {
            self.reader.seek(SeekFrom::Start(self.position))?;
            return Err(unexpected_eof(&self.range.path, self.position, len).into());
        }
        self.reader.seek(SeekFrom::Start(target))?;
        self.position = target;
        Ok(())
    }
}
