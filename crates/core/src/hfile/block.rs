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
//! Sequential data block reading.

use std::sync::Arc;

use log::debug;

use crate::encoding::cursor::ByteCursor;
use crate::hfile::block_type::{HFileBlockType, MAGIC_LENGTH};
use crate::hfile::compression::{BlockDecompressor, CompressionCodec};
use crate::hfile::error::{HFileError, Result};
use crate::hfile::trailer::{HFileTrailer, HEADER_SIZE_NO_CHECKSUM};
use crate::storage::ByteStream;

/// Parsed block header.
///
/// Headers written without checksum support carry no checksum fields; for
/// those the checksum type is zero and the on-disk data size is derived from
/// the on-disk size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub magic: [u8; MAGIC_LENGTH],
    pub on_disk_size_without_header: usize,
    pub uncompressed_size_without_header: usize,
    pub prev_block_offset: i64,
    pub checksum_type: u8,
    pub bytes_per_checksum: u32,
    pub on_disk_data_size_with_header: usize,
}

fn size_field(cursor: &mut ByteCursor<'_>, name: &str) -> Result<usize> {
    let value = cursor.read_i32_be()?;
    usize::try_from(value)
        .map_err(|_| HFileError::corrupt_block(format!("Negative {name} in block header: {value}")))
}

impl BlockHeader {
    /// Parse a header laid out as `trailer`'s version dictates.
    pub fn parse(bytes: &[u8], trailer: &HFileTrailer) -> Result<Self> {
        let header_size = trailer.header_size();
        if bytes.len() < header_size {
            return Err(HFileError::corrupt_block(format!(
                "Block header needs {} bytes, got {}",
                header_size,
                bytes.len()
            )));
        }
        let mut cursor = ByteCursor::new(&bytes[..header_size]);
        let magic = cursor.read_array()?;
        let on_disk_size_without_header = size_field(&mut cursor, "on-disk size")?;
        let uncompressed_size_without_header = size_field(&mut cursor, "uncompressed size")?;
        let prev_block_offset = i64::from_be_bytes(cursor.read_array()?);

        let (checksum_type, bytes_per_checksum, on_disk_data_size_with_header) =
            if trailer.has_checksum() {
                (
                    cursor.read_u8()?,
                    cursor.read_u32_be()?,
                    size_field(&mut cursor, "on-disk data size")?,
                )
            } else {
                (0, 0, on_disk_size_without_header + HEADER_SIZE_NO_CHECKSUM)
            };

        Ok(Self {
            magic,
            on_disk_size_without_header,
            uncompressed_size_without_header,
            prev_block_offset,
            checksum_type,
            bytes_per_checksum,
            on_disk_data_size_with_header,
        })
    }

    pub fn is_data_block(&self) -> bool {
        HFileBlockType::is_data_magic(&self.magic)
    }

    /// Size of the stored (possibly compressed) payload.
    pub fn on_disk_data_size_without_header(&self, header_size: usize) -> Result<usize> {
        self.on_disk_data_size_with_header
            .checked_sub(header_size)
            .ok_or_else(|| {
                HFileError::corrupt_block(format!(
                    "On-disk data size {} is smaller than the {} byte header",
                    self.on_disk_data_size_with_header, header_size
                ))
            })
    }

    /// Trailing checksum bytes following the payload.
    pub fn checksum_size(&self, header_size: usize) -> Result<usize> {
        let data_size = self.on_disk_data_size_without_header(header_size)?;
        self.on_disk_size_without_header
            .checked_sub(data_size)
            .ok_or_else(|| {
                HFileError::corrupt_block(format!(
                    "Payload of {} bytes exceeds the on-disk block size {}",
                    data_size, self.on_disk_size_without_header
                ))
            })
    }
}

/// Walks the data blocks of a file, skipping every other block type, and
/// exposes each one's uncompressed bytes.
///
/// Reading stops once a header starts past the trailer's last data block
/// offset. Decoded bytes live in buffers owned by the reader and are reused
/// from block to block.
pub struct BlockReader {
    trailer: Arc<HFileTrailer>,
    decompressor: Option<Box<dyn BlockDecompressor + Send>>,
    header_buf: Vec<u8>,
    payload: Vec<u8>,
    decompressed: Vec<u8>,
    block_is_compressed: bool,
    block_len: usize,
    pending_checksum_bytes: u64,
    finished: bool,
}

impl std::fmt::Debug for BlockReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockReader")
            .field("block_len", &self.block_len)
            .field("pending_checksum_bytes", &self.pending_checksum_bytes)
            .field("finished", &self.finished)
            .finish()
    }
}

impl BlockReader {
    pub fn new(trailer: Arc<HFileTrailer>) -> Self {
        let header_size = trailer.header_size();
        Self {
            trailer,
            decompressor: None,
            header_buf: vec![0; header_size],
            payload: Vec::new(),
            decompressed: Vec::new(),
            block_is_compressed: false,
            block_len: 0,
            pending_checksum_bytes: 0,
            finished: false,
        }
    }

    /// Use `decompressor` for compressed blocks instead of the codec default.
    pub fn with_decompressor(
        trailer: Arc<HFileTrailer>,
        decompressor: Box<dyn BlockDecompressor + Send>,
    ) -> Self {
        let mut reader = Self::new(trailer);
        reader.decompressor = Some(decompressor);
        reader
    }

    pub fn trailer(&self) -> &HFileTrailer {
        &self.trailer
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The most recently returned block.
    pub fn block(&self) -> &[u8] {
        if self.block_is_compressed {
            &self.decompressed[..self.block_len]
        } else {
            &self.payload[..self.block_len]
        }
    }

    /// Advance to the next data block, returning its uncompressed bytes, or
    /// `None` once the data blocks are exhausted.
    pub fn next_block<S: ByteStream + ?Sized>(&mut self, stream: &mut S) -> Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }
        let header_size = self.trailer.header_size();

        let header = loop {
            if self.pending_checksum_bytes > 0 {
                stream.skip_bytes(self.pending_checksum_bytes)?;
                self.pending_checksum_bytes = 0;
            }
            if stream.eos() {
                debug!(
                    "{}: scan range ends at offset {}",
                    stream.filename(),
                    stream.file_offset()
                );
                self.finished = true;
                return Ok(None);
            }

            stream.read_into(&mut self.header_buf)?;
            let block_offset = stream.file_offset() - header_size as u64;
            if block_offset > self.trailer.last_data_block_offset {
                debug!(
                    "{}: no data blocks past offset {}",
                    stream.filename(),
                    self.trailer.last_data_block_offset
                );
                self.finished = true;
                return Ok(None);
            }

            let header = BlockHeader::parse(&self.header_buf, &self.trailer)?;
            if header.is_data_block() {
                break header;
            }
            debug!(
                "{}: skipping {} block of {} bytes at offset {}",
                stream.filename(),
                HFileBlockType::from_magic(&header.magic)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(&header.magic).into_owned()),
                header.on_disk_size_without_header,
                block_offset
            );
            stream.skip_bytes(header.on_disk_size_without_header as u64)?;
        };

        let data_size = header.on_disk_data_size_without_header(header_size)?;
        let checksum_size = header.checksum_size(header_size)?;
        let uncompressed_size = header.uncompressed_size_without_header;

        let codec = self.trailer.codec()?;
        if codec != CompressionCodec::None && self.decompressor.is_none() {
            self.decompressor = codec.decompressor()?;
        }

        self.payload.resize(data_size, 0);
        stream.read_into(&mut self.payload)?;

        match (codec, self.decompressor.as_mut()) {
            (CompressionCodec::None, _) => {
                if header.on_disk_size_without_header != uncompressed_size + checksum_size {
                    return Err(HFileError::corrupt_block(format!(
                        "Uncompressed block stores {} bytes but declares {} plus {} checksum bytes",
                        header.on_disk_size_without_header, uncompressed_size, checksum_size
                    )));
                }
                self.block_is_compressed = false;
            }
            (_, Some(decompressor)) => {
                decompressor.process_block(
                    &self.payload,
                    uncompressed_size,
                    &mut self.decompressed,
                )?;
                self.block_is_compressed = true;
            }
            (other, None) => return Err(HFileError::UnsupportedCompression(other.id())),
        }

        if header.checksum_type != 0 {
            self.pending_checksum_bytes = checksum_size as u64;
        } else if checksum_size != 0 {
            return Err(HFileError::corrupt_block(format!(
                "Block without checksums has {checksum_size} trailing checksum bytes"
            )));
        }

        self.block_len = uncompressed_size;
        Ok(Some(self.block()))
    }
}
