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
//! HFile trailer parsing.
//!
//! The trailer sits at the very end of the file. Its last four bytes hold the
//! format version (`minor` in the first byte, `major` in the remaining three),
//! and the major version decides the layout of everything before it.

use log::debug;
use prost::Message;

use crate::encoding::cursor::ByteCursor;
use crate::hfile::block_type::{HFileBlockType, MAGIC_LENGTH};
use crate::hfile::compression::CompressionCodec;
use crate::hfile::error::{HFileError, Result};
use crate::hfile::proto::TrailerProto;

/// Largest trailer of any supported version; the range read at bootstrap.
pub const MAX_TRAILER_SIZE: usize = 4096;

pub const TRAILER_SIZE_V2: usize = 212;
pub const TRAILER_SIZE_V3: usize = MAX_TRAILER_SIZE;

const VERSION_SIZE: usize = 4;
const COMPARATOR_NAME_SIZE: usize = 128;

/// First minor version whose block headers carry checksum fields.
pub const MINOR_VERSION_WITH_CHECKSUM: u32 = 1;

/// First v2 minor version whose trailer is serialized as protobuf.
pub const MINOR_VERSION_WITH_PROTO_TRAILER: u32 = 2;

/// Stored for the data block offsets of a file without data blocks.
pub const NO_DATA_BLOCK_OFFSET: u64 = u64::MAX;

/// Block header without checksum fields: magic, on-disk size, uncompressed
/// size and previous block offset.
pub const HEADER_SIZE_NO_CHECKSUM: usize = MAGIC_LENGTH + 4 + 4 + 8;

/// Block header with checksum type, bytes per checksum and on-disk data size.
pub const HEADER_SIZE_WITH_CHECKSUM: usize = HEADER_SIZE_NO_CHECKSUM + 1 + 4 + 4;

/// File-level metadata, shared read-only by every split of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HFileTrailer {
    pub major_version: u32,
    pub minor_version: u32,
    pub file_info_offset: u64,
    pub load_on_open_data_offset: u64,
    pub uncompressed_data_index_size: u64,
    pub total_uncompressed_bytes: u64,
    pub data_index_count: u32,
    pub meta_index_count: u32,
    pub entry_count: u64,
    pub num_data_index_levels: u32,
    /// [NO_DATA_BLOCK_OFFSET] when the file holds no data blocks.
    pub first_data_block_offset: u64,
    /// Offset of the start of the last data block.
    pub last_data_block_offset: u64,
    pub comparator_class_name: String,
    /// Raw codec ordinal; unknown ordinals are rejected when a block is read.
    pub compression_codec: u32,
}

impl HFileTrailer {
    /// Parse the trailer from the tail of a file.
    ///
    /// `buffer` is the last [MAX_TRAILER_SIZE] bytes of the file, or the whole
    /// file when it is shorter.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < VERSION_SIZE {
            return Err(HFileError::CorruptTrailer(format!(
                "Buffer of {} bytes cannot hold a trailer version",
                buffer.len()
            )));
        }
        let version = &buffer[buffer.len() - VERSION_SIZE..];
        let minor_version = version[0] as u32;
        let major_version =
            ((version[1] as u32) << 16) | ((version[2] as u32) << 8) | (version[3] as u32);

        let trailer_size = match major_version {
            2 => TRAILER_SIZE_V2,
            3 => TRAILER_SIZE_V3,
            _ => {
                return Err(HFileError::CorruptTrailer(format!(
                    "Unsupported HFile version {major_version}.{minor_version}"
                )))
            }
        };
        if buffer.len() < trailer_size {
            return Err(HFileError::CorruptTrailer(format!(
                "Version {} trailer needs {} bytes, only {} available",
                major_version,
                trailer_size,
                buffer.len()
            )));
        }

        let trailer_bytes = &buffer[buffer.len() - trailer_size..];
        HFileBlockType::Trailer
            .check_magic(trailer_bytes)
            .map_err(|e| HFileError::CorruptTrailer(e.to_string()))?;
        let body = &trailer_bytes[MAGIC_LENGTH..trailer_size - VERSION_SIZE];

        let trailer = if major_version == 2 && minor_version < MINOR_VERSION_WITH_PROTO_TRAILER {
            Self::parse_fixed_layout(body, major_version, minor_version).map_err(|e| match e {
                HFileError::CorruptTrailer(_) => e,
                other => HFileError::CorruptTrailer(other.to_string()),
            })?
        } else {
            Self::parse_proto(body, major_version, minor_version)?
        };
        debug!(
            "Parsed HFile v{}.{} trailer: first data block at {}, last at {}, codec {}",
            trailer.major_version,
            trailer.minor_version,
            trailer.first_data_block_offset,
            trailer.last_data_block_offset,
            trailer.compression_codec
        );
        Ok(trailer)
    }

    fn read_offset(cursor: &mut ByteCursor<'_>, name: &str) -> Result<u64> {
        let value = i64::from_be_bytes(cursor.read_array()?);
        u64::try_from(value)
            .map_err(|_| HFileError::CorruptTrailer(format!("Negative {name}: {value}")))
    }

    /// A data block offset, where `-1` marks a file without data blocks.
    fn read_block_offset(cursor: &mut ByteCursor<'_>, name: &str) -> Result<u64> {
        let value = i64::from_be_bytes(cursor.read_array()?);
        match value {
            -1 => Ok(NO_DATA_BLOCK_OFFSET),
            _ => u64::try_from(value)
                .map_err(|_| HFileError::CorruptTrailer(format!("Negative {name}: {value}"))),
        }
    }

    fn parse_fixed_layout(body: &[u8], major_version: u32, minor_version: u32) -> Result<Self> {
        let mut cursor = ByteCursor::new(body);
        let file_info_offset = Self::read_offset(&mut cursor, "file info offset")?;
        let load_on_open_data_offset = Self::read_offset(&mut cursor, "load-on-open offset")?;
        let data_index_count = cursor.read_u32_be()?;
        let uncompressed_data_index_size = Self::read_offset(&mut cursor, "data index size")?;
        let meta_index_count = cursor.read_u32_be()?;
        let total_uncompressed_bytes = Self::read_offset(&mut cursor, "total uncompressed bytes")?;
        let entry_count = Self::read_offset(&mut cursor, "entry count")?;
        let compression_codec = cursor.read_u32_be()?;
        let num_data_index_levels = cursor.read_u32_be()?;
        let first_data_block_offset =
            Self::read_block_offset(&mut cursor, "first data block offset")?;
        let last_data_block_offset =
            Self::read_block_offset(&mut cursor, "last data block offset")?;
        let comparator = cursor.take(COMPARATOR_NAME_SIZE)?;
        let comparator_len = comparator
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(comparator.len());

        Ok(Self {
            major_version,
            minor_version,
            file_info_offset,
            load_on_open_data_offset,
            uncompressed_data_index_size,
            total_uncompressed_bytes,
            data_index_count,
            meta_index_count,
            entry_count,
            num_data_index_levels,
            first_data_block_offset,
            last_data_block_offset,
            comparator_class_name: String::from_utf8_lossy(&comparator[..comparator_len])
                .into_owned(),
            compression_codec,
        })
    }

    fn parse_proto(body: &[u8], major_version: u32, minor_version: u32) -> Result<Self> {
        let proto = TrailerProto::decode_length_delimited(body)?;
        Ok(Self {
            major_version,
            minor_version,
            file_info_offset: proto.file_info_offset.unwrap_or(0),
            load_on_open_data_offset: proto.load_on_open_data_offset.unwrap_or(0),
            uncompressed_data_index_size: proto.uncompressed_data_index_size.unwrap_or(0),
            total_uncompressed_bytes: proto.total_uncompressed_bytes.unwrap_or(0),
            data_index_count: proto.data_index_count.unwrap_or(0),
            meta_index_count: proto.meta_index_count.unwrap_or(0),
            entry_count: proto.entry_count.unwrap_or(0),
            num_data_index_levels: proto.num_data_index_levels.unwrap_or(1),
            first_data_block_offset: proto.first_data_block_offset.unwrap_or(0),
            last_data_block_offset: proto.last_data_block_offset.unwrap_or(0),
            comparator_class_name: proto.comparator_class_name.unwrap_or_default(),
            compression_codec: proto
                .compression_codec
                .unwrap_or(CompressionCodec::None.id()),
        })
    }

    /// Whether block headers carry checksum fields.
    pub fn has_checksum(&self) -> bool {
        self.major_version >= 3 || self.minor_version >= MINOR_VERSION_WITH_CHECKSUM
    }

    pub fn header_size(&self) -> usize {
        if self.has_checksum() {
            HEADER_SIZE_WITH_CHECKSUM
        } else {
            HEADER_SIZE_NO_CHECKSUM
        }
    }

    pub fn codec(&self) -> Result<CompressionCodec> {
        CompressionCodec::from_id(self.compression_codec)
    }

    pub fn has_data_blocks(&self) -> bool {
        self.first_data_block_offset != NO_DATA_BLOCK_OFFSET
    }
}
