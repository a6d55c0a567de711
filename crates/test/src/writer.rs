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
//! A minimal HFile writer for building test fixtures.
//!
//! Files carry data blocks, arbitrary non-data blocks, a root index and file
//! info block in the load-on-open section, and a version 2 or 3 trailer.
//! Index contents are not meaningful; only the framing is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prost::Message;

use crate::encode::write_vlong;

pub const DATA_MAGIC: &[u8; 8] = b"DATABLK*";
pub const TRAILER_MAGIC: &[u8; 8] = b"TRABLK\"$";
const ROOT_INDEX_MAGIC: &[u8; 8] = b"IDXROOT2";
const FILE_INFO_MAGIC: &[u8; 8] = b"FILEINF2";

const TRAILER_SIZE_V2: usize = 212;
const TRAILER_SIZE_V3: usize = 4096;
const COMPARATOR_NAME_SIZE: usize = 128;

const CODEC_SNAPPY: u32 = 3;
pub const CODEC_NONE: u32 = 2;

/// One `[key len][value len][key][value][memstore ts]` cell, the key
/// starting with the row key and its 16-bit length.
pub fn encode_entry(row_key: &[u8], key_suffix: &[u8], value: &[u8], timestamp: i64) -> Vec<u8> {
    let key_len = 2 + row_key.len() + key_suffix.len();
    let mut out = Vec::with_capacity(8 + key_len + value.len() + 9);
    out.extend((key_len as i32).to_be_bytes());
    out.extend((value.len() as i32).to_be_bytes());
    out.extend((row_key.len() as i16).to_be_bytes());
    out.extend_from_slice(row_key);
    out.extend_from_slice(key_suffix);
    out.extend_from_slice(value);
    out.extend(write_vlong(timestamp));
    out
}

/// Hadoop `BlockCompressorStream` framing: groups of up to two chunks of
/// `chunk_size` raw bytes, each group prefixed with its raw length and each
/// chunk with its compressed length.
pub fn hadoop_snappy_compress(data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut encoder = snap::raw::Encoder::new();
    let mut out = Vec::new();
    for group in data.chunks(chunk_size * 2) {
        out.extend((group.len() as u32).to_be_bytes());
        for chunk in group.chunks(chunk_size) {
            let compressed = encoder
                .compress_vec(chunk)
                .expect("snappy compression of test data");
            out.extend((compressed.len() as u32).to_be_bytes());
            out.extend(compressed);
        }
    }
    out
}

#[derive(Clone, PartialEq, Message)]
struct TrailerMessage {
    #[prost(uint64, optional, tag = "1")]
    file_info_offset: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    load_on_open_data_offset: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    uncompressed_data_index_size: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    total_uncompressed_bytes: Option<u64>,
    #[prost(uint32, optional, tag = "5")]
    data_index_count: Option<u32>,
    #[prost(uint32, optional, tag = "6")]
    meta_index_count: Option<u32>,
    #[prost(uint64, optional, tag = "7")]
    entry_count: Option<u64>,
    #[prost(uint32, optional, tag = "8")]
    num_data_index_levels: Option<u32>,
    #[prost(uint64, optional, tag = "9")]
    first_data_block_offset: Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    last_data_block_offset: Option<u64>,
    #[prost(string, optional, tag = "11")]
    comparator_class_name: Option<String>,
    #[prost(uint32, optional, tag = "12")]
    compression_codec: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerFields {
    pub file_info_offset: u64,
    pub load_on_open_data_offset: u64,
    pub uncompressed_data_index_size: u64,
    pub total_uncompressed_bytes: u64,
    pub data_index_count: u32,
    pub meta_index_count: u32,
    pub entry_count: u64,
    pub num_data_index_levels: u32,
    pub first_data_block_offset: u64,
    pub last_data_block_offset: u64,
    pub comparator_class_name: String,
    pub compression_codec: u32,
}

impl Default for TrailerFields {
    fn default() -> Self {
        Self {
            file_info_offset: 0,
            load_on_open_data_offset: 0,
            uncompressed_data_index_size: 0,
            total_uncompressed_bytes: 0,
            data_index_count: 0,
            meta_index_count: 0,
            entry_count: 0,
            num_data_index_levels: 1,
            first_data_block_offset: 0,
            last_data_block_offset: 0,
            comparator_class_name: String::new(),
            compression_codec: CODEC_NONE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrailerWriter {
    major: u32,
    minor: u8,
}

impl TrailerWriter {
    pub fn v2(minor: u8) -> Self {
        Self { major: 2, minor }
    }

    pub fn v3() -> Self {
        Self { major: 3, minor: 0 }
    }

    fn version(&self) -> [u8; 4] {
        let major = self.major.to_be_bytes();
        [self.minor, major[1], major[2], major[3]]
    }

    pub fn write(&self, fields: &TrailerFields) -> Vec<u8> {
        let mut out = TRAILER_MAGIC.to_vec();
        if self.major == 2 && self.minor < 2 {
            out.extend((fields.file_info_offset as i64).to_be_bytes());
            out.extend((fields.load_on_open_data_offset as i64).to_be_bytes());
            out.extend(fields.data_index_count.to_be_bytes());
            out.extend((fields.uncompressed_data_index_size as i64).to_be_bytes());
            out.extend(fields.meta_index_count.to_be_bytes());
            out.extend((fields.total_uncompressed_bytes as i64).to_be_bytes());
            out.extend((fields.entry_count as i64).to_be_bytes());
            out.extend(fields.compression_codec.to_be_bytes());
            out.extend(fields.num_data_index_levels.to_be_bytes());
            out.extend((fields.first_data_block_offset as i64).to_be_bytes());
            out.extend((fields.last_data_block_offset as i64).to_be_bytes());
            let mut comparator = fields.comparator_class_name.as_bytes().to_vec();
            comparator.resize(COMPARATOR_NAME_SIZE, 0);
            out.extend(comparator);
            out.extend(self.version());
            assert_eq!(out.len(), TRAILER_SIZE_V2);
        } else {
            let message = TrailerMessage {
                file_info_offset: Some(fields.file_info_offset),
                load_on_open_data_offset: Some(fields.load_on_open_data_offset),
                uncompressed_data_index_size: Some(fields.uncompressed_data_index_size),
                total_uncompressed_bytes: Some(fields.total_uncompressed_bytes),
                data_index_count: Some(fields.data_index_count),
                meta_index_count: Some(fields.meta_index_count),
                entry_count: Some(fields.entry_count),
                num_data_index_levels: Some(fields.num_data_index_levels),
                first_data_block_offset: Some(fields.first_data_block_offset),
                last_data_block_offset: Some(fields.last_data_block_offset),
                comparator_class_name: Some(fields.comparator_class_name.clone()),
                compression_codec: Some(fields.compression_codec),
            };
            out.extend(message.encode_length_delimited_to_vec());
            let size = if self.major == 2 {
                TRAILER_SIZE_V2
            } else {
                TRAILER_SIZE_V3
            };
            assert!(out.len() <= size - 4, "trailer message does not fit");
            out.resize(size - 4, 0);
            out.extend(self.version());
        }
        out
    }
}

/// Major and minor version of a file being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    pub major: u32,
    pub minor: u8,
}

impl FileFormat {
    pub fn v2(minor: u8) -> Self {
        Self { major: 2, minor }
    }

    pub fn v3() -> Self {
        Self { major: 3, minor: 0 }
    }

    pub fn has_checksum(&self) -> bool {
        self.major >= 3 || self.minor >= 1
    }

    pub fn header_size(&self) -> usize {
        if self.has_checksum() {
            33
        } else {
            24
        }
    }

    fn trailer_writer(&self) -> TrailerWriter {
        if self.major == 2 {
            TrailerWriter::v2(self.minor)
        } else {
            TrailerWriter::v3()
        }
    }
}

/// Per-block overrides for producing unusual or corrupt blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockOptions {
    /// Checksum type written in the header; checksum bytes are still written.
    pub checksum_type: Option<u8>,
    /// Number of checksum bytes following the payload.
    pub checksum_bytes: Option<usize>,
    /// Uncompressed size written in the header.
    pub uncompressed_size_override: Option<usize>,
}

impl BlockOptions {
    /// Checksum type zero and no checksum bytes.
    pub fn without_checksum() -> Self {
        Self {
            checksum_type: Some(0),
            checksum_bytes: Some(0),
            uncompressed_size_override: None,
        }
    }
}

/// Where a written block landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub offset: u64,
    pub magic: [u8; 8],
    pub header_size: usize,
    pub data_size: usize,
    pub checksum_size: usize,
}

impl BlockLayout {
    pub fn is_data(&self) -> bool {
        &self.magic == DATA_MAGIC
    }

    pub fn end(&self) -> u64 {
        self.offset + (self.header_size + self.data_size + self.checksum_size) as u64
    }
}

#[derive(Debug)]
pub struct HFileWriter {
    format: FileFormat,
    codec: u32,
    bytes_per_checksum: u32,
    buf: Vec<u8>,
    layouts: Vec<BlockLayout>,
    entry_count: u64,
    total_uncompressed_bytes: u64,
}

impl HFileWriter {
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            codec: CODEC_NONE,
            bytes_per_checksum: 16384,
            buf: Vec::new(),
            layouts: Vec::new(),
            entry_count: 0,
            total_uncompressed_bytes: 0,
        }
    }

    /// Snappy (`3`) payloads are compressed; any other codec id is recorded
    /// in the trailer but the payload is stored as is.
    pub fn with_codec(mut self, codec: u32) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_bytes_per_checksum(mut self, bytes_per_checksum: u32) -> Self {
        self.bytes_per_checksum = bytes_per_checksum;
        self
    }

    pub fn block_layouts(&self) -> &[BlockLayout] {
        &self.layouts
    }

    /// Current end of file, where the next block starts.
    pub fn position(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn meta_block(&mut self, magic: &[u8; 8], payload: &[u8]) -> &mut Self {
        self.write_block(magic, payload, BlockOptions::default());
        self
    }

    pub fn data_block_raw(&mut self, payload: &[u8]) -> &mut Self {
        self.write_block(DATA_MAGIC, payload, BlockOptions::default());
        self
    }

    pub fn data_block_with(&mut self, payload: &[u8], options: BlockOptions) -> &mut Self {
        self.write_block(DATA_MAGIC, payload, options);
        self
    }

    /// A data block holding `entries`, each produced by [encode_entry].
    pub fn data_block(&mut self, entries: &[Vec<u8>]) -> &mut Self {
        self.entry_count += entries.len() as u64;
        self.data_block_raw(&entries.concat())
    }

    fn write_block(&mut self, magic: &[u8; 8], payload: &[u8], options: BlockOptions) {
        let header_size = self.format.header_size();
        let stored = if self.codec == CODEC_SNAPPY {
            hadoop_snappy_compress(payload, 1024)
        } else {
            payload.to_vec()
        };
        let checksum_size = if self.format.has_checksum() {
            options.checksum_bytes.unwrap_or_else(|| {
                let bpc = self.bytes_per_checksum.max(1) as usize;
                (header_size + stored.len()).div_ceil(bpc) * 4
            })
        } else {
            0
        };
        let uncompressed = options.uncompressed_size_override.unwrap_or(payload.len());
        let prev_block_offset = self.layouts.last().map(|l| l.offset as i64).unwrap_or(-1);
        let offset = self.position();

        self.buf.extend_from_slice(magic);
        self.buf
            .extend(((stored.len() + checksum_size) as i32).to_be_bytes());
        self.buf.extend((uncompressed as i32).to_be_bytes());
        self.buf.extend(prev_block_offset.to_be_bytes());
        if self.format.has_checksum() {
            self.buf.push(options.checksum_type.unwrap_or(1));
            self.buf.extend(self.bytes_per_checksum.to_be_bytes());
            self.buf
                .extend(((header_size + stored.len()) as i32).to_be_bytes());
        }
        self.buf.extend_from_slice(&stored);
        self.buf.extend(std::iter::repeat(0xC5).take(checksum_size));

        self.total_uncompressed_bytes += (header_size + payload.len()) as u64;
        self.layouts.push(BlockLayout {
            offset,
            magic: *magic,
            header_size,
            data_size: stored.len(),
            checksum_size,
        });
    }

    /// Append the load-on-open section and the trailer.
    pub fn finish(mut self) -> Vec<u8> {
        let data_offsets: Vec<u64> = self
            .layouts
            .iter()
            .filter(|l| l.is_data())
            .map(|l| l.offset)
            .collect();
        let load_on_open_data_offset = self.position();
        self.meta_block(ROOT_INDEX_MAGIC, &[0u8; 16]);
        let file_info_offset = self.position();
        self.meta_block(FILE_INFO_MAGIC, b"PBUF");

        let fields = TrailerFields {
            file_info_offset,
            load_on_open_data_offset,
            total_uncompressed_bytes: self.total_uncompressed_bytes,
            data_index_count: data_offsets.len() as u32,
            entry_count: self.entry_count,
            // -1 on disk when the file has no data blocks
            first_data_block_offset: data_offsets.first().copied().unwrap_or(u64::MAX),
            last_data_block_offset: data_offsets.last().copied().unwrap_or(u64::MAX),
            comparator_class_name: "org.apache.hadoop.hbase.KeyValue$KeyComparator".to_string(),
            compression_codec: self.codec,
            ..Default::default()
        };
        let trailer = self.format.trailer_writer().write(&fields);
        self.buf.extend(trailer);
        self.buf
    }

    /// Finish the file and write it to `dir/name`.
    pub fn write_file(self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, self.finish())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let mut writer = HFileWriter::new(FileFormat::v3()).with_bytes_per_checksum(16);
        writer.meta_block(b"METABLKc", b"meta");
        writer.data_block_raw(&[1u8; 40]);
        let layouts = writer.block_layouts().to_vec();
        assert_eq!(layouts[0].offset, 0);
        assert_eq!(layouts[1].offset, layouts[0].end());
        assert_eq!(layouts[1].checksum_size, (33usize + 40).div_ceil(16) * 4);
        let bytes = writer.finish();
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 3]);
    }

    #[test]
    fn test_v2_trailer_size() {
        let bytes = TrailerWriter::v2(1).write(&TrailerFields::default());
        assert_eq!(bytes.len(), TRAILER_SIZE_V2);
        assert_eq!(&bytes[..8], TRAILER_MAGIC);
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 0, 0, 2]);
    }
}
