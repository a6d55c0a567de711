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
//! Block decompression.

use snap::raw::{decompress_len, Decoder};

use crate::hfile::error::{HFileError, Result};

/// Compression codec ordinals as stored in the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionCodec {
    Lzo = 0,
    Gzip = 1,
    #[default]
    None = 2,
    Snappy = 3,
    Lz4 = 4,
    Bzip2 = 5,
    Zstd = 6,
}

impl CompressionCodec {
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(CompressionCodec::Lzo),
            1 => Ok(CompressionCodec::Gzip),
            2 => Ok(CompressionCodec::None),
            3 => Ok(CompressionCodec::Snappy),
            4 => Ok(CompressionCodec::Lz4),
            5 => Ok(CompressionCodec::Bzip2),
            6 => Ok(CompressionCodec::Zstd),
            _ => Err(HFileError::UnsupportedCompression(id)),
        }
    }

    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// The decompressor for blocks written with this codec.
    ///
    /// `None` means blocks are stored as is. Codecs other than none and
    /// Snappy are reported as unsupported.
    pub fn decompressor(&self) -> Result<Option<Box<dyn BlockDecompressor + Send>>> {
        match self {
            CompressionCodec::None => Ok(None),
            CompressionCodec::Snappy => Ok(Some(Box::new(SnappyBlockDecompressor::default()))),
            other => Err(HFileError::UnsupportedCompression(other.id())),
        }
    }
}

/// Turns one compressed block payload into its uncompressed bytes.
pub trait BlockDecompressor {
    /// Decompress `input` into `output`, replacing its contents.
    ///
    /// The result must be exactly `uncompressed_size` bytes long.
    fn process_block(
        &mut self,
        input: &[u8],
        uncompressed_size: usize,
        output: &mut Vec<u8>,
    ) -> Result<()>;
}

/// Snappy in Hadoop block framing.
///
/// The payload is a sequence of `[raw length: u32 BE]` groups, each followed
/// by `[chunk length: u32 BE][raw snappy chunk]` pairs that together expand
/// to the raw length.
pub struct SnappyBlockDecompressor {
    decoder: Decoder,
}

impl Default for SnappyBlockDecompressor {
    fn default() -> Self {
        Self {
            decoder: Decoder::new(),
        }
    }
}

impl std::fmt::Debug for SnappyBlockDecompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnappyBlockDecompressor").finish()
    }
}

fn read_frame_len(input: &[u8], pos: &mut usize) -> Result<usize> {
    let bytes = input
        .get(*pos..*pos + 4)
        .ok_or_else(|| {
            HFileError::DecompressionError(format!(
                "Truncated Snappy frame length at offset {}",
                *pos
            ))
        })?;
    *pos += 4;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
}

impl BlockDecompressor for SnappyBlockDecompressor {
    fn process_block(
        &mut self,
        input: &[u8],
        uncompressed_size: usize,
        output: &mut Vec<u8>,
    ) -> Result<()> {
        output.clear();
        output.resize(uncompressed_size, 0);

        let mut pos = 0;
        let mut produced = 0;
        while pos < input.len() {
            let raw_len = read_frame_len(input, &mut pos)?;
            let group_end = produced + raw_len;
            if group_end > uncompressed_size {
                return Err(HFileError::DecompressionError(format!(
                    "Snappy frame expands past the declared block size {uncompressed_size}"
                )));
            }
            while produced < group_end {
                let chunk_len = read_frame_len(input, &mut pos)?;
                let chunk = input.get(pos..pos + chunk_len).ok_or_else(|| {
                    HFileError::DecompressionError(format!(
                        "Snappy chunk of {} bytes at offset {} overruns the {} byte payload",
                        chunk_len,
                        pos,
                        input.len()
                    ))
                })?;
                pos += chunk_len;
                let chunk_raw_len = decompress_len(chunk)
                    .map_err(|e| HFileError::DecompressionError(e.to_string()))?;
                if produced + chunk_raw_len > group_end {
                    return Err(HFileError::DecompressionError(format!(
                        "Snappy chunk expands to {chunk_raw_len} bytes, past its frame"
                    )));
                }
                let written = self
                    .decoder
                    .decompress(chunk, &mut output[produced..produced + chunk_raw_len])
                    .map_err(|e| HFileError::DecompressionError(e.to_string()))?;
                produced += written;
                if written == 0 {
                    break;
                }
            }
        }

        if produced != uncompressed_size {
            return Err(HFileError::DecompressionError(format!(
                "Decompressed {produced} bytes, expected {uncompressed_size}"
            )));
        }
        Ok(())
    }
}
