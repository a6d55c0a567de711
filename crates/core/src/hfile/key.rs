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
//! Key-value entries of a decoded data block.
//!
//! An entry is laid out as
//! `[key length: i32][value length: i32][key][value][memstore timestamp: vlong]`
//! and its key starts with `[row key length: i16][row key]`. Whatever follows
//! the row key inside the key (column family, qualifier, timestamp, type) is
//! not needed to rebuild a row.

use std::fmt;

use crate::encoding::cursor::ByteCursor;
use crate::hfile::error::{HFileError, Result};

const SIZEOF_INT32: usize = 4;
const SIZEOF_INT16: usize = 2;

/// Bytes before the key: key length and value length.
pub const KEY_VALUE_HEADER_SIZE: usize = SIZEOF_INT32 * 2;

/// One entry, borrowed from the block it was split from.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
    key: &'a [u8],
    value: &'a [u8],
    row_key: &'a [u8],
}

impl<'a> KeyValue<'a> {
    /// Parse the entry starting at the cursor and advance past it.
    pub fn parse(cursor: &mut ByteCursor<'a>) -> Result<Self> {
        let offset = cursor.position();
        let key_length = Self::length_field(cursor, "key", offset)?;
        let value_length = Self::length_field(cursor, "value", offset)?;
        let key = cursor.take(key_length)?;
        let value = cursor.take(value_length)?;
        cursor.skip_var_long()?;

        let mut key_cursor = ByteCursor::new(key);
        let row_key_length = key_cursor.read_i16_be()?;
        let row_key = usize::try_from(row_key_length)
            .map_err(|_| {
                HFileError::malformed(format!(
                    "Negative row key length {row_key_length} in entry at offset {offset}"
                ))
            })
            .and_then(|len| key_cursor.take(len))?;

        Ok(Self {
            key,
            value,
            row_key,
        })
    }

    fn length_field(cursor: &mut ByteCursor<'_>, name: &str, offset: usize) -> Result<usize> {
        let len = cursor.read_i32_be()?;
        usize::try_from(len).map_err(|_| {
            HFileError::malformed(format!(
                "Negative {name} length {len} in entry at offset {offset}"
            ))
        })
    }

    /// The full key, row key length prefix included.
    pub fn key(&self) -> &'a [u8] {
        self.key
    }

    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// The sortable-encoded row key payload.
    pub fn row_key(&self) -> &'a [u8] {
        self.row_key
    }

    /// Bytes after the row key inside the key.
    pub fn key_suffix(&self) -> &'a [u8] {
        &self.key[SIZEOF_INT16 + self.row_key.len()..]
    }
}

impl fmt::Debug for KeyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeyValue{{key_len={}, row_key_len={}, value_len={}}}",
            self.key.len(),
            self.row_key.len(),
            self.value.len()
        )
    }
}

/// Splits a decoded block into consecutive entries.
///
/// The entries partition the block exactly; iteration ends at the block end
/// and any overrun is reported as a malformed entry.
#[derive(Debug, Clone)]
pub struct EntryCursor<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> EntryCursor<'a> {
    pub fn new(block: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(block),
        }
    }

    /// Offset of the next entry within the block.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn next_entry(&mut self) -> Result<Option<KeyValue<'a>>> {
        if self.cursor.is_exhausted() {
            return Ok(None);
        }
        KeyValue::parse(&mut self.cursor).map(Some)
    }
}

impl<'a> Iterator for EntryCursor<'a> {
    type Item = Result<KeyValue<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
