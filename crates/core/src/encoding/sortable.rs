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
//! Order-preserving ("binary sortable") row-key decoding.
//!
//! Each field is a null marker byte (`0` null, `1` present) followed, when
//! present, by an encoding whose unsigned byte order equals the natural order
//! of the value:
//!
//! | type     | encoding                                                   |
//! |----------|------------------------------------------------------------|
//! | boolean  | `1` = false, `2` = true                                    |
//! | integers | big-endian two's complement with the sign bit flipped      |
//! | floats   | IEEE-754 bits; negatives fully inverted, else sign flipped |
//! | string   | bytes `0`/`1` escaped as `1,1`/`1,2`, terminated by `0`    |

use std::borrow::Cow;

use crate::encoding::cursor::ByteCursor;
use crate::encoding::{ensure_decodable, FieldBinding};
use crate::hfile::error::{HFileError, Result};
use crate::row::{Datum, Row};
use crate::schema::ColumnType;

const NULL_MARKER: u8 = 0;
const PRESENT_MARKER: u8 = 1;

const STRING_TERMINATOR: u8 = 0;
const STRING_ESCAPE: u8 = 1;

const SIGN_FLIP_32: u32 = 1 << 31;
const SIGN_FLIP_64: u64 = 1 << 63;

/// Decode one field, writing it to `target` if one is bound.
///
/// Without a target the field is only skipped over. With `compact_data`
/// strings are always copied; otherwise an unescaped string borrows from
/// the cursor's buffer.
pub fn decode_field<'a>(
    cursor: &mut ByteCursor<'a>,
    column_type: ColumnType,
    target: Option<&mut Datum<'a>>,
    compact_data: bool,
) -> Result<()> {
    ensure_decodable(column_type)?;

    let marker = cursor.read_u8()?;
    match marker {
        NULL_MARKER => {
            if let Some(target) = target {
                *target = Datum::Null;
            }
            return Ok(());
        }
        PRESENT_MARKER => {}
        other => {
            return Err(HFileError::malformed(format!(
                "Invalid null marker {} at offset {}",
                other,
                cursor.position() - 1
            )))
        }
    }

    let value = match column_type {
        ColumnType::Boolean => match cursor.read_u8()? {
            1 => Datum::Boolean(false),
            2 => Datum::Boolean(true),
            other => {
                return Err(HFileError::malformed(format!(
                    "Invalid sortable boolean byte {other}"
                )))
            }
        },
        ColumnType::TinyInt => Datum::TinyInt((cursor.read_u8()? ^ 0x80) as i8),
        ColumnType::SmallInt => {
            let [b0, b1] = cursor.read_array()?;
            Datum::SmallInt(i16::from_be_bytes([b0 ^ 0x80, b1]))
        }
        ColumnType::Int => {
            let mut bytes: [u8; 4] = cursor.read_array()?;
            bytes[0] ^= 0x80;
            Datum::Int(i32::from_be_bytes(bytes))
        }
        ColumnType::BigInt => {
            let mut bytes: [u8; 8] = cursor.read_array()?;
            bytes[0] ^= 0x80;
            Datum::BigInt(i64::from_be_bytes(bytes))
        }
        ColumnType::Float => {
            let bits = cursor.read_u32_be()?;
            let bits = if bits & SIGN_FLIP_32 == 0 {
                !bits
            } else {
                bits ^ SIGN_FLIP_32
            };
            Datum::Float(f32::from_bits(bits))
        }
        ColumnType::Double => {
            let bits = cursor.read_u64_be()?;
            let bits = if bits & SIGN_FLIP_64 == 0 {
                !bits
            } else {
                bits ^ SIGN_FLIP_64
            };
            Datum::Double(f64::from_bits(bits))
        }
        ColumnType::String => {
            let (content, decoded_len) = scan_string(cursor)?;
            if target.is_none() {
                return Ok(());
            }
            if decoded_len == content.len() {
                if compact_data {
                    Datum::String(Cow::Owned(content.to_vec()))
                } else {
                    Datum::String(Cow::Borrowed(content))
                }
            } else {
                Datum::String(Cow::Owned(unescape(content, decoded_len)))
            }
        }
        ColumnType::Timestamp | ColumnType::Binary => {
            return Err(HFileError::UnsupportedType(column_type))
        }
    };

    if let Some(target) = target {
        *target = value;
    }
    Ok(())
}

/// Advance past an escaped string and its terminator.
///
/// Returns the escaped content (terminator excluded) and its decoded length.
fn scan_string<'a>(cursor: &mut ByteCursor<'a>) -> Result<(&'a [u8], usize)> {
    let rest = cursor.rest();
    let mut i = 0;
    let mut decoded_len = 0;
    loop {
        let b = *rest.get(i).ok_or_else(|| {
            HFileError::malformed(format!(
                "Unterminated string starting at offset {}",
                cursor.position()
            ))
        })?;
        i += 1;
        if b == STRING_TERMINATOR {
            break;
        }
        if b == STRING_ESCAPE {
            match rest.get(i) {
                Some(&escaped) if escaped != 0 => i += 1,
                _ => {
                    return Err(HFileError::malformed(format!(
                        "Invalid string escape at offset {}",
                        cursor.position() + i - 1
                    )))
                }
            }
        }
        decoded_len += 1;
    }
    let content = &rest[..i - 1];
    cursor.skip(i)?;
    Ok((content, decoded_len))
}

fn unescape(content: &[u8], decoded_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(decoded_len);
    let mut bytes = content.iter();
    while let Some(&b) = bytes.next() {
        if b == STRING_ESCAPE {
            if let Some(&escaped) = bytes.next() {
                out.push(escaped - 1);
            }
        } else {
            out.push(b);
        }
    }
    out
}

/// Decode a whole row-key payload into `row`.
///
/// The payload must be consumed exactly by the declared fields.
pub fn decode_key<'a>(
    payload: &'a [u8],
    fields: &[FieldBinding],
    row: &mut Row<'a>,
    compact_data: bool,
) -> Result<()> {
    let mut cursor = ByteCursor::new(payload);
    for field in fields {
        let target = field.slot.and_then(|slot| row.slot_mut(slot));
        decode_field(&mut cursor, field.column_type, target, compact_data)?;
    }
    if !cursor.is_exhausted() {
        return Err(HFileError::malformed(format!(
            "Row key has {} unconsumed bytes after {} fields",
            cursor.remaining(),
            fields.len()
        )));
    }
    Ok(())
}

/// Count how many leading columns of `candidate_types` a row-key payload holds.
///
/// Fields are decoded without materializing until the payload is exhausted.
/// The result is the number of key columns of the file.
pub fn count_key_columns(payload: &[u8], candidate_types: &[ColumnType]) -> Result<usize> {
    let mut cursor = ByteCursor::new(payload);
    let mut count = 0;
    while !cursor.is_exhausted() {
        let column_type = candidate_types.get(count).ok_or_else(|| {
            HFileError::malformed(format!(
                "Row key holds more fields than the {} declared columns",
                candidate_types.len()
            ))
        })?;
        decode_field(&mut cursor, *column_type, None, true)?;
        count += 1;
    }
    Ok(count)
}
