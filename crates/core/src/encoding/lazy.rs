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
//! Null-bitmap prefixed ("lazy binary") value decoding.
//!
//! Fields are stored in groups of eight. Each group is preceded by one bitmap
//! byte whose bit `i % 8` is set when field `i` carries a value. Null fields
//! occupy no value bytes.

use std::borrow::Cow;

use crate::encoding::cursor::ByteCursor;
use crate::encoding::{ensure_decodable, FieldBinding};
use crate::hfile::error::{HFileError, Result};
use crate::row::{Datum, Row};
use crate::schema::ColumnType;

const FIELDS_PER_BITMAP: usize = 8;

/// Reads bitmap bytes as the decoder walks through the fields.
///
/// A bitmap that would start past the end of the payload reads as all-null,
/// which lets rows written before trailing columns were added decode with
/// those columns null.
#[derive(Debug)]
struct NullBitmap {
    current: u8,
}

impl NullBitmap {
    fn start(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            current: Self::next_byte(cursor)?,
        })
    }

    fn next_byte(cursor: &mut ByteCursor<'_>) -> Result<u8> {
        if cursor.is_exhausted() {
            Ok(0)
        } else {
            cursor.read_u8()
        }
    }

    fn is_present(&self, field_index: usize) -> bool {
        self.current & (1 << (field_index % FIELDS_PER_BITMAP)) != 0
    }

    fn advance(&mut self, field_index: usize, cursor: &mut ByteCursor<'_>) -> Result<()> {
        if field_index % FIELDS_PER_BITMAP == FIELDS_PER_BITMAP - 1 {
            self.current = Self::next_byte(cursor)?;
        }
        Ok(())
    }
}

/// Decode the bytes of one present field.
pub fn decode_field<'a>(
    cursor: &mut ByteCursor<'a>,
    column_type: ColumnType,
    target: Option<&mut Datum<'a>>,
    compact_data: bool,
) -> Result<()> {
    ensure_decodable(column_type)?;

    let Some(target) = target else {
        return skip_field(cursor, column_type);
    };

    *target = match column_type {
        ColumnType::Boolean => Datum::Boolean(cursor.read_u8()? != 0),
        ColumnType::TinyInt => Datum::TinyInt(cursor.read_u8()? as i8),
        ColumnType::SmallInt => Datum::SmallInt(cursor.read_i16_be()?),
        ColumnType::Int => {
            let offset = cursor.position();
            let value = cursor.read_var_long()?;
            Datum::Int(i32::try_from(value).map_err(|_| {
                HFileError::malformed(format!(
                    "Int value {value} at offset {offset} does not fit in 32 bits"
                ))
            })?)
        }
        ColumnType::BigInt => Datum::BigInt(cursor.read_var_long()?),
        ColumnType::Float => Datum::Float(f32::from_bits(cursor.read_u32_be()?)),
        ColumnType::Double => Datum::Double(f64::from_bits(cursor.read_u64_be()?)),
        ColumnType::String => {
            let bytes = read_string(cursor)?;
            if compact_data {
                Datum::String(Cow::Owned(bytes.to_vec()))
            } else {
                Datum::String(Cow::Borrowed(bytes))
            }
        }
        ColumnType::Timestamp | ColumnType::Binary => {
            return Err(HFileError::UnsupportedType(column_type))
        }
    };
    Ok(())
}

fn skip_field(cursor: &mut ByteCursor<'_>, column_type: ColumnType) -> Result<()> {
    match column_type {
        ColumnType::Boolean | ColumnType::TinyInt => cursor.skip(1),
        ColumnType::SmallInt => cursor.skip(2),
        ColumnType::Int | ColumnType::BigInt => cursor.skip_var_long(),
        ColumnType::Float => cursor.skip(4),
        ColumnType::Double => cursor.skip(8),
        ColumnType::String => read_string(cursor).map(|_| ()),
        ColumnType::Timestamp | ColumnType::Binary => {
            Err(HFileError::UnsupportedType(column_type))
        }
    }
}

fn read_string<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8]> {
    let offset = cursor.position();
    let len = cursor.read_var_long()?;
    let len = usize::try_from(len).map_err(|_| {
        HFileError::malformed(format!("Negative string length {len} at offset {offset}"))
    })?;
    cursor.take(len)
}

/// Decode a whole value payload into `row`.
///
/// Every declared field is visited; the payload must be consumed exactly.
pub fn decode_value<'a>(
    payload: &'a [u8],
    fields: &[FieldBinding],
    row: &mut Row<'a>,
    compact_data: bool,
) -> Result<()> {
    let mut cursor = ByteCursor::new(payload);
    if fields.is_empty() {
        return ensure_consumed(&cursor, fields.len());
    }

    let mut bitmap = NullBitmap::start(&mut cursor)?;
    for (i, field) in fields.iter().enumerate() {
        let target = field.slot.and_then(|slot| row.slot_mut(slot));
        if bitmap.is_present(i) {
            decode_field(&mut cursor, field.column_type, target, compact_data)?;
        } else {
            ensure_decodable(field.column_type)?;
            if let Some(target) = target {
                *target = Datum::Null;
            }
        }
        bitmap.advance(i, &mut cursor)?;
    }
    ensure_consumed(&cursor, fields.len())
}

fn ensure_consumed(cursor: &ByteCursor<'_>, num_fields: usize) -> Result<()> {
    if cursor.is_exhausted() {
        Ok(())
    } else {
        Err(HFileError::malformed(format!(
            "Value has {} unconsumed bytes after {} fields",
            cursor.remaining(),
            num_fields
        )))
    }
}
