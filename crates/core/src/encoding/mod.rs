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
//! Decoders for the two byte layouts an entry carries.
//!
//! The row key of every entry uses the order-preserving [sortable] encoding
//! and the value uses the null-bitmap [lazy] encoding. Both share the same
//! contract: decode one typed field from a [ByteCursor], writing it to a
//! destination slot if one is bound, or merely advancing past it if not.
pub mod cursor;
pub mod lazy;
pub mod sortable;

use crate::hfile::error::{HFileError, Result};
use crate::row::{Datum, Row};
use crate::schema::{ColumnType, ScanProjection, TableSchema};
pub use cursor::ByteCursor;

/// The byte layout a tuple is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleEncoding {
    SortableKey,
    LazyValue,
}

impl TupleEncoding {
    /// Decode one present-or-null field in this encoding.
    ///
    /// For [TupleEncoding::LazyValue] the null bit lives in the group bitmap,
    /// so this decodes a field already known to be present.
    pub fn decode_field<'a>(
        self,
        cursor: &mut ByteCursor<'a>,
        column_type: ColumnType,
        target: Option<&mut Datum<'a>>,
        compact_data: bool,
    ) -> Result<()> {
        match self {
            TupleEncoding::SortableKey => {
                sortable::decode_field(cursor, column_type, target, compact_data)
            }
            TupleEncoding::LazyValue => {
                lazy::decode_field(cursor, column_type, target, compact_data)
            }
        }
    }

    /// Decode a whole payload, one field per binding, requiring it to be
    /// consumed exactly.
    pub fn decode_tuple<'a>(
        self,
        payload: &'a [u8],
        fields: &[FieldBinding],
        row: &mut Row<'a>,
        compact_data: bool,
    ) -> Result<()> {
        match self {
            TupleEncoding::SortableKey => sortable::decode_key(payload, fields, row, compact_data),
            TupleEncoding::LazyValue => lazy::decode_value(payload, fields, row, compact_data),
        }
    }
}

/// A stored column paired with the row slot it materializes into, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBinding {
    pub column_type: ColumnType,
    pub slot: Option<usize>,
}

impl FieldBinding {
    pub fn new(column_type: ColumnType, slot: Option<usize>) -> Self {
        Self { column_type, slot }
    }
}

pub(crate) fn ensure_decodable(column_type: ColumnType) -> Result<()> {
    match column_type {
        ColumnType::Timestamp | ColumnType::Binary => Err(HFileError::UnsupportedType(column_type)),
        _ => Ok(()),
    }
}

/// How the stored columns of a file split between row key and value.
///
/// Built once the number of key columns is known; every entry of the file
/// is decoded with the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    num_key_cols: usize,
    key_fields: Vec<FieldBinding>,
    value_fields: Vec<FieldBinding>,
}

impl ColumnLayout {
    pub fn new(
        schema: &TableSchema,
        projection: &ScanProjection,
        num_key_cols: usize,
    ) -> Result<Self> {
        let num_clustering = schema.num_clustering_cols();
        let stored = schema.stored_column_types();
        if num_key_cols > stored.len() {
            return Err(HFileError::malformed(format!(
                "Row key holds {} columns but the schema stores only {}",
                num_key_cols,
                stored.len()
            )));
        }
        let bind = |(i, column_type): (usize, &ColumnType)| {
            FieldBinding::new(*column_type, projection.slot_for(num_clustering + i))
        };
        let mut fields = stored.iter().enumerate().map(bind);
        let key_fields = fields.by_ref().take(num_key_cols).collect();
        let value_fields = fields.collect();
        Ok(Self {
            num_key_cols,
            key_fields,
            value_fields,
        })
    }

    pub fn num_key_cols(&self) -> usize {
        self.num_key_cols
    }

    pub fn key_fields(&self) -> &[FieldBinding] {
        &self.key_fields
    }

    pub fn value_fields(&self) -> &[FieldBinding] {
        &self.value_fields
    }

    /// Decode the row-key payload and the value span of one entry into `row`.
    pub fn decode_entry<'a>(
        &self,
        row_key: &'a [u8],
        value: &'a [u8],
        row: &mut Row<'a>,
        compact_data: bool,
    ) -> Result<()> {
        TupleEncoding::SortableKey.decode_tuple(row_key, &self.key_fields, row, compact_data)?;
        TupleEncoding::LazyValue.decode_tuple(value, &self.value_fields, row, compact_data)
    }
}
