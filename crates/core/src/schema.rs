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
//! Table schema as seen by the scanner.
//!
//! A table's columns are ordered as: clustering (partition) columns, which are
//! not stored in the file, followed by the row-key columns and then the value
//! columns. Where the key columns end is only known after decoding a row key,
//! see [`crate::encoding::sortable::count_key_columns`].

use std::sync::Arc;

use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef, TimeUnit};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::Result;

/// Primitive column types a table may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ColumnType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    String,
    /// Declared by tables but not decodable from HFile rows.
    Timestamp,
    /// Declared by tables but not decodable from HFile rows.
    Binary,
}

impl ColumnType {
    pub fn arrow_data_type(&self) -> DataType {
        match self {
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::TinyInt => DataType::Int8,
            ColumnType::SmallInt => DataType::Int16,
            ColumnType::Int => DataType::Int32,
            ColumnType::BigInt => DataType::Int64,
            ColumnType::Float => DataType::Float32,
            ColumnType::Double => DataType::Float64,
            ColumnType::String => DataType::Utf8,
            ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
            ColumnType::Binary => DataType::Binary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<Column>,
    num_clustering_cols: usize,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>, num_clustering_cols: usize) -> Result<Self> {
        if num_clustering_cols > columns.len() {
            return Err(ArrowError::SchemaError(format!(
                "{} clustering columns declared for a table of {} columns",
                num_clustering_cols,
                columns.len()
            ))
            .into());
        }
        Ok(Self {
            columns,
            num_clustering_cols,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_clustering_cols(&self) -> usize {
        self.num_clustering_cols
    }

    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).map(|c| c.column_type)
    }

    /// Types of the columns stored in the file: key columns then value columns.
    pub fn stored_column_types(&self) -> Vec<ColumnType> {
        self.columns[self.num_clustering_cols..]
            .iter()
            .map(|c| c.column_type)
            .collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Columns materialized by a scan. Slot `i` of an output row holds the
/// column at `columns[i]`; every other column is parsed and discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanProjection {
    columns: Vec<usize>,
}

impl ScanProjection {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    /// Projection materializing nothing, as used by row-count-only scans.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all(schema: &TableSchema) -> Self {
        Self::new((0..schema.num_columns()).collect())
    }

    pub fn from_names(schema: &TableSchema, names: &[&str]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                schema.index_of(name).ok_or_else(|| {
                    ArrowError::SchemaError(format!("Column '{name}' not found in table schema"))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(columns))
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn num_slots(&self) -> usize {
        self.columns.len()
    }

    /// Output slot of a table column, if the column is materialized.
    pub fn slot_for(&self, column: usize) -> Option<usize> {
        self.columns.iter().position(|&c| c == column)
    }

    pub fn arrow_schema(&self, schema: &TableSchema) -> Result<SchemaRef> {
        let fields = self
            .columns
            .iter()
            .map(|&index| -> Result<Field> {
                let column = schema.columns().get(index).ok_or_else(|| {
                    ArrowError::SchemaError(format!("Projected column {index} is out of range"))
                })?;
                Ok(Field::new(
                    &column.name,
                    column.column_type.arrow_data_type(),
                    true,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arc::new(Schema::new(fields)))
    }
}
