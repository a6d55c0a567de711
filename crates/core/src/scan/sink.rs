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
use std::sync::Arc;

use arrow_array::builder::{
    BooleanBuilder, Float32Builder, Float64Builder, Int16Builder, Int32Builder, Int64Builder,
    Int8Builder, StringBuilder,
};
use arrow_array::{ArrayRef, RecordBatch, RecordBatchOptions};
use arrow_schema::{ArrowError, SchemaRef};

use crate::hfile::error::{HFileError, Result};
use crate::row::{Datum, Row};
use crate::schema::{ColumnType, ScanProjection, TableSchema};

/// Destination of the rows a scan produces.
///
/// Rows are appended to a pending batch which the scan commits once it holds
/// [RowBatchSink::capacity] rows, and again at the end of the scan.
pub trait RowBatchSink {
    /// Rows a batch holds before it is committed.
    fn capacity(&self) -> usize;

    fn append_row(&mut self, row: &Row<'_>) -> Result<()>;

    /// Append rows without column values, for scans that only count rows.
    fn append_empty_rows(&mut self, count: usize) -> Result<()>;

    fn num_pending_rows(&self) -> usize;

    /// Commit the pending rows, returning how many were committed.
    fn commit_rows(&mut self) -> Result<usize>;
}

#[derive(Debug)]
enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
}

impl ColumnBuilder {
    fn new(column_type: ColumnType, capacity: usize) -> Result<Self> {
        let builder = match column_type {
            ColumnType::Boolean => Self::Boolean(BooleanBuilder::with_capacity(capacity)),
            ColumnType::TinyInt => Self::Int8(Int8Builder::with_capacity(capacity)),
            ColumnType::SmallInt => Self::Int16(Int16Builder::with_capacity(capacity)),
            ColumnType::Int => Self::Int32(Int32Builder::with_capacity(capacity)),
            ColumnType::BigInt => Self::Int64(Int64Builder::with_capacity(capacity)),
            ColumnType::Float => Self::Float32(Float32Builder::with_capacity(capacity)),
            ColumnType::Double => Self::Float64(Float64Builder::with_capacity(capacity)),
            ColumnType::String => Self::Utf8(StringBuilder::with_capacity(capacity, capacity * 16)),
            ColumnType::Timestamp | ColumnType::Binary => {
                return Err(HFileError::UnsupportedType(column_type))
            }
        };
        Ok(builder)
    }

    /// Fail unless `value` can be appended to this column.
    fn check(&self, value: &Datum<'_>, column: &str) -> Result<()> {
        let accepted = matches!(
            (self, value),
            (_, Datum::Null)
                | (Self::Boolean(_), Datum::Boolean(_))
                | (Self::Int8(_), Datum::TinyInt(_))
                | (Self::Int16(_), Datum::SmallInt(_))
                | (Self::Int32(_), Datum::Int(_))
                | (Self::Int64(_), Datum::BigInt(_))
                | (Self::Float32(_), Datum::Float(_))
                | (Self::Float64(_), Datum::Double(_))
                | (Self::Utf8(_), Datum::String(_))
        );
        if !accepted {
            return Err(ArrowError::InvalidArgumentError(format!(
                "Column '{column}' cannot hold {value:?}"
            ))
            .into());
        }
        Ok(())
    }

    /// Append a value that passed [ColumnBuilder::check].
    fn append(&mut self, value: &Datum<'_>) {
        match (self, value) {
            (Self::Boolean(b), Datum::Boolean(v)) => b.append_value(*v),
            (Self::Int8(b), Datum::TinyInt(v)) => b.append_value(*v),
            (Self::Int16(b), Datum::SmallInt(v)) => b.append_value(*v),
            (Self::Int32(b), Datum::Int(v)) => b.append_value(*v),
            (Self::Int64(b), Datum::BigInt(v)) => b.append_value(*v),
            (Self::Float32(b), Datum::Float(v)) => b.append_value(*v),
            (Self::Float64(b), Datum::Double(v)) => b.append_value(*v),
            // Hive strings are raw bytes; invalid sequences become U+FFFD.
            (Self::Utf8(b), Datum::String(bytes)) => {
                b.append_value(String::from_utf8_lossy(bytes))
            }
            (builder, _) => builder.append_null(),
        }
    }

    fn append_null(&mut self) {
        match self {
            Self::Boolean(b) => b.append_null(),
            Self::Int8(b) => b.append_null(),
            Self::Int16(b) => b.append_null(),
            Self::Int32(b) => b.append_null(),
            Self::Int64(b) => b.append_null(),
            Self::Float32(b) => b.append_null(),
            Self::Float64(b) => b.append_null(),
            Self::Utf8(b) => b.append_null(),
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Boolean(b) => Arc::new(b.finish()),
            Self::Int8(b) => Arc::new(b.finish()),
            Self::Int16(b) => Arc::new(b.finish()),
            Self::Int32(b) => Arc::new(b.finish()),
            Self::Int64(b) => Arc::new(b.finish()),
            Self::Float32(b) => Arc::new(b.finish()),
            Self::Float64(b) => Arc::new(b.finish()),
            Self::Utf8(b) => Arc::new(b.finish()),
        }
    }
}

/// Collects rows into Arrow record batches, one per commit.
#[derive(Debug)]
pub struct ArrowBatchSink {
    schema: SchemaRef,
    builders: Vec<ColumnBuilder>,
    capacity: usize,
    pending: usize,
    batches: Vec<RecordBatch>,
}

impl ArrowBatchSink {
    pub fn try_new(
        table_schema: &TableSchema,
        projection: &ScanProjection,
        capacity: usize,
    ) -> Result<Self> {
        let schema = projection.arrow_schema(table_schema)?;
        let builders = projection
            .columns()
            .iter()
            .map(|&column| {
                let column_type = table_schema.column_type(column).ok_or_else(|| {
                    ArrowError::SchemaError(format!("Projected column {column} is out of range"))
                })?;
                ColumnBuilder::new(column_type, capacity)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema,
            builders,
            capacity: capacity.max(1),
            pending: 0,
            batches: Vec::new(),
        })
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn take_batches(&mut self) -> Vec<RecordBatch> {
        std::mem::take(&mut self.batches)
    }

    pub fn num_committed_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

impl RowBatchSink for ArrowBatchSink {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn append_row(&mut self, row: &Row<'_>) -> Result<()> {
        if row.num_slots() != self.builders.len() {
            return Err(ArrowError::InvalidArgumentError(format!(
                "Row has {} slots, batch has {} columns",
                row.num_slots(),
                self.builders.len()
            ))
            .into());
        }
        for ((builder, value), field) in self
            .builders
            .iter()
            .zip(row.slots())
            .zip(self.schema.fields())
        {
            builder.check(value, field.name())?;
        }
        for (builder, value) in self.builders.iter_mut().zip(row.slots()) {
            builder.append(value);
        }
        self.pending += 1;
        Ok(())
    }

    fn append_empty_rows(&mut self, count: usize) -> Result<()> {
        if !self.builders.is_empty() {
            return Err(ArrowError::InvalidArgumentError(format!(
                "Cannot append empty rows to a batch with {} columns",
                self.builders.len()
            ))
            .into());
        }
        self.pending += count;
        Ok(())
    }

    fn num_pending_rows(&self) -> usize {
        self.pending
    }

    fn commit_rows(&mut self) -> Result<usize> {
        let rows = self.pending;
        if rows == 0 {
            return Ok(0);
        }
        let columns = self.builders.iter_mut().map(ColumnBuilder::finish).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch = RecordBatch::try_new_with_options(self.schema(), columns, &options)?;
        self.batches.push(batch);
        self.pending = 0;
        Ok(rows)
    }
}
