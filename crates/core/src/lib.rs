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
//! Streaming scanner for HFiles holding Hive-encoded table rows.
//!
//! Each entry of an HFile is one table row: the row key carries the key
//! columns in an order-preserving encoding and the value carries the
//! remaining columns behind per-group null bitmaps. This crate walks the
//! data blocks of a file, splits them into entries and decodes both parts
//! into typed rows.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use hfile_scan_core::config::HFileConfigs;
//! use hfile_scan_core::scan::{scan_files, ArrowBatchSink, FileDesc, ScanControl};
//! use hfile_scan_core::schema::{Column, ColumnType, ScanProjection, TableSchema};
//!
//! let schema = Arc::new(TableSchema::new(
//!     vec![Column::new("id", ColumnType::Int), Column::new("name", ColumnType::String)],
//!     0,
//! )?);
//! let projection = ScanProjection::all(&schema);
//! let mut sink = ArrowBatchSink::try_new(&schema, &projection, 1024)?;
//! let files = [FileDesc::new("/data/part-0.hfile", 1 << 20)];
//! scan_files(&files, schema, &projection, &HFileConfigs::empty(), &ScanControl::new(), &mut sink)?;
//! ```

pub mod config;
pub mod encoding;
pub mod expr;
pub mod hfile;
pub mod row;
pub mod scan;
pub mod schema;
pub mod storage;

pub use hfile::error::{HFileError, Result};
