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
//! HFile container format.
//!
//! An HFile is a sequence of blocks followed by a trailer. Only data blocks
//! matter for a full scan: they are read front to back, and index, meta and
//! file-info blocks between or after them are skipped by their on-disk size.
//!
//! See [the HFile format](https://hbase.apache.org/book.html#_hfile_format_2).

pub mod block;
pub mod block_type;
pub mod compression;
pub mod error;
pub mod key;
pub mod proto;
pub mod trailer;
pub mod varint;

pub use block::{BlockHeader, BlockReader};
pub use block_type::HFileBlockType;
pub use compression::{BlockDecompressor, CompressionCodec, SnappyBlockDecompressor};
pub use error::{HFileError, Result};
pub use key::{EntryCursor, KeyValue};
pub use trailer::{HFileTrailer, MAX_TRAILER_SIZE};
