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
//! HFile scan error types.

use std::io;

use arrow_schema::ArrowError;
use thiserror::Error;

use crate::schema::ColumnType;

pub type Result<T, E = HFileError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum HFileError {
    #[error("Corrupt HFile trailer: {0}")]
    CorruptTrailer(String),

    #[error("Stream IO error: {0}")]
    StreamIO(#[from] io::Error),

    #[error("Unsupported compression codec: {0}")]
    UnsupportedCompression(u32),

    #[error("Decompression error: {0}")]
    DecompressionError(String),

    #[error("Corrupt HFile block: {0}")]
    CorruptBlock(String),

    #[error("Malformed key-value entry: {0}")]
    MalformedEntry(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedType(ColumnType),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Protobuf decode error: {0}")]
    ProtobufError(#[from] prost::DecodeError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("Scan cancelled")]
    Cancelled,
}

impl HFileError {
    /// Cancellation is a cooperative stop, not a sign of a corrupt file.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HFileError::Cancelled)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        HFileError::MalformedEntry(msg.into())
    }

    pub(crate) fn corrupt_block(msg: impl Into<String>) -> Self {
        HFileError::CorruptBlock(msg.into())
    }
}
