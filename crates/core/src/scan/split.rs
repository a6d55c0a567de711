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
//! Planning the initial scan ranges of a set of files.
//!
//! Nothing about a file can be decoded before its trailer is known, so a
//! scan starts with just one small range per file: the tail holding the
//! trailer. Processing that range publishes the trailer and schedules the
//! range covering the data blocks.

use std::collections::VecDeque;

use crate::hfile::trailer::HFileTrailer;
use crate::storage::ScanRange;

/// A file and the splits it was divided into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDesc {
    pub path: String,
    pub length: u64,
    pub splits: Vec<ScanRange>,
}

impl FileDesc {
    /// A file scanned as a single split.
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        let path = path.into();
        let splits = vec![ScanRange::new(path.clone(), 0, length)];
        Self {
            path,
            length,
            splits,
        }
    }

    /// A file divided into splits of at most `split_size` bytes.
    pub fn with_split_size(path: impl Into<String>, length: u64, split_size: u64) -> Self {
        let path = path.into();
        let split_size = split_size.max(1);
        let splits = (0..length.div_ceil(split_size).max(1))
            .map(|i| {
                let offset = i * split_size;
                ScanRange::new(path.clone(), offset, split_size.min(length - offset))
            })
            .collect();
        Self {
            path,
            length,
            splits,
        }
    }
}

/// Receives ranges discovered while scanning.
pub trait SplitScheduler {
    fn enqueue(&mut self, range: ScanRange);
}

impl SplitScheduler for Vec<ScanRange> {
    fn enqueue(&mut self, range: ScanRange) {
        self.push(range);
    }
}

impl SplitScheduler for VecDeque<ScanRange> {
    fn enqueue(&mut self, range: ScanRange) {
        self.push_back(range);
    }
}

/// The initial work for a set of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialRanges {
    /// Trailer ranges to scan.
    pub ranges: Vec<ScanRange>,
    /// Splits that need no scanning of their own.
    pub completed: Vec<ScanRange>,
}

/// The range holding the trailer: the last `max_trailer_size` bytes, or the
/// whole file if it is shorter.
pub fn trailer_range(path: &str, file_len: u64, max_trailer_size: usize) -> ScanRange {
    let offset = file_len.saturating_sub(max_trailer_size as u64);
    ScanRange::new(path, offset, file_len - offset)
}

/// The range from the first data block to the end of the file.
pub fn data_range(path: &str, file_len: u64, trailer: &HFileTrailer) -> ScanRange {
    let offset = trailer.first_data_block_offset.min(file_len);
    ScanRange::new(path, offset, file_len - offset)
}

/// Only the split starting at offset zero of each file issues work, the
/// trailer range of that file. Every other split is reported complete.
pub fn initial_ranges(files: &[FileDesc], max_trailer_size: usize) -> InitialRanges {
    let mut initial = InitialRanges::default();
    for file in files {
        for split in &file.splits {
            if split.offset == 0 {
                initial
                    .ranges
                    .push(trailer_range(&file.path, file.length, max_trailer_size));
            } else {
                initial.completed.push(split.clone());
            }
        }
    }
    initial
}
