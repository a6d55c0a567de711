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
//! Scanning HFiles into rows.
//!
//! [HFileScanner] processes one split at a time. [scan_files] drives a whole
//! set of local files through it: trailer ranges first, then the data ranges
//! they schedule.

pub mod metadata;
pub mod scanner;
pub mod sink;
pub mod split;

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::HFileConfigs;
use crate::hfile::error::Result;
use crate::schema::{ScanProjection, TableSchema};
use crate::storage::ScanRangeStream;
pub use metadata::FileMetadataRegistry;
pub use scanner::{HFileScanner, ScanControl, ScanOptions, ScanOutcome, ScanState};
pub use sink::{ArrowBatchSink, RowBatchSink};
pub use split::{initial_ranges, FileDesc, SplitScheduler};

/// Scan local files end to end, returning the number of rows produced.
///
/// Clustering columns are left null. The row limit of `control` applies to
/// each data range.
pub fn scan_files<K>(
    files: &[FileDesc],
    schema: Arc<TableSchema>,
    projection: &ScanProjection,
    configs: &HFileConfigs,
    control: &ScanControl,
    sink: &mut K,
) -> Result<u64>
where
    K: RowBatchSink + ?Sized,
{
    let options = ScanOptions::from_configs(configs);
    let registry = FileMetadataRegistry::new();
    let mut queue: VecDeque<_> = initial_ranges(files, options.max_trailer_size)
        .ranges
        .into();

    let mut rows = 0;
    while let Some(range) = queue.pop_front() {
        let mut stream = ScanRangeStream::open(range, options.compact_data)?;
        let mut scanner = HFileScanner::new(
            Arc::clone(&schema),
            projection.clone(),
            registry.clone(),
            options,
        )
        .with_control(control.clone());
        if let ScanOutcome::Completed { rows: n } =
            scanner.process_split(&mut stream, &mut queue, sink)?
        {
            rows += n;
        }
    }
    Ok(rows)
}
