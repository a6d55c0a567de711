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
//! Per-split scan driver.
//!
//! A split of an HFile is processed in one of two ways. If no trailer has
//! been published for the file yet, the split is the file's bootstrap range:
//! the trailer is parsed and published, the data range is scheduled, and no
//! rows are produced. Otherwise the data blocks are walked and every entry is
//! decoded into a row.
//!
//! How many stored columns form the row key is learned from the first entry
//! of the scan, after which every entry is decoded with the same layout.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow_schema::ArrowError;
use log::{debug, info, warn};

use crate::config::read::HFileReadConfig;
use crate::config::HFileConfigs;
use crate::encoding::sortable::count_key_columns;
use crate::encoding::ColumnLayout;
use crate::expr::filter::RowFilter;
use crate::hfile::block::BlockReader;
use crate::hfile::error::{HFileError, Result};
use crate::hfile::key::{EntryCursor, KeyValue};
use crate::hfile::trailer::{HFileTrailer, MAX_TRAILER_SIZE};
use crate::row::{Datum, Row};
use crate::scan::metadata::FileMetadataRegistry;
use crate::scan::sink::RowBatchSink;
use crate::scan::split::{data_range, SplitScheduler};
use crate::schema::{ScanProjection, TableSchema};
use crate::storage::{ByteStream, ScanRange};

/// Options resolved from [HFileConfigs].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub batch_size: usize,
    pub compact_data: bool,
    pub max_trailer_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            compact_data: true,
            max_trailer_size: MAX_TRAILER_SIZE,
        }
    }
}

impl ScanOptions {
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_configs(configs: &HFileConfigs) -> Self {
        if let Err(e) = HFileReadConfig::validate_all(configs) {
            warn!("Ignoring invalid scan option: {e}");
        }
        Self {
            batch_size: configs.get_or_default(HFileReadConfig::BatchSize).to::<usize>(),
            compact_data: configs.get_or_default(HFileReadConfig::CompactData).to::<bool>(),
            max_trailer_size: configs
                .get_or_default(HFileReadConfig::MaxTrailerSize)
                .to::<usize>(),
        }
    }
}

/// Controls shared with whoever drives the scan.
#[derive(Clone, Default)]
pub struct ScanControl {
    cancelled: Arc<AtomicBool>,
    limit: Option<u64>,
    filter: Option<Arc<dyn RowFilter + Send + Sync>>,
}

impl fmt::Debug for ScanControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanControl")
            .field("cancelled", &self.is_cancelled())
            .field("limit", &self.limit)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after this many rows have been produced.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Keep only rows accepted by `filter`.
    pub fn with_filter(mut self, filter: impl RowFilter + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Ask every scan sharing this control to stop at its next entry.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    fn limit_reached(&self, rows: u64) -> bool {
        self.limit.is_some_and(|limit| rows >= limit)
    }

    fn accepts(&self, row: &Row<'_>) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter.eval(row))
    }
}

/// What processing a split achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The split bootstrapped its file; `data_range` was scheduled.
    TrailerPublished { data_range: ScanRange },
    /// The data blocks were scanned, producing `rows` rows.
    Completed { rows: u64 },
}

/// Where a scanner is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Bootstrapping,
    /// Scanning entries, row key width not yet known.
    KeySplitUnknown,
    Steady(ColumnLayout),
    Done,
    Cancelled,
}

/// Scans one split of an HFile into a [RowBatchSink].
#[derive(Debug)]
pub struct HFileScanner {
    schema: Arc<TableSchema>,
    projection: ScanProjection,
    template: Row<'static>,
    registry: FileMetadataRegistry,
    options: ScanOptions,
    control: ScanControl,
    state: ScanState,
}

impl HFileScanner {
    pub fn new(
        schema: Arc<TableSchema>,
        projection: ScanProjection,
        registry: FileMetadataRegistry,
        options: ScanOptions,
    ) -> Self {
        let template = Row::new(projection.num_slots());
        Self {
            schema,
            projection,
            template,
            registry,
            options,
            control: ScanControl::default(),
            state: ScanState::Bootstrapping,
        }
    }

    pub fn with_control(mut self, control: ScanControl) -> Self {
        self.control = control;
        self
    }

    /// Values of the clustering columns, which are not stored in the file
    /// and are the same for every row of it.
    pub fn with_clustering_values(mut self, values: Vec<Datum<'static>>) -> Result<Self> {
        if values.len() != self.schema.num_clustering_cols() {
            return Err(ArrowError::SchemaError(format!(
                "Expected {} clustering values, got {}",
                self.schema.num_clustering_cols(),
                values.len()
            ))
            .into());
        }
        for (column, value) in values.into_iter().enumerate() {
            if let Some(slot) = self.projection.slot_for(column) {
                self.template.set(slot, value);
            }
        }
        Ok(self)
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Process the split `stream` is positioned on.
    pub fn process_split<S, Q, K>(
        &mut self,
        stream: &mut S,
        scheduler: &mut Q,
        sink: &mut K,
    ) -> Result<ScanOutcome>
    where
        S: ByteStream + ?Sized,
        Q: SplitScheduler + ?Sized,
        K: RowBatchSink + ?Sized,
    {
        match self.registry.lookup(stream.filename()) {
            None => self.bootstrap(stream, scheduler),
            Some(trailer) => self.scan_data(trailer, stream, sink),
        }
    }

    fn bootstrap<S, Q>(&mut self, stream: &mut S, scheduler: &mut Q) -> Result<ScanOutcome>
    where
        S: ByteStream + ?Sized,
        Q: SplitScheduler + ?Sized,
    {
        let buffer = stream.get_bytes(0)?;
        let file_len = stream.file_offset();
        let trailer = HFileTrailer::parse(&buffer)?;
        let trailer = self.registry.publish(stream.filename(), trailer);

        let data_range = data_range(stream.filename(), file_len, &trailer);
        info!(
            "Scheduling data range [{}, {}) of {}",
            data_range.offset,
            data_range.end(),
            data_range.path
        );
        scheduler.enqueue(data_range.clone());
        self.state = ScanState::Done;
        Ok(ScanOutcome::TrailerPublished { data_range })
    }

    fn scan_data<S, K>(
        &mut self,
        trailer: Arc<HFileTrailer>,
        stream: &mut S,
        sink: &mut K,
    ) -> Result<ScanOutcome>
    where
        S: ByteStream + ?Sized,
        K: RowBatchSink + ?Sized,
    {
        self.state = ScanState::KeySplitUnknown;
        let mut blocks = BlockReader::new(trailer);
        let mut rows = 0;
        let result = self.scan_blocks(&mut blocks, stream, sink, &mut rows);

        match result {
            Ok(()) => {
                sink.commit_rows()?;
                info!("Scanned {} rows from {}", rows, stream.filename());
                self.state = ScanState::Done;
                Ok(ScanOutcome::Completed { rows })
            }
            Err(e) => {
                let pending = sink.num_pending_rows();
                if pending > 0 {
                    if let Err(commit_err) = sink.commit_rows() {
                        warn!(
                            "{}: failed to commit {} rows after error: {}",
                            stream.filename(),
                            pending,
                            commit_err
                        );
                    }
                }
                if e.is_cancelled() {
                    info!(
                        "Scan of {} cancelled after {} rows",
                        stream.filename(),
                        rows
                    );
                    self.state = ScanState::Cancelled;
                } else {
                    warn!(
                        "Scan of {} aborted at offset {} after {} rows ({} in the last batch): {}",
                        stream.filename(),
                        stream.file_offset(),
                        rows,
                        pending,
                        e
                    );
                    self.state = ScanState::Done;
                }
                Err(e)
            }
        }
    }

    fn scan_blocks<S, K>(
        &mut self,
        blocks: &mut BlockReader,
        stream: &mut S,
        sink: &mut K,
        rows: &mut u64,
    ) -> Result<()>
    where
        S: ByteStream + ?Sized,
        K: RowBatchSink + ?Sized,
    {
        let compact_data = stream.compact_data();
        let count_only = self.projection.is_empty();
        let batch_size = self.options.batch_size.min(sink.capacity()).max(1);

        while !self.control.limit_reached(*rows) {
            let Some(block) = blocks.next_block(stream)? else {
                return Ok(());
            };
            let mut entries = EntryCursor::new(block);
            let layout = if count_only {
                None
            } else {
                if !self.resolve_layout(&entries)? {
                    continue;
                }
                let ScanState::Steady(layout) = &self.state else {
                    return Err(HFileError::malformed("Column layout unavailable"));
                };
                Some(layout)
            };

            while let Some(kv) = entries.next_entry()? {
                if self.control.is_cancelled() {
                    return Err(HFileError::Cancelled);
                }
                if self.control.limit_reached(*rows) {
                    return Ok(());
                }

                match layout {
                    None => sink.append_empty_rows(1)?,
                    Some(layout) => {
                        if !self.materialize(layout, &kv, compact_data, sink)? {
                            continue;
                        }
                    }
                }
                *rows += 1;
                if sink.num_pending_rows() >= batch_size {
                    sink.commit_rows()?;
                }
            }
        }
        Ok(())
    }

    /// Leave [ScanState::KeySplitUnknown] once a block with an entry is seen,
    /// fixing the row key width from that entry. Returns whether the layout is
    /// known.
    fn resolve_layout(&mut self, entries: &EntryCursor<'_>) -> Result<bool> {
        if matches!(self.state, ScanState::KeySplitUnknown) {
            let Some(first) = entries.clone().next_entry()? else {
                return Ok(false);
            };
            let num_key_cols =
                count_key_columns(first.row_key(), &self.schema.stored_column_types())?;
            debug!(
                "Row key holds {} of {} stored columns",
                num_key_cols,
                self.schema.num_columns() - self.schema.num_clustering_cols()
            );
            self.state = ScanState::Steady(ColumnLayout::new(
                &self.schema,
                &self.projection,
                num_key_cols,
            )?);
        }
        Ok(matches!(self.state, ScanState::Steady(_)))
    }

    /// Decode one entry and hand it to the sink if the filter accepts it.
    fn materialize<K>(
        &self,
        layout: &ColumnLayout,
        kv: &KeyValue<'_>,
        compact_data: bool,
        sink: &mut K,
    ) -> Result<bool>
    where
        K: RowBatchSink + ?Sized,
    {
        let mut row = Row::from_template(&self.template);
        layout.decode_entry(kv.row_key(), kv.value(), &mut row, compact_data)?;
        if !self.control.accepts(&row) {
            return Ok(false);
        }
        sink.append_row(&row)?;
        Ok(true)
    }
}
