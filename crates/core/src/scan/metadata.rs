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

use dashmap::DashMap;
use log::info;

use crate::hfile::trailer::HFileTrailer;

/// Trailers of the files being scanned, keyed by file path.
///
/// Each entry is written once by the split that bootstraps the file and read
/// by every data split of it afterwards. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct FileMetadataRegistry {
    trailers: Arc<DashMap<String, Arc<HFileTrailer>>>,
}

impl FileMetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the trailer of `path`, returning the trailer now registered.
    ///
    /// If another split already published one, that trailer is kept and
    /// returned instead.
    pub fn publish(&self, path: &str, trailer: HFileTrailer) -> Arc<HFileTrailer> {
        let entry = self.trailers.entry(path.to_string()).or_insert_with(|| {
            info!(
                "Published HFile v{}.{} trailer for {}",
                trailer.major_version, trailer.minor_version, path
            );
            Arc::new(trailer)
        });
        Arc::clone(entry.value())
    }

    pub fn lookup(&self, path: &str) -> Option<Arc<HFileTrailer>> {
        self.trailers.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.trailers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trailers.is_empty()
    }
}
