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
//! Block type tags.

use crate::hfile::error::{HFileError, Result};

/// Length of the tag at the start of every block and trailer.
pub const MAGIC_LENGTH: usize = 8;

/// Data blocks are recognised by the first seven bytes of their tag only,
/// so both plain (`DATABLK*`) and encoded (`DATABLKE`) tags qualify.
pub const DATA_MAGIC_PREFIX_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HFileBlockType {
    Data,
    LeafIndex,
    Meta,
    IntermediateIndex,
    RootIndex,
    FileInfo,
    Trailer,
}

impl HFileBlockType {
    pub fn magic(&self) -> &'static [u8; MAGIC_LENGTH] {
        match self {
            HFileBlockType::Data => b"DATABLK*",
            HFileBlockType::LeafIndex => b"IDXLEAF2",
            HFileBlockType::Meta => b"METABLKc",
            HFileBlockType::IntermediateIndex => b"IDXINTE2",
            HFileBlockType::RootIndex => b"IDXROOT2",
            HFileBlockType::FileInfo => b"FILEINF2",
            HFileBlockType::Trailer => b"TRABLK\"$",
        }
    }

    /// Identify a block by its tag. Unknown tags yield `None`.
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        if Self::is_data_magic(magic) {
            return Some(HFileBlockType::Data);
        }
        [
            HFileBlockType::LeafIndex,
            HFileBlockType::Meta,
            HFileBlockType::IntermediateIndex,
            HFileBlockType::RootIndex,
            HFileBlockType::FileInfo,
            HFileBlockType::Trailer,
        ]
        .into_iter()
        .find(|t| magic.starts_with(t.magic()))
    }

    pub fn is_data_magic(magic: &[u8]) -> bool {
        magic.len() >= DATA_MAGIC_PREFIX_LEN
            && magic[..DATA_MAGIC_PREFIX_LEN]
                == HFileBlockType::Data.magic()[..DATA_MAGIC_PREFIX_LEN]
    }

    /// Check that `bytes` starts with this type's full tag.
    pub fn check_magic(&self, bytes: &[u8]) -> Result<()> {
        let expected = self.magic();
        match bytes.get(..MAGIC_LENGTH) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(HFileError::corrupt_block(format!(
                "Expected {} magic {:?}, found {:?}",
                self,
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(actual)
            ))),
            None => Err(HFileError::corrupt_block(format!(
                "Buffer of {} bytes is too short for a block magic",
                bytes.len()
            ))),
        }
    }
}

impl std::fmt::Display for HFileBlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HFileBlockType::Data => write!(f, "DATA"),
            HFileBlockType::LeafIndex => write!(f, "LEAF_INDEX"),
            HFileBlockType::Meta => write!(f, "META"),
            HFileBlockType::IntermediateIndex => write!(f, "INTERMEDIATE_INDEX"),
            HFileBlockType::RootIndex => write!(f, "ROOT_INDEX"),
            HFileBlockType::FileInfo => write!(f, "FILE_INFO"),
            HFileBlockType::Trailer => write!(f, "TRAILER"),
        }
    }
}
