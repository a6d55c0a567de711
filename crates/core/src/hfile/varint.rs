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
//! Hadoop `WritableUtils` variable-length integers.
//!
//! The first byte determines the total size:
//! - `-112..=127` (signed) is the value itself, 1 byte
//! - `-120..=-113` encodes a positive value in `-112 - first` following bytes
//! - `-128..=-121` encodes a negative value (one's complement) in
//!   `-120 - first` following bytes
//!
//! The following bytes are big-endian.

/// Total encoded size, including the first byte.
pub fn decode_vint_size(first_byte: u8) -> usize {
    let signed = first_byte as i8;
    if signed >= -112 {
        1
    } else if signed < -120 {
        (-119 - signed as i32) as usize
    } else {
        (-111 - signed as i32) as usize
    }
}

/// Whether the value encoded with this first byte is negative.
pub fn is_negative_vint(first_byte: u8) -> bool {
    let signed = first_byte as i8;
    signed < -120 || (-112..0).contains(&signed)
}

/// Read a VLong from the start of `bytes`. Returns `(value, bytes_consumed)`,
/// or `None` if `bytes` is shorter than the encoded size.
pub fn read_var_long(bytes: &[u8]) -> Option<(i64, usize)> {
    let first_byte = *bytes.first()?;
    let size = decode_vint_size(first_byte);
    if size == 1 {
        return Some((first_byte as i8 as i64, 1));
    }
    let data = bytes.get(1..size)?;
    let mut value: i64 = 0;
    for &b in data {
        value = (value << 8) | b as i64;
    }
    if is_negative_vint(first_byte) {
        Some((!value, size))
    } else {
        Some((value, size))
    }
}
