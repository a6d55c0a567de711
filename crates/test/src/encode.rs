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
//! Reference encoders for the two row layouts stored in HFile entries, and
//! Hadoop's variable-length integers.

/// Hadoop `WritableUtils.writeVLong`.
pub fn write_vlong(value: i64) -> Vec<u8> {
    if (-112..=127).contains(&value) {
        return vec![value as u8];
    }
    let (magnitude, mut len) = if value < 0 {
        (!value, -120i32)
    } else {
        (value, -112i32)
    };
    let mut tmp = magnitude;
    while tmp != 0 {
        tmp >>= 8;
        len -= 1;
    }
    let mut out = vec![len as u8];
    let num_bytes = if len < -120 { -(len + 120) } else { -(len + 112) };
    for idx in (0..num_bytes).rev() {
        out.push((magnitude >> (idx * 8)) as u8);
    }
    out
}

/// Writes fields in Hive's binary sortable encoding (ascending order).
#[derive(Debug, Default, Clone)]
pub struct SortableKeyWriter {
    buf: Vec<u8>,
}

impl SortableKeyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&mut self, bytes: Option<&[u8]>) -> &mut Self {
        match bytes {
            None => self.buf.push(0),
            Some(bytes) => {
                self.buf.push(1);
                self.buf.extend_from_slice(bytes);
            }
        }
        self
    }

    pub fn boolean(&mut self, v: Option<bool>) -> &mut Self {
        self.field(v.map(|b| [if b { 2 } else { 1 }]).as_ref().map(|a| &a[..]))
    }

    pub fn tinyint(&mut self, v: Option<i8>) -> &mut Self {
        self.field(v.map(|v| [(v as u8) ^ 0x80]).as_ref().map(|a| &a[..]))
    }

    pub fn smallint(&mut self, v: Option<i16>) -> &mut Self {
        self.field(v.map(|v| flip_sign(v.to_be_bytes())).as_ref().map(|a| &a[..]))
    }

    pub fn int(&mut self, v: Option<i32>) -> &mut Self {
        self.field(v.map(|v| flip_sign(v.to_be_bytes())).as_ref().map(|a| &a[..]))
    }

    pub fn bigint(&mut self, v: Option<i64>) -> &mut Self {
        self.field(v.map(|v| flip_sign(v.to_be_bytes())).as_ref().map(|a| &a[..]))
    }

    pub fn float(&mut self, v: Option<f32>) -> &mut Self {
        let encoded = v.map(|f| {
            let bits = f.to_bits();
            let bits = if bits & (1 << 31) != 0 { !bits } else { bits ^ (1 << 31) };
            bits.to_be_bytes()
        });
        self.field(encoded.as_ref().map(|a| &a[..]))
    }

    pub fn double(&mut self, v: Option<f64>) -> &mut Self {
        let encoded = v.map(|f| {
            let bits = f.to_bits();
            let bits = if bits & (1 << 63) != 0 { !bits } else { bits ^ (1 << 63) };
            bits.to_be_bytes()
        });
        self.field(encoded.as_ref().map(|a| &a[..]))
    }

    /// Bytes `0` and `1` are escaped as `1, b + 1`; the string ends with `0`.
    pub fn string(&mut self, v: Option<&[u8]>) -> &mut Self {
        let encoded = v.map(|s| {
            let mut out = Vec::with_capacity(s.len() + 1);
            for &b in s {
                if b == 0 || b == 1 {
                    out.push(1);
                    out.push(b + 1);
                } else {
                    out.push(b);
                }
            }
            out.push(0);
            out
        });
        self.field(encoded.as_deref())
    }

    pub fn finish(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

fn flip_sign<const N: usize>(mut bytes: [u8; N]) -> [u8; N] {
    bytes[0] ^= 0x80;
    bytes
}

/// Writes fields in Hive's lazy binary encoding: a null bitmap byte before
/// every group of eight fields, and nothing for null fields.
#[derive(Debug, Default, Clone)]
pub struct LazyValueWriter {
    fields: Vec<Option<Vec<u8>>>,
}

impl LazyValueWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&mut self, bytes: Option<Vec<u8>>) -> &mut Self {
        self.fields.push(bytes);
        self
    }

    pub fn boolean(&mut self, v: Option<bool>) -> &mut Self {
        self.field(v.map(|b| vec![b as u8]))
    }

    pub fn tinyint(&mut self, v: Option<i8>) -> &mut Self {
        self.field(v.map(|v| vec![v as u8]))
    }

    pub fn smallint(&mut self, v: Option<i16>) -> &mut Self {
        self.field(v.map(|v| v.to_be_bytes().to_vec()))
    }

    pub fn int(&mut self, v: Option<i32>) -> &mut Self {
        self.field(v.map(|v| write_vlong(v as i64)))
    }

    pub fn bigint(&mut self, v: Option<i64>) -> &mut Self {
        self.field(v.map(write_vlong))
    }

    pub fn float(&mut self, v: Option<f32>) -> &mut Self {
        self.field(v.map(|f| f.to_bits().to_be_bytes().to_vec()))
    }

    pub fn double(&mut self, v: Option<f64>) -> &mut Self {
        self.field(v.map(|f| f.to_bits().to_be_bytes().to_vec()))
    }

    pub fn string(&mut self, v: Option<&[u8]>) -> &mut Self {
        self.field(v.map(|s| {
            let mut out = write_vlong(s.len() as i64);
            out.extend_from_slice(s);
            out
        }))
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for group in self.fields.chunks(8) {
            let bitmap = group
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_some())
                .fold(0u8, |acc, (i, _)| acc | (1 << i));
            out.push(bitmap);
            for bytes in group.iter().flatten() {
                out.extend_from_slice(bytes);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_vlong() {
        assert_eq!(write_vlong(0), vec![0]);
        assert_eq!(write_vlong(-112), vec![0x90]);
        assert_eq!(write_vlong(127), vec![0x7F]);
        assert_eq!(write_vlong(128), vec![0x8F, 0x80]);
        assert_eq!(write_vlong(-113), vec![0x87, 0x70]);
        assert_eq!(write_vlong(i64::MAX).len(), 9);
    }

    #[test]
    fn test_sortable_int() {
        let mut w = SortableKeyWriter::new();
        w.int(Some(1)).int(None);
        assert_eq!(w.finish(), vec![1, 0x80, 0, 0, 1, 0]);
    }

    #[test]
    fn test_lazy_bitmap() {
        let mut w = LazyValueWriter::new();
        w.bigint(Some(42));
        assert_eq!(w.finish(), vec![0b1, 42]);
    }
}
