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
//! Decoded field values and output rows.

use std::borrow::Cow;
use std::cmp::Ordering;

/// A decoded field value.
///
/// Strings borrow from the decoded block buffer when the scan allows
/// non-owned results and no unescaping was needed; otherwise they own
/// their bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Datum<'a> {
    #[default]
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    String(Cow<'a, [u8]>),
}

impl<'a> Datum<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn string(s: &str) -> Datum<'static> {
        Datum::String(Cow::Owned(s.as_bytes().to_vec()))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Datum::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Whether a string value references the source buffer instead of owning a copy.
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Datum::String(Cow::Borrowed(_)))
    }

    pub fn into_owned(self) -> Datum<'static> {
        match self {
            Datum::Null => Datum::Null,
            Datum::Boolean(v) => Datum::Boolean(v),
            Datum::TinyInt(v) => Datum::TinyInt(v),
            Datum::SmallInt(v) => Datum::SmallInt(v),
            Datum::Int(v) => Datum::Int(v),
            Datum::BigInt(v) => Datum::BigInt(v),
            Datum::Float(v) => Datum::Float(v),
            Datum::Double(v) => Datum::Double(v),
            Datum::String(bytes) => Datum::String(Cow::Owned(bytes.into_owned())),
        }
    }

    /// Compares two non-null values of the same type.
    ///
    /// Returns `None` when either side is null or the types differ.
    pub fn compare(&self, other: &Datum<'_>) -> Option<Ordering> {
        match (self, other) {
            (Datum::Boolean(a), Datum::Boolean(b)) => Some(a.cmp(b)),
            (Datum::TinyInt(a), Datum::TinyInt(b)) => Some(a.cmp(b)),
            (Datum::SmallInt(a), Datum::SmallInt(b)) => Some(a.cmp(b)),
            (Datum::Int(a), Datum::Int(b)) => Some(a.cmp(b)),
            (Datum::BigInt(a), Datum::BigInt(b)) => Some(a.cmp(b)),
            (Datum::Float(a), Datum::Float(b)) => a.partial_cmp(b),
            (Datum::Double(a), Datum::Double(b)) => a.partial_cmp(b),
            (Datum::String(a), Datum::String(b)) => Some(a.as_ref().cmp(b.as_ref())),
            _ => None,
        }
    }
}

/// One output row with a slot per materialized column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row<'a> {
    slots: Vec<Datum<'a>>,
}

impl<'a> Row<'a> {
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: vec![Datum::Null; num_slots],
        }
    }

    /// A fresh row initialized from a template holding clustering values.
    pub fn from_template(template: &Row<'static>) -> Self {
        Self {
            slots: template.slots.clone(),
        }
    }

    pub fn from_slots(slots: Vec<Datum<'a>>) -> Self {
        Self { slots }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, slot: usize) -> Option<&Datum<'a>> {
        self.slots.get(slot)
    }

    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Datum<'a>> {
        self.slots.get_mut(slot)
    }

    pub fn set(&mut self, slot: usize, value: Datum<'a>) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = value;
        }
    }

    pub fn set_null(&mut self, slot: usize) {
        self.set(slot, Datum::Null);
    }

    pub fn slots(&self) -> &[Datum<'a>] {
        &self.slots
    }

    pub fn into_owned(self) -> Row<'static> {
        Row {
            slots: self.slots.into_iter().map(Datum::into_owned).collect(),
        }
    }
}
