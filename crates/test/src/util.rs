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

use arrow_array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, RecordBatch, StringArray,
};

fn column<'a, A: Array + 'static>(record_batch: &'a RecordBatch, name: &str) -> &'a A {
    record_batch
        .column_by_name(name)
        .unwrap_or_else(|| panic!("no column named {name}"))
        .as_any()
        .downcast_ref::<A>()
        .unwrap_or_else(|| panic!("column {name} has type {:?}", record_batch.schema()))
}

pub fn get_str_column<'a>(record_batch: &'a RecordBatch, name: &str) -> Vec<Option<&'a str>> {
    column::<StringArray>(record_batch, name).iter().collect()
}

pub fn get_bool_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<bool>> {
    column::<BooleanArray>(record_batch, name).iter().collect()
}

pub fn get_i8_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<i8>> {
    column::<Int8Array>(record_batch, name).iter().collect()
}

pub fn get_i16_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<i16>> {
    column::<Int16Array>(record_batch, name).iter().collect()
}

pub fn get_i32_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    column::<Int32Array>(record_batch, name).iter().collect()
}

pub fn get_i64_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    column::<Int64Array>(record_batch, name).iter().collect()
}

pub fn get_f32_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<f32>> {
    column::<Float32Array>(record_batch, name).iter().collect()
}

pub fn get_f64_column(record_batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    column::<Float64Array>(record_batch, name).iter().collect()
}

/// Concatenate a column across batches.
pub fn collect_i64_column(batches: &[RecordBatch], name: &str) -> Vec<Option<i64>> {
    batches
        .iter()
        .flat_map(|b| get_i64_column(b, name))
        .collect()
}

pub fn collect_str_column(batches: &[RecordBatch], name: &str) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|b| {
            get_str_column(b, name)
                .into_iter()
                .map(|s| s.map(str::to_string))
                .collect::<Vec<_>>()
        })
        .collect()
}
