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

pub mod filter;

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::hfile::error::HFileError;

/// A comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOperator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Display for ExprOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExprOperator::Eq => write!(f, "="),
            ExprOperator::Ne => write!(f, "!="),
            ExprOperator::Lt => write!(f, "<"),
            ExprOperator::Lte => write!(f, "<="),
            ExprOperator::Gt => write!(f, ">"),
            ExprOperator::Gte => write!(f, ">="),
        }
    }
}

impl ExprOperator {
    pub const TOKEN_OP_PAIRS: [(&'static str, ExprOperator); 6] = [
        ("=", ExprOperator::Eq),
        ("!=", ExprOperator::Ne),
        ("<", ExprOperator::Lt),
        ("<=", ExprOperator::Lte),
        (">", ExprOperator::Gt),
        (">=", ExprOperator::Gte),
    ];

    pub fn negate(&self) -> ExprOperator {
        match self {
            ExprOperator::Eq => ExprOperator::Ne,
            ExprOperator::Ne => ExprOperator::Eq,
            ExprOperator::Lt => ExprOperator::Gte,
            ExprOperator::Lte => ExprOperator::Gt,
            ExprOperator::Gt => ExprOperator::Lte,
            ExprOperator::Gte => ExprOperator::Lt,
        }
    }

    /// Whether `lhs <op> rhs` holds, given `lhs.cmp(rhs)`.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            ExprOperator::Eq => ordering == Ordering::Equal,
            ExprOperator::Ne => ordering != Ordering::Equal,
            ExprOperator::Lt => ordering == Ordering::Less,
            ExprOperator::Lte => ordering != Ordering::Greater,
            ExprOperator::Gt => ordering == Ordering::Greater,
            ExprOperator::Gte => ordering != Ordering::Less,
        }
    }
}

impl FromStr for ExprOperator {
    type Err = HFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExprOperator::TOKEN_OP_PAIRS
            .iter()
            .find_map(|&(token, op)| if token == s.trim() { Some(op) } else { None })
            .ok_or_else(|| HFileError::InvalidFilter(format!("Unsupported operator: {}", s)))
    }
}
