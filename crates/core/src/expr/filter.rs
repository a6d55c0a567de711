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

use std::borrow::Cow;
use std::str::FromStr;

use crate::expr::ExprOperator;
use crate::hfile::error::{HFileError, Result};
use crate::row::{Datum, Row};
use crate::schema::{ColumnType, ScanProjection, TableSchema};

/// Decides whether a decoded row is kept.
pub trait RowFilter {
    fn eval(&self, row: &Row<'_>) -> bool;
}

impl<F> RowFilter for F
where
    F: Fn(&Row<'_>) -> bool,
{
    fn eval(&self, row: &Row<'_>) -> bool {
        self(row)
    }
}

/// An unbound `column <op> literal` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field_name: String,
    pub operator: ExprOperator,
    pub field_value: String,
}

impl TryFrom<(&str, &str, &str)> for Filter {
    type Error = HFileError;

    fn try_from(binary_expr_tuple: (&str, &str, &str)) -> Result<Self, Self::Error> {
        let (field_name, operator_str, field_value) = binary_expr_tuple;
        let operator = ExprOperator::from_str(operator_str)?;
        Ok(Filter {
            field_name: field_name.to_string(),
            operator,
            field_value: field_value.to_string(),
        })
    }
}

fn parse_literal(column_type: ColumnType, value: &str) -> Result<Datum<'static>> {
    fn parse<T: FromStr>(column_type: ColumnType, value: &str) -> Result<T> {
        value.trim().parse().map_err(|_| {
            HFileError::InvalidFilter(format!("Cannot parse '{value}' as {column_type}"))
        })
    }
    let datum = match column_type {
        ColumnType::Boolean => Datum::Boolean(parse(column_type, value)?),
        ColumnType::TinyInt => Datum::TinyInt(parse(column_type, value)?),
        ColumnType::SmallInt => Datum::SmallInt(parse(column_type, value)?),
        ColumnType::Int => Datum::Int(parse(column_type, value)?),
        ColumnType::BigInt => Datum::BigInt(parse(column_type, value)?),
        ColumnType::Float => Datum::Float(parse(column_type, value)?),
        ColumnType::Double => Datum::Double(parse(column_type, value)?),
        ColumnType::String => Datum::String(Cow::Owned(value.as_bytes().to_vec())),
        ColumnType::Timestamp | ColumnType::Binary => {
            return Err(HFileError::UnsupportedType(column_type))
        }
    };
    Ok(datum)
}

#[derive(Debug, Clone, PartialEq)]
struct BoundPredicate {
    slot: usize,
    operator: ExprOperator,
    literal: Datum<'static>,
}

/// A conjunction of comparisons on materialized columns.
///
/// A null value never satisfies a comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conjuncts {
    predicates: Vec<BoundPredicate>,
}

impl Conjuncts {
    /// Bind filters to the output slots of `projection`.
    pub fn bind(
        filters: &[Filter],
        schema: &TableSchema,
        projection: &ScanProjection,
    ) -> Result<Self> {
        let predicates = filters
            .iter()
            .map(|filter| -> Result<BoundPredicate> {
                let column = schema.index_of(&filter.field_name).ok_or_else(|| {
                    HFileError::InvalidFilter(format!(
                        "Column '{}' not found in table schema",
                        filter.field_name
                    ))
                })?;
                let slot = projection.slot_for(column).ok_or_else(|| {
                    HFileError::InvalidFilter(format!(
                        "Column '{}' is filtered but not materialized",
                        filter.field_name
                    ))
                })?;
                let column_type = schema
                    .column_type(column)
                    .ok_or_else(|| HFileError::InvalidFilter(filter.field_name.clone()))?;
                Ok(BoundPredicate {
                    slot,
                    operator: filter.operator,
                    literal: parse_literal(column_type, &filter.field_value)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { predicates })
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl RowFilter for Conjuncts {
    fn eval(&self, row: &Row<'_>) -> bool {
        self.predicates.iter().all(|p| {
            row.get(p.slot)
                .and_then(|value| value.compare(&p.literal))
                .is_some_and(|ordering| p.operator.holds(ordering))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn schema() -> TableSchema {
        TableSchema::new(
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::String),
                Column::new("score", ColumnType::Double),
                Column::new("ts", ColumnType::Timestamp),
            ],
            0,
        )
        .unwrap()
    }

    fn bind(filters: &[(&str, &str, &str)], projection: &ScanProjection) -> Result<Conjuncts> {
        let filters = filters
            .iter()
            .map(|t| Filter::try_from(*t))
            .collect::<Result<Vec<_>>>()?;
        Conjuncts::bind(&filters, &schema(), projection)
    }

    #[test]
    fn test_filter_from_tuple() {
        let filter = Filter::try_from(("id", ">=", "10")).unwrap();
        assert_eq!(filter.field_name, "id");
        assert_eq!(filter.operator, ExprOperator::Gte);
        assert_eq!(filter.field_value, "10");
        assert!(Filter::try_from(("id", "~", "10")).is_err());
    }

    #[test]
    fn test_conjuncts_eval() {
        let projection = ScanProjection::new(vec![2, 0, 1]);
        let conjuncts = bind(
            &[("id", ">", "1"), ("name", "!=", "bob"), ("score", "<=", "2.5")],
            &projection,
        )
        .unwrap();
        let row = |id: i32, name: &str, score: f64| {
            Row::from_slots(vec![Datum::Double(score), Datum::Int(id), Datum::string(name)])
        };
        assert!(conjuncts.eval(&row(2, "amy", 2.5)));
        assert!(!conjuncts.eval(&row(1, "amy", 2.5)));
        assert!(!conjuncts.eval(&row(2, "bob", 2.5)));
        assert!(!conjuncts.eval(&row(2, "amy", 2.6)));
    }

    #[test]
    fn test_null_never_matches() {
        let projection = ScanProjection::new(vec![0]);
        let eq = bind(&[("id", "=", "1")], &projection).unwrap();
        let ne = bind(&[("id", "!=", "1")], &projection).unwrap();
        let row = Row::from_slots(vec![Datum::Null]);
        assert!(!eq.eval(&row));
        assert!(!ne.eval(&row));
    }

    #[test]
    fn test_bind_errors() {
        let projection = ScanProjection::new(vec![0, 3]);
        assert!(matches!(
            bind(&[("missing", "=", "1")], &projection),
            Err(HFileError::InvalidFilter(_))
        ));
        assert!(matches!(
            bind(&[("name", "=", "x")], &projection),
            Err(HFileError::InvalidFilter(_))
        ));
        assert!(matches!(
            bind(&[("id", "=", "one")], &projection),
            Err(HFileError::InvalidFilter(_))
        ));
        assert!(matches!(
            bind(&[("ts", "=", "1")], &projection),
            Err(HFileError::UnsupportedType(ColumnType::Timestamp))
        ));
    }

    #[test]
    fn test_closure_filter() {
        let filter = |row: &Row<'_>| matches!(row.get(0), Some(Datum::Int(v)) if *v % 2 == 0);
        assert!(filter.eval(&Row::from_slots(vec![Datum::Int(4)])));
        assert!(!filter.eval(&Row::from_slots(vec![Datum::Int(3)])));
    }

    #[test]
    fn test_empty_conjuncts_accept_everything() {
        let conjuncts = Conjuncts::default();
        assert!(conjuncts.is_empty());
        assert!(conjuncts.eval(&Row::new(0)));
    }
}
