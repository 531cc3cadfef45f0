//! Feature alignment for single-row prediction requests.
//!
//! A request row arrives as an arbitrary JSON object. Before it reaches an
//! estimator it is turned into a [`FeatureFrame`], stripped of identifier and
//! label columns, coerced to numbers where possible, and (when the model
//! declares its training columns) reshaped to exactly that column list.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    /// Columns that never carry model features: row ids, pandas index
    /// leftovers and label columns.
    pub static ref NON_FEATURE_COLUMNS: HashSet<&'static str> = [
        "id",
        "ID",
        "index",
        "Index",
        "Unnamed: 0",
        "Unnamed: 0.1",
        "target",
        "label",
        "labels",
        "redemption_status",
        "y",
    ]
    .into_iter()
    .collect();
}

/// A single scalar cell of a request row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Bool(bool),
    Text(String),
    /// JSON null, or an empty string after coercion
    Missing,
    /// Arrays and objects; never numeric
    Nested(Value),
}

impl Cell {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Missing,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Nested(other.clone()),
        }
    }

    /// Attempt numeric coercion of text; anything unparsable is left as is.
    fn coerce_numeric(self) -> Self {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Cell::Missing
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(v) => Cell::Number(v),
                        Err(_) => Cell::Text(s),
                    }
                }
            }
            other => other,
        }
    }

    /// Numeric value as an estimator sees it. Missing cells become NaN.
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Cell::Number(v) => Ok(*v),
            Cell::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Cell::Missing => Ok(f64::NAN),
            Cell::Text(s) => Err(Error::Inference(format!(
                "could not convert string to float: '{}'",
                s
            ))),
            Cell::Nested(v) => Err(Error::Inference(format!(
                "could not convert string to float: '{}'",
                v
            ))),
        }
    }
}

/// An ordered single-row table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    cells: Vec<Cell>,
}

impl FeatureFrame {
    /// Build a frame from a JSON object, keeping the object's key order.
    pub fn from_row(row: &Map<String, Value>) -> Self {
        let (columns, cells) = row
            .iter()
            .map(|(name, value)| (name.clone(), Cell::from_json(value)))
            .unzip();
        Self { columns, cells }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.cells[idx])
    }

    /// Remove every column on the non-feature deny-list.
    pub fn drop_non_features(self) -> Self {
        let (columns, cells) = self
            .columns
            .into_iter()
            .zip(self.cells)
            .filter(|(name, _)| {
                let drop = NON_FEATURE_COLUMNS.contains(name.as_str());
                if drop {
                    debug!("Dropping non-feature column '{}'", name);
                }
                !drop
            })
            .unzip();
        Self { columns, cells }
    }

    /// Coerce text cells to numbers where they parse.
    pub fn coerce_numeric(self) -> Self {
        Self {
            columns: self.columns,
            cells: self.cells.into_iter().map(Cell::coerce_numeric).collect(),
        }
    }

    /// Select exactly `expected` columns in that order. Missing columns are
    /// zero-filled; columns not in `expected` are discarded.
    pub fn align_to(self, expected: &[String]) -> Self {
        let extra: Vec<&String> = self
            .columns
            .iter()
            .filter(|c| !expected.contains(c))
            .collect();
        if !extra.is_empty() {
            debug!("Discarding unexpected columns: {:?}", extra);
        }

        let cells = expected
            .iter()
            .map(|name| match self.get(name) {
                Some(cell) => cell.clone(),
                None => {
                    debug!("Filling missing feature '{}' with 0", name);
                    Cell::Number(0.0)
                }
            })
            .collect();

        Self {
            columns: expected.to_vec(),
            cells,
        }
    }

    /// Dense numeric vector in column order.
    pub fn to_dense(&self) -> Result<Vec<f64>> {
        self.cells.iter().map(Cell::to_f64).collect()
    }
}

/// Full cleaning pipeline applied to every request row.
pub fn clean_and_align(
    row: &Map<String, Value>,
    feature_names: Option<&[String]>,
) -> FeatureFrame {
    let frame = FeatureFrame::from_row(row)
        .drop_non_features()
        .coerce_numeric();

    match feature_names {
        Some(expected) => frame.align_to(expected),
        None => frame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_drops_deny_listed_columns() {
        let row = object(json!({
            "id": 7, "age": 30, "Unnamed: 0": 0, "target": 1, "income": 50000
        }));
        let frame = clean_and_align(&row, None);
        assert_eq!(frame.columns(), &names(&["age", "income"])[..]);
        assert_eq!(frame.to_dense().unwrap(), vec![30.0, 50000.0]);
    }

    #[test]
    fn test_deny_list_is_case_sensitive() {
        let row = object(json!({"Id": 1, "ID": 2, "Label": 3}));
        let frame = clean_and_align(&row, None);
        assert_eq!(frame.columns(), &names(&["Id", "Label"])[..]);
    }

    #[test]
    fn test_passthrough_preserves_input_order() {
        let row = object(json!({"b": 2, "a": 1, "c": 3}));
        let frame = clean_and_align(&row, None);
        assert_eq!(frame.columns(), &names(&["b", "a", "c"])[..]);
    }

    #[test]
    fn test_numeric_coercion() {
        let row = object(json!({
            "a": "1.5", "b": " 42 ", "c": "abc", "d": "", "e": true, "f": null
        }));
        let frame = clean_and_align(&row, None);
        assert_eq!(frame.get("a"), Some(&Cell::Number(1.5)));
        assert_eq!(frame.get("b"), Some(&Cell::Number(42.0)));
        assert_eq!(frame.get("c"), Some(&Cell::Text("abc".to_string())));
        assert_eq!(frame.get("d"), Some(&Cell::Missing));
        assert_eq!(frame.get("e"), Some(&Cell::Bool(true)));
        assert_eq!(frame.get("f"), Some(&Cell::Missing));
    }

    #[test]
    fn test_align_fills_missing_and_reorders() {
        let expected = names(&["age", "income", "visits"]);
        let row = object(json!({"visits": 4, "extra": 9, "age": 30}));
        let frame = clean_and_align(&row, Some(expected.as_slice()));
        assert_eq!(frame.columns(), &expected[..]);
        assert_eq!(frame.to_dense().unwrap(), vec![30.0, 0.0, 4.0]);
    }

    #[test]
    fn test_alignment_is_idempotent() {
        let expected = names(&["age", "income"]);
        let noisy = object(json!({"income": 50000, "id": 7, "target": 1, "age": 30}));
        let clean = object(json!({"age": 30, "income": 50000}));
        assert_eq!(
            clean_and_align(&noisy, Some(expected.as_slice())),
            clean_and_align(&clean, Some(expected.as_slice()))
        );
    }

    #[test]
    fn test_omitted_equals_explicit_zero() {
        let expected = names(&["age", "income"]);
        let omitted = object(json!({"age": 30}));
        let explicit = object(json!({"age": 30, "income": 0}));
        assert_eq!(
            clean_and_align(&omitted, Some(expected.as_slice())).to_dense().unwrap(),
            clean_and_align(&explicit, Some(expected.as_slice())).to_dense().unwrap()
        );
    }

    #[test]
    fn test_non_numeric_cell_fails_dense_conversion() {
        let row = object(json!({"city": "Kyiv"}));
        let err = clean_and_align(&row, None).to_dense().unwrap_err();
        assert_eq!(err.to_string(), "could not convert string to float: 'Kyiv'");
    }

    #[test]
    fn test_missing_becomes_nan() {
        let row = object(json!({"a": null}));
        let dense = clean_and_align(&row, None).to_dense().unwrap();
        assert!(dense[0].is_nan());
    }
}
