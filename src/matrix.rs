//! Immutable matrix state
//!
//! A [`MatrixState`] is a grid of exact rationals: a block of coefficient
//! columns (one per variable) followed by zero or more constant columns.
//! Elimination levels carry one constant column, inverse levels carry the
//! identity block, determinant levels carry none.
//!
//! States are never edited in place: [`MatrixState::apply_operation`]
//! returns a fresh state, so the session can keep every intermediate state
//! for undo and replays.

use crate::error::{EngineError, Result};
use crate::fraction::Fraction;
use crate::operation::Operation;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixState {
    rows: Vec<Vec<Fraction>>,
    variable_names: Vec<String>,
    constant_columns: usize,
}

/// Classification of a reduced system
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Solution {
    /// Exactly one solution
    Unique { assignments: Vec<Assignment> },
    /// A row reads `0 0 ... 0 | c` with `c != 0`
    Inconsistent,
    /// Free variables remain: infinitely many solutions
    Indeterminate { free_variables: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub variable: String,
    pub value: Fraction,
}

impl Solution {
    /// Value of a variable in a unique solution
    pub fn value_of(&self, variable: &str) -> Option<&Fraction> {
        match self {
            Solution::Unique { assignments } => assignments
                .iter()
                .find(|a| a.variable == variable)
                .map(|a| &a.value),
            _ => None,
        }
    }

    /// Whether the system has no unique solution
    pub fn is_special(&self) -> bool {
        !matches!(self, Solution::Unique { .. })
    }
}

/// Render-ready view of a state
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixView {
    pub rows: Vec<Vec<String>>,
    pub variable_names: Vec<String>,
    pub augmented: bool,
    pub constant_columns: usize,
    pub pivot_columns: Vec<Option<usize>>,
    pub row_echelon: bool,
    pub reduced_row_echelon: bool,
}

impl MatrixState {
    /// Build a state, checking the shape invariants.
    ///
    /// Every row must have `variable_names.len() + constant_columns` entries.
    pub fn new(
        rows: Vec<Vec<Fraction>>,
        variable_names: Vec<String>,
        constant_columns: usize,
    ) -> Result<MatrixState> {
        if rows.is_empty() {
            return Err(EngineError::malformed("matrix has no rows"));
        }
        if variable_names.is_empty() {
            return Err(EngineError::malformed("matrix has no variables"));
        }
        let width = variable_names.len() + constant_columns;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(EngineError::malformed(format!(
                    "row {} has {} entries, expected {} ({} variables + {} constant columns)",
                    i,
                    row.len(),
                    width,
                    variable_names.len(),
                    constant_columns
                )));
            }
        }
        Ok(MatrixState {
            rows,
            variable_names,
            constant_columns,
        })
    }

    /// Convenience constructor for integer matrices
    pub fn from_integers(
        rows: &[&[i64]],
        variable_names: &[&str],
        constant_columns: usize,
    ) -> Result<MatrixState> {
        MatrixState::new(
            rows.iter()
                .map(|row| row.iter().map(|&v| Fraction::from(v)).collect())
                .collect(),
            variable_names.iter().map(|s| s.to_string()).collect(),
            constant_columns,
        )
    }

    pub fn rows(&self) -> &[Vec<Fraction>] {
        &self.rows
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn variable_count(&self) -> usize {
        self.variable_names.len()
    }

    pub fn constant_columns(&self) -> usize {
        self.constant_columns
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&Fraction> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .ok_or(EngineError::IndexOutOfRange {
                row,
                col,
                rows: self.row_count(),
                cols: self.column_count(),
            })
    }

    pub fn row(&self, row: usize) -> Result<&[Fraction]> {
        self.rows
            .get(row)
            .map(Vec::as_slice)
            .ok_or(EngineError::IndexOutOfRange {
                row,
                col: 0,
                rows: self.row_count(),
                cols: self.column_count(),
            })
    }

    /// Apply a row operation, returning the resulting state.
    ///
    /// The receiver is left untouched.
    pub fn apply_operation(&self, op: &Operation) -> Result<MatrixState> {
        op.validate(self.row_count())?;

        let mut rows = self.rows.clone();
        match op {
            Operation::Swap { row_a, row_b } => rows.swap(*row_a, *row_b),
            Operation::Scale { row, factor } => {
                for value in rows[*row].iter_mut() {
                    *value = value.multiply(factor);
                }
            }
            Operation::Combine {
                target_row,
                source_row,
                factor,
            } => {
                let source = rows[*source_row].clone();
                for (value, s) in rows[*target_row].iter_mut().zip(&source) {
                    *value = value.add(&s.multiply(factor));
                }
            }
        }

        Ok(MatrixState {
            rows,
            variable_names: self.variable_names.clone(),
            constant_columns: self.constant_columns,
        })
    }

    /// Column of the leading non-zero coefficient of a row
    fn leading_column(&self, row: &[Fraction]) -> Option<usize> {
        row[..self.variable_count()].iter().position(|v| !v.is_zero())
    }

    /// Leading coefficient column of each row (`None` for zero rows)
    pub fn pivot_columns(&self) -> Vec<Option<usize>> {
        self.rows.iter().map(|row| self.leading_column(row)).collect()
    }

    /// Whether the coefficient block has a row of zeros
    pub fn has_zero_coefficient_row(&self) -> bool {
        self.pivot_columns().iter().any(Option::is_none)
    }

    /// Whether the coefficient block is the identity matrix
    pub fn is_identity_block(&self) -> bool {
        let n = self.variable_count();
        self.row_count() == n
            && self.rows.iter().enumerate().all(|(r, row)| {
                row[..n]
                    .iter()
                    .enumerate()
                    .all(|(c, v)| if r == c { v.is_one() } else { v.is_zero() })
            })
    }

    /// Extract the solution of a reduced system.
    ///
    /// Returns `None` while the coefficient block is not yet in reduced row
    /// echelon form. Values come from the first constant column; a state
    /// without constants is read as a homogeneous system.
    pub fn extract_solution(&self) -> Option<Solution> {
        if !self.is_reduced_row_echelon() {
            return None;
        }

        let n = self.variable_count();
        let pivots = self.pivot_columns();

        for (row, lead) in self.rows.iter().zip(&pivots) {
            if lead.is_none() && row[n..].iter().any(|v| !v.is_zero()) {
                return Some(Solution::Inconsistent);
            }
        }

        let pivot_rows: Vec<(usize, usize)> = pivots
            .iter()
            .enumerate()
            .filter_map(|(r, lead)| lead.map(|c| (r, c)))
            .collect();

        if pivot_rows.len() < n {
            let free_variables = self
                .variable_names
                .iter()
                .enumerate()
                .filter(|(c, _)| !pivot_rows.iter().any(|&(_, pc)| pc == *c))
                .map(|(_, name)| name.clone())
                .collect();
            return Some(Solution::Indeterminate { free_variables });
        }

        // Reduced with a pivot in every column: row r holds variable r.
        let assignments = pivot_rows
            .iter()
            .map(|&(r, c)| Assignment {
                variable: self.variable_names[c].clone(),
                value: if self.constant_columns > 0 {
                    self.rows[r][n].clone()
                } else {
                    Fraction::zero()
                },
            })
            .collect();
        Some(Solution::Unique { assignments })
    }

    /// Square coefficient block, without constants
    pub fn coefficient_matrix(&self) -> Vec<Vec<Fraction>> {
        let n = self.variable_count();
        self.rows.iter().map(|row| row[..n].to_vec()).collect()
    }

    /// The first constant column, if the state is augmented
    pub fn constants_column(&self) -> Option<Vec<Fraction>> {
        if self.constant_columns == 0 {
            return None;
        }
        let n = self.variable_count();
        Some(self.rows.iter().map(|row| row[n].clone()).collect())
    }

    /// The right-hand block once the coefficient block is the identity.
    ///
    /// On a Gauss-Jordan board `[A | I]` this is `A^-1`.
    pub fn inverse_block(&self) -> Option<Vec<Vec<Fraction>>> {
        let n = self.variable_count();
        if self.constant_columns != n || !self.is_identity_block() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[n..].to_vec()).collect())
    }

    /// Exact determinant of the coefficient block
    pub fn determinant(&self) -> Result<Fraction> {
        let n = self.variable_count();
        if self.row_count() != n {
            return Err(EngineError::invalid(format!(
                "determinant needs a square matrix, this one is {}x{}",
                self.row_count(),
                n
            )));
        }

        let mut m = self.coefficient_matrix();
        let mut det = Fraction::one();

        for col in 0..n {
            let Some(pivot) = (col..n).find(|&r| !m[r][col].is_zero()) else {
                return Ok(Fraction::zero());
            };
            if pivot != col {
                m.swap(pivot, col);
                det = det.negate();
            }

            let pivot_value = m[col][col].clone();
            det = det.multiply(&pivot_value);

            for r in col + 1..n {
                if m[r][col].is_zero() {
                    continue;
                }
                let factor = m[r][col].divide(&pivot_value)?;
                for c in col..n {
                    let delta = m[col][c].multiply(&factor);
                    m[r][c] = m[r][c].subtract(&delta);
                }
            }
        }

        Ok(det)
    }

    /// Square, constant-free state with one coefficient column replaced.
    ///
    /// Used for Cramer's rule: `det(A_i)` replaces column `i` with `b`.
    pub fn with_column_replaced(&self, col: usize, values: &[Fraction]) -> Result<MatrixState> {
        let n = self.variable_count();
        if col >= n {
            return Err(EngineError::IndexOutOfRange {
                row: 0,
                col,
                rows: self.row_count(),
                cols: n,
            });
        }
        if values.len() != self.row_count() {
            return Err(EngineError::invalid(format!(
                "replacement column has {} entries, matrix has {} rows",
                values.len(),
                self.row_count()
            )));
        }

        let rows = self
            .coefficient_matrix()
            .into_iter()
            .zip(values)
            .map(|(mut row, v)| {
                row[col] = v.clone();
                row
            })
            .collect();
        MatrixState::new(rows, self.variable_names.clone(), 0)
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(Fraction::to_string_repr).collect())
            .collect()
    }

    pub fn view(&self) -> MatrixView {
        MatrixView {
            rows: self.display_rows(),
            variable_names: self.variable_names.clone(),
            augmented: self.augmented(),
            constant_columns: self.constant_columns,
            pivot_columns: self.pivot_columns(),
            row_echelon: self.is_row_echelon(),
            reduced_row_echelon: self.is_reduced_row_echelon(),
        }
    }
}

#[wasm_bindgen]
impl MatrixState {
    #[wasm_bindgen(getter, js_name = rowCount)]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[wasm_bindgen(getter, js_name = columnCount)]
    pub fn column_count(&self) -> usize {
        self.variable_names.len() + self.constant_columns
    }

    /// Whether trailing constant columns are present
    #[wasm_bindgen(getter)]
    pub fn augmented(&self) -> bool {
        self.constant_columns > 0
    }

    /// Leading non-zero column strictly increases down the rows, zero rows last
    #[wasm_bindgen(js_name = isRowEchelon)]
    pub fn is_row_echelon(&self) -> bool {
        let mut last: Option<usize> = None;
        let mut seen_zero_row = false;

        for lead in self.pivot_columns() {
            match lead {
                None => seen_zero_row = true,
                Some(col) => {
                    if seen_zero_row || last.is_some_and(|prev| col <= prev) {
                        return false;
                    }
                    last = Some(col);
                }
            }
        }
        true
    }

    /// Echelon form with unit pivots and zeros elsewhere in pivot columns
    #[wasm_bindgen(js_name = isReducedRowEchelon)]
    pub fn is_reduced_row_echelon(&self) -> bool {
        if !self.is_row_echelon() {
            return false;
        }
        self.pivot_columns()
            .into_iter()
            .enumerate()
            .filter_map(|(r, lead)| lead.map(|c| (r, c)))
            .all(|(r, c)| {
                self.rows[r][c].is_one()
                    && self
                        .rows
                        .iter()
                        .enumerate()
                        .all(|(other, row)| other == r || row[c].is_zero())
            })
    }

    #[wasm_bindgen(js_name = get)]
    pub fn get_js(&self, row: usize, col: usize) -> Result<Fraction> {
        self.get(row, col).cloned()
    }

    #[wasm_bindgen(js_name = determinant)]
    pub fn determinant_js(&self) -> Result<Fraction> {
        self.determinant()
    }

    /// Apply an operation given as `{ kind, ... }`, returning a new state
    #[wasm_bindgen(js_name = applyOperation)]
    pub fn apply_operation_js(&self, op: JsValue) -> std::result::Result<MatrixState, JsValue> {
        let op: Operation =
            serde_wasm_bindgen::from_value(op).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.apply_operation(&op)?)
    }

    #[wasm_bindgen(js_name = extractSolution)]
    pub fn extract_solution_js(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.extract_solution())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = view)]
    pub fn view_js(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.view()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
