//! Level descriptors
//!
//! A [`Level`] is the static record a level table supplies: the system to
//! solve, what the correct outcome is, and the par step count. Records come
//! either from the built-in catalogue or from JavaScript, and every record is
//! validated before a session may start on it.

use crate::error::{EngineError, Result};
use crate::fraction::Fraction;
use crate::matrix::MatrixState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const DEFAULT_VARIABLES: [&str; 4] = ["x", "y", "z", "w"];

/// Largest system a level may declare
pub const MAX_SIZE: usize = 8;

/// Which solution method a level teaches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelKind {
    /// Gaussian elimination on the augmented matrix `[A | b]`
    Elimination,
    /// Gauss-Jordan on `[A | I]`
    Inverse,
    /// Cramer's rule, answered by submitting values
    Cramer,
    /// Determinant calculation, answered by submitting a value
    Determinant,
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LevelKind::Elimination => "elimination",
            LevelKind::Inverse => "inverse",
            LevelKind::Cramer => "cramer",
            LevelKind::Determinant => "determinant",
        };
        f.write_str(name)
    }
}

/// Static level record
///
/// The matrix is given either as `coefficients` + `constants` or as a single
/// `matrix`; an `n x (n+1)` matrix is read as augmented. Records without a
/// `kind` are read as determinant levels when they carry an `answer`, Cramer
/// levels when they carry `answers`, and elimination levels otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LevelRecord")]
pub struct Level {
    pub id: u32,
    pub title: String,
    pub kind: LevelKind,
    pub size: usize,
    pub variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<Vec<Vec<Fraction>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<Vec<Fraction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<Vec<Fraction>>>,
    /// Expected solution; `None` means the system has no unique solution
    pub solution: Option<BTreeMap<String, Fraction>>,
    /// Expected determinant (determinant levels)
    pub answer: Option<Fraction>,
    /// Expected variable values (Cramer levels); `None` means no unique solution
    pub answers: Option<BTreeMap<String, Fraction>>,
    pub min_steps: u32,
    pub det_is_zero: bool,
}

/// Wire form of [`Level`], where most fields may be omitted
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelRecord {
    id: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    kind: Option<LevelKind>,
    size: usize,
    #[serde(default)]
    variables: Vec<String>,
    #[serde(default)]
    coefficients: Option<Vec<Vec<Fraction>>>,
    #[serde(default)]
    constants: Option<Vec<Fraction>>,
    #[serde(default)]
    matrix: Option<Vec<Vec<Fraction>>>,
    #[serde(default)]
    solution: Option<BTreeMap<String, Fraction>>,
    #[serde(default)]
    answer: Option<Fraction>,
    #[serde(default)]
    answers: Option<BTreeMap<String, Fraction>>,
    #[serde(default)]
    min_steps: u32,
    #[serde(default)]
    det_is_zero: bool,
}

impl From<LevelRecord> for Level {
    fn from(record: LevelRecord) -> Level {
        let kind = record.kind.unwrap_or(if record.answer.is_some() {
            LevelKind::Determinant
        } else if record.answers.is_some() {
            LevelKind::Cramer
        } else {
            LevelKind::Elimination
        });
        Level {
            id: record.id,
            title: record.title,
            kind,
            size: record.size,
            variables: record.variables,
            coefficients: record.coefficients,
            constants: record.constants,
            matrix: record.matrix,
            solution: record.solution,
            answer: record.answer,
            answers: record.answers,
            min_steps: record.min_steps,
            det_is_zero: record.det_is_zero,
        }
    }
}

/// Coefficient block and optional constants vector of a level
pub struct LinearSystem {
    pub coefficients: Vec<Vec<Fraction>>,
    pub constants: Option<Vec<Fraction>>,
}

impl Level {
    /// Variable labels, defaulting to x, y, z, w, x5, ...
    ///
    /// Default labels are generated for at most [`MAX_SIZE`] variables.
    pub fn variable_names(&self) -> Vec<String> {
        if !self.variables.is_empty() {
            return self.variables.clone();
        }
        (0..self.size.min(MAX_SIZE))
            .map(|i| match DEFAULT_VARIABLES.get(i) {
                Some(name) => name.to_string(),
                None => format!("x{}", i + 1),
            })
            .collect()
    }

    /// Whether the level's correct outcome is "no unique solution"
    pub fn is_singular(&self) -> bool {
        if self.det_is_zero {
            return true;
        }
        match self.kind {
            LevelKind::Elimination => self.solution.is_none(),
            // A pure "find the inverse" level has neither constants nor a solution.
            LevelKind::Inverse => self.has_constants() && self.solution.is_none(),
            LevelKind::Cramer => self.answers.is_none(),
            LevelKind::Determinant => self.answer.as_ref().map_or(true, Fraction::is_zero),
        }
    }

    fn has_constants(&self) -> bool {
        match (&self.constants, &self.matrix) {
            (Some(_), _) => true,
            (None, Some(rows)) => rows
                .first()
                .is_some_and(|r| r.len() == self.size.saturating_add(1)),
            (None, None) => false,
        }
    }

    /// Resolve the two accepted matrix layouts into coefficients + constants
    pub fn system(&self) -> Result<LinearSystem> {
        let n = self.size;
        let (coefficients, constants) = match (&self.coefficients, &self.matrix) {
            (Some(_), Some(_)) => {
                return Err(EngineError::malformed(format!(
                    "level {} gives both `coefficients` and `matrix`",
                    self.id
                )))
            }
            (Some(coefficients), None) => (coefficients.clone(), self.constants.clone()),
            (None, Some(matrix)) => {
                if self.constants.is_some() {
                    return Err(EngineError::malformed(format!(
                        "level {} gives `constants` alongside a combined `matrix`",
                        self.id
                    )));
                }
                let width = matrix.first().map_or(0, Vec::len);
                if width == n.saturating_add(1) {
                    let mut coefficients = Vec::with_capacity(matrix.len());
                    let mut constants = Vec::with_capacity(matrix.len());
                    for row in matrix {
                        let (b, a) = row.split_last().ok_or_else(|| {
                            EngineError::malformed(format!("level {} has an empty row", self.id))
                        })?;
                        coefficients.push(a.to_vec());
                        constants.push(b.clone());
                    }
                    (coefficients, Some(constants))
                } else {
                    (matrix.clone(), None)
                }
            }
            (None, None) => {
                return Err(EngineError::malformed(format!(
                    "level {} has no matrix",
                    self.id
                )))
            }
        };

        if coefficients.len() != n {
            return Err(EngineError::malformed(format!(
                "level {} declares size {} but has {} rows",
                self.id,
                n,
                coefficients.len()
            )));
        }
        for (i, row) in coefficients.iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::malformed(format!(
                    "level {}: row {} has {} coefficients, expected {}",
                    self.id,
                    i,
                    row.len(),
                    n
                )));
            }
        }
        if let Some(b) = &constants {
            if b.len() != n {
                return Err(EngineError::malformed(format!(
                    "level {} has {} constants for {} equations",
                    self.id,
                    b.len(),
                    n
                )));
            }
        }

        Ok(LinearSystem {
            coefficients,
            constants,
        })
    }

    /// Check every declared invariant of the record.
    ///
    /// Expected results are verified against the matrix itself: a solution
    /// must satisfy the system, a determinant answer must be the determinant,
    /// and the singular flag must agree with a zero determinant.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(EngineError::malformed(format!(
                "level {} has size {}, expected 1 to {}",
                self.id, self.size, MAX_SIZE
            )));
        }

        let names = self.variable_names();
        if names.len() != self.size {
            return Err(EngineError::malformed(format!(
                "level {} names {} variables for a size {} system",
                self.id,
                names.len(),
                self.size
            )));
        }
        let unique: BTreeSet<&String> = names.iter().collect();
        if unique.len() != names.len() {
            return Err(EngineError::malformed(format!(
                "level {} repeats a variable name",
                self.id
            )));
        }

        let system = self.system()?;
        match self.kind {
            LevelKind::Elimination | LevelKind::Cramer if system.constants.is_none() => {
                return Err(EngineError::malformed(format!(
                    "{} level {} needs a constants column",
                    self.kind, self.id
                )));
            }
            LevelKind::Determinant if system.constants.is_some() => {
                return Err(EngineError::malformed(format!(
                    "determinant level {} must be a square matrix",
                    self.id
                )));
            }
            _ => {}
        }

        let det = MatrixState::new(system.coefficients.clone(), names.clone(), 0)?.determinant()?;
        if det.is_zero() != self.is_singular() {
            return Err(EngineError::malformed(format!(
                "level {} is marked {} but its determinant is {}",
                self.id,
                if self.is_singular() { "singular" } else { "non-singular" },
                det
            )));
        }

        let expected = match self.kind {
            LevelKind::Elimination | LevelKind::Inverse => self.solution.as_ref(),
            LevelKind::Cramer => self.answers.as_ref(),
            LevelKind::Determinant => None,
        };
        if let Some(expected) = expected {
            check_assignment(self.id, &names, expected)?;
            if let Some(b) = &system.constants {
                let x: Vec<Fraction> = names.iter().map(|n| expected[n].clone()).collect();
                for (i, (row, rhs)) in system.coefficients.iter().zip(b).enumerate() {
                    let lhs = row
                        .iter()
                        .zip(&x)
                        .fold(Fraction::zero(), |acc, (a, v)| acc.add(&a.multiply(v)));
                    if !lhs.equals(rhs) {
                        return Err(EngineError::malformed(format!(
                            "level {}: expected solution fails equation {} ({} != {})",
                            self.id, i, lhs, rhs
                        )));
                    }
                }
            }
        }

        if self.kind == LevelKind::Determinant {
            if let Some(answer) = &self.answer {
                if !answer.equals(&det) {
                    return Err(EngineError::malformed(format!(
                        "level {}: declared determinant {} but the matrix gives {}",
                        self.id, answer, det
                    )));
                }
            }
        }

        Ok(())
    }

    /// Build the starting board for the level.
    pub fn initial_state(&self) -> Result<MatrixState> {
        self.validate()?;
        let system = self.system()?;
        let names = self.variable_names();
        let n = self.size;

        match self.kind {
            LevelKind::Elimination | LevelKind::Cramer => {
                let constants = system.constants.unwrap_or_default();
                let rows = system
                    .coefficients
                    .into_iter()
                    .zip(constants)
                    .map(|(mut row, b)| {
                        row.push(b);
                        row
                    })
                    .collect();
                MatrixState::new(rows, names, 1)
            }
            LevelKind::Inverse => {
                let rows = system
                    .coefficients
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut row)| {
                        row.extend((0..n).map(|j| {
                            if i == j {
                                Fraction::one()
                            } else {
                                Fraction::zero()
                            }
                        }));
                        row
                    })
                    .collect();
                MatrixState::new(rows, names, n)
            }
            LevelKind::Determinant => MatrixState::new(system.coefficients, names, 0),
        }
    }
}

fn check_assignment(
    level_id: u32,
    names: &[String],
    values: &BTreeMap<String, Fraction>,
) -> Result<()> {
    for name in names {
        if !values.contains_key(name) {
            return Err(EngineError::malformed(format!(
                "level {}: no expected value for `{}`",
                level_id, name
            )));
        }
    }
    if let Some(extra) = values.keys().find(|k| !names.contains(k)) {
        return Err(EngineError::malformed(format!(
            "level {}: expected value for unknown variable `{}`",
            level_id, extra
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Level {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_split_form() {
        let level = parse(
            r#"{"id": 1, "kind": "elimination", "size": 2,
                "coefficients": [[2, 1], [1, 1]], "constants": [5, 3],
                "solution": {"x": 2, "y": 1}, "minSteps": 2}"#,
        );
        level.validate().unwrap();
        let state = level.initial_state().unwrap();
        assert_eq!(state.column_count(), 3);
        assert_eq!(state.variable_names(), &["x".to_string(), "y".to_string()]);
        assert!(state.augmented());
        assert!(!level.is_singular());
    }

    #[test]
    fn test_combined_form() {
        let level = parse(
            r#"{"id": 2, "kind": "elimination", "size": 2, "variables": ["a", "b"],
                "matrix": [[2, 1, 5], [1, 1, 3]], "solution": {"a": 2, "b": 1}}"#,
        );
        let state = level.initial_state().unwrap();
        assert_eq!(state.get(1, 2).unwrap(), &Fraction::from(3));
        assert_eq!(state.variable_names()[0], "a");
    }

    #[test]
    fn test_inverse_board_has_identity() {
        let level = parse(
            r#"{"id": 3, "kind": "inverse", "size": 2, "coefficients": [[1, 2], [3, 4]]}"#,
        );
        assert!(!level.is_singular());
        let state = level.initial_state().unwrap();
        assert_eq!(state.constant_columns(), 2);
        assert_eq!(state.display_rows()[1], vec!["3", "4", "0", "1"]);
    }

    #[test]
    fn test_singular_levels() {
        let level = parse(
            r#"{"id": 4, "kind": "elimination", "size": 2,
                "coefficients": [[2, 4], [1, 2]], "constants": [6, 3],
                "solution": null, "detIsZero": true}"#,
        );
        assert!(level.is_singular());
        level.validate().unwrap();

        let det = parse(
            r#"{"id": 5, "kind": "determinant", "size": 2,
                "matrix": [[1, 2], [2, 4]], "answer": 0}"#,
        );
        assert!(det.is_singular());
        det.validate().unwrap();
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let level = parse(
            r#"{"id": 6, "kind": "elimination", "size": 2,
                "coefficients": [[2, 1], [1]], "constants": [5, 3],
                "solution": {"x": 2, "y": 1}}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_rejects_variable_count_mismatch() {
        let level = parse(
            r#"{"id": 7, "kind": "elimination", "size": 2, "variables": ["x", "y", "z"],
                "coefficients": [[2, 1], [1, 1]], "constants": [5, 3],
                "solution": {"x": 2, "y": 1}}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_rejects_wrong_solution() {
        let level = parse(
            r#"{"id": 8, "kind": "elimination", "size": 2,
                "coefficients": [[2, 1], [1, 1]], "constants": [5, 3],
                "solution": {"x": 1, "y": 3}}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_rejects_singular_flag_mismatch() {
        let level = parse(
            r#"{"id": 9, "kind": "elimination", "size": 2,
                "coefficients": [[2, 1], [1, 1]], "constants": [5, 3], "solution": null}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_rejects_wrong_determinant() {
        let level = parse(
            r#"{"id": 10, "kind": "determinant", "size": 2,
                "matrix": [[3, 8], [4, 6]], "answer": 14}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_rejects_missing_constants() {
        let level = parse(
            r#"{"id": 11, "kind": "cramer", "size": 2, "matrix": [[2, 1], [1, 1]],
                "answers": {"x": 2, "y": 1}}"#,
        );
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_kind_inferred_when_missing() {
        let level = parse(
            r#"{"id": 14, "size": 2, "variables": ["x", "y"],
                "matrix": [[2, 1, 5], [1, 1, 3]], "solution": {"x": 2, "y": 1},
                "minSteps": 4, "detIsZero": false}"#,
        );
        assert_eq!(level.kind, LevelKind::Elimination);
        assert_eq!(level.min_steps, 4);
        let state = level.initial_state().unwrap();
        assert_eq!(state.constant_columns(), 1);

        let det = parse(r#"{"id": 15, "size": 2, "matrix": [[3, 8], [4, 6]], "answer": -14}"#);
        assert_eq!(det.kind, LevelKind::Determinant);
        det.validate().unwrap();

        let cramer = parse(
            r#"{"id": 16, "size": 2, "matrix": [[2, 1, 5], [1, 1, 3]],
                "answers": {"x": 2, "y": 1}}"#,
        );
        assert_eq!(cramer.kind, LevelKind::Cramer);
        cramer.validate().unwrap();
    }

    #[test]
    fn test_serialized_level_reads_back() {
        let level = crate::levels::builtin_level(203).unwrap();
        let json = serde_json::to_string(&level).unwrap();
        let back: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn test_rejects_oversized_system() {
        let level = parse(
            r#"{"id": 13, "kind": "elimination", "size": 4611686018427387904,
                "coefficients": [[2, 1], [1, 1]], "constants": [5, 3],
                "solution": {"x": 2, "y": 1}}"#,
        );
        assert!(level.variable_names().len() <= MAX_SIZE);
        assert!(matches!(level.validate(), Err(EngineError::MalformedLevel(_))));
        assert!(matches!(level.initial_state(), Err(EngineError::MalformedLevel(_))));
    }

    #[test]
    fn test_default_variable_names() {
        let level = parse(
            r#"{"id": 12, "kind": "determinant", "size": 5,
                "matrix": [[1,0,0,0,0],[0,1,0,0,0],[0,0,1,0,0],[0,0,0,1,0],[0,0,0,0,1]],
                "answer": 1}"#,
        );
        assert_eq!(level.variable_names(), vec!["x", "y", "z", "w", "x5"]);
        level.validate().unwrap();
    }
}
