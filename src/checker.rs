//! Solution checking
//!
//! Decides, for the current board or a submitted answer, whether the level is
//! finished. Singular levels finish with [`Verdict::SpecialCaseAcknowledged`]
//! once the player has exposed the missing unique solution; that is a win,
//! not a failure.

use crate::error::{EngineError, Result};
use crate::fraction::Fraction;
use crate::level::{Level, LevelKind};
use crate::matrix::{MatrixState, Solution};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Pending,
    Solved,
    SpecialCaseAcknowledged,
}

/// Determinants used by Cramer's rule: `x_i = det(A_i) / det(A)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CramerBreakdown {
    pub determinant: Fraction,
    pub variable_determinants: Vec<(String, Fraction)>,
}

impl CramerBreakdown {
    /// Variable values, or `None` when `det(A) = 0`
    pub fn values(&self) -> Option<BTreeMap<String, Fraction>> {
        self.variable_determinants
            .iter()
            .map(|(name, det)| Some((name.clone(), det.divide(&self.determinant).ok()?)))
            .collect()
    }
}

/// Evaluate the board after an accepted row operation
pub fn check_state(level: &Level, state: &MatrixState) -> Verdict {
    match level.kind {
        LevelKind::Elimination => check_elimination(level, state),
        LevelKind::Inverse => check_inverse(level, state),
        LevelKind::Determinant => {
            // Scratch row operations can expose a zero row, which settles a
            // singular determinant without any submission.
            if level.is_singular() && state.is_row_echelon() && state.has_zero_coefficient_row() {
                Verdict::SpecialCaseAcknowledged
            } else {
                Verdict::Pending
            }
        }
        LevelKind::Cramer => Verdict::Pending,
    }
}

fn check_elimination(level: &Level, state: &MatrixState) -> Verdict {
    let Some(solution) = state.extract_solution() else {
        return Verdict::Pending;
    };

    if solution.is_special() {
        if level.is_singular() {
            return Verdict::SpecialCaseAcknowledged;
        }
        warn!(
            level = level.id,
            ?solution,
            "reduced board has no unique solution on a regular level"
        );
        return Verdict::Pending;
    }

    match &level.solution {
        Some(expected) if matches_expected(expected, &solution) => Verdict::Solved,
        _ => {
            warn!(level = level.id, ?solution, "reduced board disagrees with level data");
            Verdict::Pending
        }
    }
}

fn check_inverse(level: &Level, state: &MatrixState) -> Verdict {
    if let Some(inverse) = state.inverse_block() {
        let constants = level.system().ok().and_then(|s| s.constants);
        return match (&level.solution, constants) {
            (Some(expected), Some(b)) => {
                let x: Vec<Fraction> = inverse
                    .iter()
                    .map(|row| {
                        row.iter()
                            .zip(&b)
                            .fold(Fraction::zero(), |acc, (a, v)| acc.add(&a.multiply(v)))
                    })
                    .collect();
                let all_match = state
                    .variable_names()
                    .iter()
                    .zip(&x)
                    .all(|(name, value)| expected.get(name).is_some_and(|e| e.equals(value)));
                if all_match {
                    Verdict::Solved
                } else {
                    warn!(level = level.id, "inverse times constants disagrees with level data");
                    Verdict::Pending
                }
            }
            (None, Some(_)) => {
                warn!(level = level.id, "inverted a matrix declared singular");
                Verdict::Pending
            }
            (_, None) => Verdict::Solved,
        };
    }

    if level.is_singular() && state.is_reduced_row_echelon() && state.has_zero_coefficient_row() {
        Verdict::SpecialCaseAcknowledged
    } else {
        Verdict::Pending
    }
}

fn matches_expected(expected: &BTreeMap<String, Fraction>, solution: &Solution) -> bool {
    match solution {
        Solution::Unique { assignments } => {
            assignments.len() == expected.len()
                && assignments
                    .iter()
                    .all(|a| expected.get(&a.variable).is_some_and(|e| e.equals(&a.value)))
        }
        _ => false,
    }
}

/// Compare a submitted determinant with the level's answer
pub fn check_determinant(level: &Level, value: &Fraction) -> Verdict {
    let expected = level.answer.clone().unwrap_or_default();
    if !value.equals(&expected) {
        return Verdict::Pending;
    }
    if level.is_singular() {
        Verdict::SpecialCaseAcknowledged
    } else {
        Verdict::Solved
    }
}

/// Compare submitted Cramer's-rule values; every variable must match
pub fn check_cramer(level: &Level, values: &BTreeMap<String, Fraction>) -> Verdict {
    match &level.answers {
        Some(expected)
            if expected.len() == values.len()
                && expected
                    .iter()
                    .all(|(name, e)| values.get(name).is_some_and(|v| v.equals(e))) =>
        {
            Verdict::Solved
        }
        _ => Verdict::Pending,
    }
}

/// The player's claim that the system has no unique solution
pub fn check_no_unique_solution(level: &Level) -> Verdict {
    if level.is_singular() {
        Verdict::SpecialCaseAcknowledged
    } else {
        Verdict::Pending
    }
}

/// `det(A)` and `det(A_i)` for an augmented board
pub fn cramer_breakdown(state: &MatrixState) -> Result<CramerBreakdown> {
    let determinant = state.determinant()?;
    let constants = state
        .constants_column()
        .ok_or_else(|| EngineError::invalid("Cramer's rule needs a constants column"))?;

    let variable_determinants = state
        .variable_names()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let replaced = state.with_column_replaced(col, &constants)?;
            Ok((name.clone(), replaced.determinant()?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CramerBreakdown {
        determinant,
        variable_determinants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::builtin_level;
    use crate::operation::Operation;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new_raw(n, d)
    }

    fn play(level: &Level, ops: &[Operation]) -> MatrixState {
        ops.iter().fold(level.initial_state().unwrap(), |state, op| {
            state.apply_operation(op).unwrap()
        })
    }

    #[test]
    fn test_elimination_solved() {
        let level = builtin_level(101).unwrap();
        let start = level.initial_state().unwrap();
        assert_eq!(check_state(&level, &start), Verdict::Pending);

        let done = play(
            &level,
            &[
                Operation::combine(0, 1, frac(-1, 1)),
                Operation::combine(1, 0, frac(-1, 1)),
            ],
        );
        assert_eq!(check_state(&level, &done), Verdict::Solved);
    }

    #[test]
    fn test_elimination_singular() {
        let level = builtin_level(105).unwrap();
        let done = play(
            &level,
            &[
                Operation::combine(1, 0, frac(-1, 2)),
                Operation::scale(0, frac(1, 2)),
            ],
        );
        assert_eq!(check_state(&level, &done), Verdict::SpecialCaseAcknowledged);

        let inconsistent = builtin_level(106).unwrap();
        let done = play(&inconsistent, &[Operation::combine(1, 0, frac(-2, 1))]);
        assert_eq!(check_state(&inconsistent, &done), Verdict::SpecialCaseAcknowledged);
    }

    #[test]
    fn test_inverse_levels() {
        let level = builtin_level(201).unwrap();
        let done = play(
            &level,
            &[
                Operation::combine(0, 1, frac(-1, 1)),
                Operation::combine(1, 0, frac(-1, 1)),
            ],
        );
        assert_eq!(check_state(&level, &done), Verdict::Solved);

        let singular = builtin_level(203).unwrap();
        let done = play(&singular, &[Operation::combine(1, 0, frac(-2, 1))]);
        assert_eq!(check_state(&singular, &done), Verdict::SpecialCaseAcknowledged);

        // [[4, 7], [2, 6]] without constants: reaching I is the goal
        let plain = builtin_level(204).unwrap();
        let done = play(
            &plain,
            &[
                Operation::scale(0, frac(1, 4)),
                Operation::combine(1, 0, frac(-2, 1)),
                Operation::scale(1, frac(2, 5)),
                Operation::combine(0, 1, frac(-7, 4)),
            ],
        );
        assert_eq!(check_state(&plain, &done), Verdict::Solved);
        assert_eq!(
            done.inverse_block().unwrap(),
            vec![
                vec![frac(3, 5), frac(-7, 10)],
                vec![frac(-1, 5), frac(2, 5)]
            ]
        );
    }

    #[test]
    fn test_determinant_submission() {
        let level = builtin_level(401).unwrap();
        assert_eq!(check_determinant(&level, &frac(-14, 1)), Verdict::Solved);
        assert_eq!(check_determinant(&level, &frac(14, 1)), Verdict::Pending);

        let singular = builtin_level(403).unwrap();
        assert_eq!(
            check_determinant(&singular, &Fraction::zero()),
            Verdict::SpecialCaseAcknowledged
        );
    }

    #[test]
    fn test_determinant_zero_row() {
        let level = builtin_level(403).unwrap();
        let done = play(
            &level,
            &[
                Operation::combine(1, 0, frac(-4, 1)),
                Operation::combine(2, 0, frac(-7, 1)),
                Operation::combine(2, 1, frac(-2, 1)),
            ],
        );
        assert_eq!(check_state(&level, &done), Verdict::SpecialCaseAcknowledged);
    }

    #[test]
    fn test_cramer() {
        let level = builtin_level(302).unwrap();
        let state = level.initial_state().unwrap();
        let breakdown = cramer_breakdown(&state).unwrap();
        assert_eq!(breakdown.determinant, frac(-21, 1));

        let values = breakdown.values().unwrap();
        assert_eq!(check_cramer(&level, &values), Verdict::Solved);

        let mut wrong = values.clone();
        wrong.insert("z".to_string(), frac(2, 1));
        assert_eq!(check_cramer(&level, &wrong), Verdict::Pending);

        let singular = builtin_level(303).unwrap();
        let breakdown = cramer_breakdown(&singular.initial_state().unwrap()).unwrap();
        assert!(breakdown.determinant.is_zero());
        assert_eq!(breakdown.values(), None);
        assert_eq!(check_no_unique_solution(&singular), Verdict::SpecialCaseAcknowledged);
        assert_eq!(check_no_unique_solution(&level), Verdict::Pending);
    }
}
