//! Elementary row operations
//!
//! An [`Operation`] is what the player submits: swap two rows, scale one row,
//! or add a multiple of one row to another. Validation happens here so every
//! entry point (buttons, drag-and-drop, replays) goes through the same rules.

use crate::error::{EngineError, Result};
use crate::fraction::Fraction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Exchange two rows
    Swap { row_a: usize, row_b: usize },
    /// Multiply a row by a non-zero factor
    Scale { row: usize, factor: Fraction },
    /// `target_row <- target_row + factor * source_row`
    Combine {
        target_row: usize,
        source_row: usize,
        factor: Fraction,
    },
}

impl Operation {
    pub fn swap(row_a: usize, row_b: usize) -> Operation {
        Operation::Swap { row_a, row_b }
    }

    pub fn scale(row: usize, factor: Fraction) -> Operation {
        Operation::Scale { row, factor }
    }

    pub fn combine(target_row: usize, source_row: usize, factor: Fraction) -> Operation {
        Operation::Combine {
            target_row,
            source_row,
            factor,
        }
    }

    /// Check the operation against a matrix with `row_count` rows.
    ///
    /// Self-swaps are rejected just like zero factors: none of them change
    /// the matrix, and an accepted operation always costs a step.
    pub fn validate(&self, row_count: usize) -> Result<()> {
        let check_row = |row: usize| {
            if row >= row_count {
                Err(EngineError::invalid(format!(
                    "row {} does not exist (matrix has {} rows)",
                    row, row_count
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Operation::Swap { row_a, row_b } => {
                check_row(*row_a)?;
                check_row(*row_b)?;
                if row_a == row_b {
                    return Err(EngineError::invalid("cannot swap a row with itself"));
                }
            }
            Operation::Scale { row, factor } => {
                check_row(*row)?;
                if factor.is_zero() {
                    return Err(EngineError::invalid("scale factor must be non-zero"));
                }
            }
            Operation::Combine {
                target_row,
                source_row,
                factor,
            } => {
                check_row(*target_row)?;
                check_row(*source_row)?;
                if target_row == source_row {
                    return Err(EngineError::invalid(
                        "target and source rows of a combine must differ",
                    ));
                }
                if factor.is_zero() {
                    return Err(EngineError::invalid("combine factor must be non-zero"));
                }
            }
        }
        Ok(())
    }

    /// The operation that undoes this one
    pub fn inverse(&self) -> Result<Operation> {
        Ok(match self {
            Operation::Swap { row_a, row_b } => Operation::swap(*row_a, *row_b),
            Operation::Scale { row, factor } => Operation::scale(*row, factor.reciprocal()?),
            Operation::Combine {
                target_row,
                source_row,
                factor,
            } => Operation::combine(*target_row, *source_row, factor.negate()),
        })
    }

    /// How the operation scales the determinant of a square matrix
    pub fn determinant_factor(&self) -> Fraction {
        match self {
            Operation::Swap { .. } => Fraction::from(-1),
            Operation::Scale { factor, .. } => factor.clone(),
            Operation::Combine { .. } => Fraction::one(),
        }
    }
}

/// Textbook notation, rows numbered from 1: `R1 <-> R2`, `R2 -> 1/2 R2`,
/// `R2 -> R2 + -3 R1`
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Swap { row_a, row_b } => write!(f, "R{} <-> R{}", row_a + 1, row_b + 1),
            Operation::Scale { row, factor } => {
                write!(f, "R{} -> {} R{}", row + 1, factor, row + 1)
            }
            Operation::Combine {
                target_row,
                source_row,
                factor,
            } => write!(
                f,
                "R{} -> R{} + {} R{}",
                target_row + 1,
                target_row + 1,
                factor,
                source_row + 1
            ),
        }
    }
}
