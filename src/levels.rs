//! Built-in level catalogue
//!
//! Level ids are grouped by method: 1xx elimination, 2xx inverse, 3xx
//! Cramer's rule, 4xx determinants. Every record passes [`Level::validate`].

use crate::fraction::Fraction;
use crate::level::{Level, LevelKind};
use std::collections::BTreeMap;

fn ints(rows: &[&[i64]]) -> Vec<Vec<Fraction>> {
    rows.iter()
        .map(|row| row.iter().map(|&v| Fraction::from(v)).collect())
        .collect()
}

fn assign(names: &[&str], values: &[(i64, i64)]) -> BTreeMap<String, Fraction> {
    names
        .iter()
        .zip(values)
        .map(|(name, &(n, d))| (name.to_string(), Fraction::new_raw(n, d)))
        .collect()
}

fn base(id: u32, title: &str, kind: LevelKind, coefficients: &[&[i64]], min_steps: u32) -> Level {
    Level {
        id,
        title: title.to_string(),
        kind,
        size: coefficients.len(),
        variables: Vec::new(),
        coefficients: Some(ints(coefficients)),
        constants: None,
        matrix: None,
        solution: None,
        answer: None,
        answers: None,
        min_steps,
        det_is_zero: false,
    }
}

fn with_constants(mut level: Level, constants: &[i64]) -> Level {
    level.constants = Some(constants.iter().map(|&v| Fraction::from(v)).collect());
    level
}

const XY: [&str; 2] = ["x", "y"];
const XYZ: [&str; 3] = ["x", "y", "z"];

pub fn elimination_levels() -> Vec<Level> {
    let kind = LevelKind::Elimination;
    vec![
        Level {
            solution: Some(assign(&XY, &[(2, 1), (1, 1)])),
            ..with_constants(base(101, "Two lines", kind, &[&[2, 1], &[1, 1]], 2), &[5, 3])
        },
        Level {
            solution: Some(assign(&XY, &[(1, 1), (2, 1)])),
            ..with_constants(base(102, "Clear the column", kind, &[&[1, 2], &[3, -1]], 3), &[5, 1])
        },
        Level {
            solution: Some(assign(&XYZ, &[(5, 1), (3, 1), (-2, 1)])),
            ..with_constants(
                base(103, "Three planes", kind, &[&[1, 1, 1], &[0, 2, 5], &[2, 5, -1]], 7),
                &[6, -4, 27],
            )
        },
        Level {
            coefficients: Some(vec![
                vec![Fraction::new_raw(1, 2), Fraction::new_raw(1, 3)],
                vec![Fraction::from(1), Fraction::from(-1)],
            ]),
            constants: Some(vec![Fraction::from(1), Fraction::new_raw(1, 2)]),
            solution: Some(assign(&XY, &[(7, 5), (9, 10)])),
            ..base(104, "Fractions", kind, &[&[0, 0], &[0, 0]], 4)
        },
        Level {
            det_is_zero: true,
            ..with_constants(base(105, "Same line twice", kind, &[&[2, 4], &[1, 2]], 2), &[6, 3])
        },
        Level {
            det_is_zero: true,
            ..with_constants(base(106, "Parallel lines", kind, &[&[1, 1], &[2, 2]], 1), &[2, 5])
        },
    ]
}

pub fn inverse_levels() -> Vec<Level> {
    let kind = LevelKind::Inverse;
    vec![
        Level {
            solution: Some(assign(&XY, &[(2, 1), (1, 1)])),
            ..with_constants(base(201, "First inverse", kind, &[&[2, 1], &[1, 1]], 2), &[5, 3])
        },
        Level {
            solution: Some(assign(&XY, &[(-1, 1), (1, 1)])),
            ..with_constants(base(202, "Halves appear", kind, &[&[1, 2], &[3, 4]], 4), &[1, 1])
        },
        Level {
            det_is_zero: true,
            ..with_constants(base(203, "No inverse", kind, &[&[1, 2], &[2, 4]], 1), &[3, 6])
        },
        base(204, "Just the inverse", kind, &[&[4, 7], &[2, 6]], 4),
    ]
}

pub fn cramer_levels() -> Vec<Level> {
    let kind = LevelKind::Cramer;
    vec![
        Level {
            answers: Some(assign(&XY, &[(2, 1), (1, 1)])),
            ..with_constants(
                base(301, "Ratio of determinants", kind, &[&[2, 1], &[1, 1]], 0),
                &[5, 3],
            )
        },
        Level {
            answers: Some(assign(&XYZ, &[(5, 1), (3, 1), (-2, 1)])),
            ..with_constants(
                base(302, "Four determinants", kind, &[&[1, 1, 1], &[0, 2, 5], &[2, 5, -1]], 0),
                &[6, -4, 27],
            )
        },
        Level {
            det_is_zero: true,
            ..with_constants(base(303, "Zero denominator", kind, &[&[1, 2], &[2, 4]], 0), &[3, 7])
        },
    ]
}

pub fn determinant_levels() -> Vec<Level> {
    let kind = LevelKind::Determinant;
    vec![
        Level {
            answer: Some(Fraction::from(-14)),
            ..base(401, "Cross multiply", kind, &[&[3, 8], &[4, 6]], 0)
        },
        Level {
            answer: Some(Fraction::from(-306)),
            ..base(402, "Expand a row", kind, &[&[6, 1, 1], &[4, -2, 5], &[2, 8, 7]], 0)
        },
        Level {
            answer: Some(Fraction::zero()),
            det_is_zero: true,
            ..base(403, "Hidden dependence", kind, &[&[1, 2, 3], &[4, 5, 6], &[7, 8, 9]], 3)
        },
        Level {
            answer: Some(Fraction::from(49)),
            ..base(404, "Signs matter", kind, &[&[2, -3, 1], &[2, 0, -1], &[1, 4, 5]], 0)
        },
    ]
}

/// Every built-in level, in play order
pub fn all_levels() -> Vec<Level> {
    let mut levels = elimination_levels();
    levels.extend(inverse_levels());
    levels.extend(cramer_levels());
    levels.extend(determinant_levels());
    levels
}

pub fn builtin_level(id: u32) -> Option<Level> {
    all_levels().into_iter().find(|level| level.id == id)
}

/// The level after `id` in play order
pub fn next_level_id(id: u32) -> Option<u32> {
    let levels = all_levels();
    let pos = levels.iter().position(|level| level.id == id)?;
    levels.get(pos + 1).map(|level| level.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_is_valid() {
        for level in all_levels() {
            if let Err(e) = level.validate() {
                panic!("level {} is invalid: {}", level.id, e);
            }
            level.initial_state().unwrap();
        }
    }

    #[test]
    fn test_ids_unique() {
        let levels = all_levels();
        let ids: HashSet<u32> = levels.iter().map(|l| l.id).collect();
        assert_eq!(ids.len(), levels.len());
    }

    #[test]
    fn test_lookup_and_order() {
        assert_eq!(builtin_level(103).unwrap().size, 3);
        assert!(builtin_level(999).is_none());
        assert_eq!(next_level_id(106), Some(201));
        assert_eq!(next_level_id(404), None);
    }

    #[test]
    fn test_singular_flags() {
        let singular: Vec<u32> = all_levels()
            .into_iter()
            .filter(Level::is_singular)
            .map(|l| l.id)
            .collect();
        assert_eq!(singular, vec![105, 106, 203, 303, 403]);
    }
}
