//! Property-based tests for row operations and solution extraction.
//!
//! Generates small augmented systems with rational entries and checks the
//! algebraic guarantees the game relies on: states are values, every
//! operation can be undone by its inverse, zero factors never count as a
//! step, and reduced boards always classify.

use proptest::prelude::*;
use rowquest_core::level::{Level, LevelKind};
use rowquest_core::{
    EngineError, Fraction, GameSession, MatrixState, Operation, SessionConfig, Solution,
};

const NAMES: [&str; 3] = ["x", "y", "z"];

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_fraction() -> impl Strategy<Value = Fraction> {
    (-9i64..=9, 1i64..=4).prop_map(|(n, d)| Fraction::new_raw(n, d))
}

fn arb_nonzero_fraction() -> impl Strategy<Value = Fraction> {
    (1i64..=9, 1i64..=4, any::<bool>()).prop_map(|(n, d, neg)| {
        Fraction::new_raw(if neg { -n } else { n }, d)
    })
}

/// `n x (n+1)` augmented system with `n` in 2..=3
fn arb_system() -> impl Strategy<Value = MatrixState> {
    (2usize..=3).prop_flat_map(|n| {
        let row = prop::collection::vec(arb_fraction(), n + 1);
        prop::collection::vec(row, n).prop_map(move |rows| {
            let names = NAMES[..n].iter().map(|s| s.to_string()).collect();
            MatrixState::new(rows, names, 1).unwrap()
        })
    })
}

fn arb_operation(rows: usize) -> impl Strategy<Value = Operation> {
    let distinct = (0..rows, 1..rows).prop_map(move |(a, offset)| (a, (a + offset) % rows));
    prop_oneof![
        distinct.clone().prop_map(|(a, b)| Operation::swap(a, b)),
        (0..rows, arb_nonzero_fraction()).prop_map(|(r, f)| Operation::scale(r, f)),
        (distinct, arb_nonzero_fraction()).prop_map(|((t, s), f)| Operation::combine(t, s, f)),
    ]
}

fn arb_system_and_ops() -> impl Strategy<Value = (MatrixState, Vec<Operation>)> {
    arb_system().prop_flat_map(|state| {
        let ops = prop::collection::vec(arb_operation(state.row_count()), 1..8);
        (Just(state), ops)
    })
}

/// Gauss-Jordan elimination driven through the public operations
fn reduce(mut state: MatrixState) -> MatrixState {
    let rows = state.row_count();
    let mut pivot_row = 0;
    for col in 0..state.variable_count() {
        if pivot_row == rows {
            break;
        }
        let Some(found) = (pivot_row..rows).find(|&r| !state.get(r, col).unwrap().is_zero()) else {
            continue;
        };
        if found != pivot_row {
            state = state.apply_operation(&Operation::swap(found, pivot_row)).unwrap();
        }
        let pivot = state.get(pivot_row, col).unwrap().clone();
        if !pivot.is_one() {
            state = state
                .apply_operation(&Operation::scale(pivot_row, pivot.reciprocal().unwrap()))
                .unwrap();
        }
        for other in 0..rows {
            let entry = state.get(other, col).unwrap().clone();
            if other != pivot_row && !entry.is_zero() {
                state = state
                    .apply_operation(&Operation::combine(other, pivot_row, entry.negate()))
                    .unwrap();
            }
        }
        pivot_row += 1;
    }
    state
}

/// Determinant level over the coefficient block of `state`
fn determinant_level(state: &MatrixState) -> Level {
    let coefficients = state.coefficient_matrix();
    let det = MatrixState::new(coefficients.clone(), state.variable_names().to_vec(), 0)
        .unwrap()
        .determinant()
        .unwrap();
    Level {
        id: 1,
        title: "generated".to_string(),
        kind: LevelKind::Determinant,
        size: coefficients.len(),
        variables: Vec::new(),
        coefficients: Some(coefficients),
        constants: None,
        matrix: None,
        solution: None,
        det_is_zero: det.is_zero(),
        answer: Some(det),
        answers: None,
        min_steps: 0,
    }
}

// ============================================================================
// Row operation properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Applying operations never changes the input state.
    #[test]
    fn apply_leaves_input_untouched((state, ops) in arb_system_and_ops()) {
        let before = state.clone();
        let mut current = state.clone();
        for op in &ops {
            let next = current.apply_operation(op).unwrap();
            prop_assert_eq!(&state, &before);
            current = next;
        }
        prop_assert_eq!(state, before);
    }

    /// An operation followed by its inverse restores the board exactly.
    #[test]
    fn inverse_round_trip((state, ops) in arb_system_and_ops()) {
        for op in &ops {
            let applied = state.apply_operation(op).unwrap();
            let restored = applied.apply_operation(&op.inverse().unwrap()).unwrap();
            prop_assert_eq!(&restored, &state);
        }
    }

    /// A zero scale factor is rejected without touching the session.
    #[test]
    fn zero_scale_is_rejected(state in arb_system(), row in 0usize..3) {
        let row = row % state.row_count();
        prop_assert!(matches!(
            state.apply_operation(&Operation::scale(row, Fraction::zero())),
            Err(EngineError::InvalidOperation(_))
        ));

        let level = determinant_level(&state);
        let mut session = GameSession::load(level, SessionConfig::default()).unwrap();
        let board = session.current_state().clone();
        prop_assert!(session.apply(Operation::scale(row, Fraction::zero())).is_err());
        prop_assert_eq!(session.step_count(), 0);
        prop_assert_eq!(session.current_state(), &board);
    }

    /// Scaling by `k` scales the determinant by `k`; swaps flip its sign.
    #[test]
    fn determinant_tracks_operations((state, ops) in arb_system_and_ops()) {
        let names = state.variable_names().to_vec();
        let square = MatrixState::new(state.coefficient_matrix(), names, 0).unwrap();
        let det = square.determinant().unwrap();
        for op in &ops {
            let next = square.apply_operation(op).unwrap();
            prop_assert_eq!(next.determinant().unwrap(), det.multiply(&op.determinant_factor()));
        }
    }
}

// ============================================================================
// Solution extraction properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Extraction is pure and repeatable, and any reduced board classifies.
    #[test]
    fn extraction_is_idempotent(state in arb_system()) {
        prop_assert_eq!(state.extract_solution(), state.extract_solution());

        let reduced = reduce(state);
        prop_assert!(reduced.is_reduced_row_echelon());
        let first = reduced.extract_solution();
        prop_assert!(first.is_some());
        prop_assert_eq!(&first, &reduced.extract_solution());
        prop_assert_eq!(&first, &reduce(reduced.clone()).extract_solution());
    }

    /// A unique solution satisfies every starting equation.
    #[test]
    fn unique_solution_satisfies_system(state in arb_system()) {
        let reduced = reduce(state.clone());
        if let Some(Solution::Unique { assignments }) = reduced.extract_solution() {
            let n = state.variable_count();
            for row in state.rows() {
                let lhs = row[..n]
                    .iter()
                    .zip(&assignments)
                    .fold(Fraction::zero(), |acc, (a, v)| acc.add(&a.multiply(&v.value)));
                prop_assert_eq!(&lhs, &row[n]);
            }
        }
    }
}
