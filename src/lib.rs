//! RowQuest Core - Rust/WASM engine for the RowQuest row-reduction game
//!
//! This crate provides:
//! - Exact rational arithmetic (arbitrary-precision fractions)
//! - Immutable matrix states with elementary row operations
//! - Solution checking for elimination, inverse, Cramer and determinant levels
//! - The game session state machine, scoring and the lesson sequencer

use wasm_bindgen::prelude::*;

pub mod checker;
pub mod error;
pub mod fraction;
pub mod lesson;
pub mod level;
pub mod levels;
pub mod logging;
pub mod matrix;
pub mod operation;
pub mod scorer;
pub mod session;

// Re-export main types for convenience
pub use error::{EngineError, Result};
pub use fraction::Fraction;
pub use lesson::{Cue, CueEffect, LessonPlayer, LessonPoll, LessonStep};
pub use level::{Level, LevelKind};
pub use matrix::{MatrixState, Solution};
pub use operation::Operation;
pub use scorer::{Rating, ScoringConfig};
pub use session::{GameSession, MoveReport, SessionConfig, SessionSnapshot, Status};

/// Initialize the WASM module
/// Call this once when loading the module to set up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages
    console_error_panic_hook::set_once();
    logging::install(logging::default_level());
}

/// Get the version of the rowquest-core library
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// All built-in level records, in play order
#[wasm_bindgen(js_name = builtinLevels)]
pub fn builtin_levels() -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&levels::all_levels())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Built-in level record by id
#[wasm_bindgen(js_name = builtinLevel)]
pub fn builtin_level(id: u32) -> std::result::Result<JsValue, JsValue> {
    let level = levels::builtin_level(id)
        .ok_or_else(|| EngineError::malformed(format!("no built-in level with id {}", id)))?;
    serde_wasm_bindgen::to_value(&level).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_reexports() {
        let session = GameSession::from_builtin(101, SessionConfig::default()).unwrap();
        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.level().kind, LevelKind::Elimination);
    }
}
