//! Game session state machine
//!
//! A [`GameSession`] owns one attempt at one level:
//!
//! ```text
//! Loading -> InProgress -> Solved
//!                      \-> SpecialCaseAcknowledged
//!                      \-> Stuck            (only with a step limit)
//! ```
//!
//! Every row operation, including drag-and-drop swaps, goes through
//! [`GameSession::apply`], which validates it, records it in the history and
//! re-runs the solution checker. Terminal states reject further moves until
//! [`GameSession::restart`].

use crate::checker::{self, CramerBreakdown, Verdict};
use crate::error::{EngineError, Result};
use crate::fraction::Fraction;
use crate::lesson::{lesson_from_operations, LessonPlayer};
use crate::level::{Level, LevelKind};
use crate::levels;
use crate::matrix::{MatrixState, MatrixView};
use crate::operation::Operation;
use crate::scorer::{ProgressScorer, Rating, ScoringConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info};
use wasm_bindgen::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Loading,
    InProgress,
    Solved,
    Stuck,
    SpecialCaseAcknowledged,
}

impl Status {
    fn from_verdict(verdict: Verdict) -> Status {
        match verdict {
            Verdict::Pending => Status::InProgress,
            Verdict::Solved => Status::Solved,
            Verdict::SpecialCaseAcknowledged => Status::SpecialCaseAcknowledged,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Loading => "loading",
            Status::InProgress => "inProgress",
            Status::Solved => "solved",
            Status::Stuck => "stuck",
            Status::SpecialCaseAcknowledged => "specialCaseAcknowledged",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub scoring: ScoringConfig,
    /// Accepted steps after which an unfinished session becomes `Stuck`
    pub step_limit: Option<u32>,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        if self.step_limit == Some(0) {
            return Err(EngineError::InvalidConfig(
                "stepLimit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One accepted operation and the board it produced. An undo is recorded as
/// the inverse of the operation it takes back.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub operation: Operation,
    pub state: MatrixState,
}

/// Result of a move or answer, as reported to the UI
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub accepted: bool,
    pub status: Status,
    pub step_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Read-only view handed to renderers after every change
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub level_id: u32,
    pub title: String,
    pub kind: LevelKind,
    pub status: Status,
    pub step_count: u32,
    pub min_steps: u32,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub can_undo: bool,
    pub history: Vec<String>,
    #[serde(flatten)]
    pub matrix: MatrixView,
}

#[wasm_bindgen]
pub struct GameSession {
    level: Level,
    initial: MatrixState,
    current: MatrixState,
    history: Vec<HistoryEntry>,
    /// Inverse of each undoable operation and the board before it
    undo_stack: Vec<(Operation, MatrixState)>,
    scorer: ProgressScorer,
    config: SessionConfig,
    status: Status,
    /// Wrong answer submissions
    attempts: u32,
}

impl GameSession {
    /// Start a session on a level.
    ///
    /// Fails with `MalformedLevel` when the record breaks its invariants, in
    /// which case the level cannot be played at all.
    pub fn load(level: Level, config: SessionConfig) -> Result<GameSession> {
        config.validate()?;
        debug!(level = level.id, kind = %level.kind, "loading level");

        let initial = level.initial_state()?;
        let scorer = ProgressScorer::new(level.min_steps, config.scoring.clone());
        let mut session = GameSession {
            current: initial.clone(),
            initial,
            history: Vec::new(),
            undo_stack: Vec::new(),
            scorer,
            config,
            status: Status::Loading,
            attempts: 0,
            level,
        };
        session.transition(Status::InProgress);
        Ok(session)
    }

    pub fn from_builtin(id: u32, config: SessionConfig) -> Result<GameSession> {
        let level = levels::builtin_level(id)
            .ok_or_else(|| EngineError::malformed(format!("no built-in level with id {}", id)))?;
        GameSession::load(level, config)
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn current_state(&self) -> &MatrixState {
        &self.current
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn step_count(&self) -> u32 {
        self.scorer.step_count()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Efficiency rating, once the level is finished
    pub fn rating(&self) -> Option<Rating> {
        match self.status {
            Status::Solved | Status::SpecialCaseAcknowledged => Some(self.scorer.rate()),
            _ => None,
        }
    }

    fn transition(&mut self, to: Status) {
        if self.status != to {
            info!(
                level = self.level.id,
                from = %self.status,
                to = %to,
                steps = self.step_count(),
                "session status changed"
            );
            self.status = to;
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.status != Status::InProgress {
            return Err(EngineError::invalid(format!(
                "level is {}, restart to keep playing",
                self.status
            )));
        }
        Ok(())
    }

    fn report(&self, accepted: bool, reason: Option<String>) -> MoveReport {
        MoveReport {
            accepted,
            status: self.status,
            step_count: self.step_count(),
            rating: self.rating(),
            reason,
        }
    }

    /// Validate and apply a row operation.
    ///
    /// A rejected operation leaves the board, history and step count
    /// untouched.
    pub fn apply(&mut self, op: Operation) -> Result<MoveReport> {
        self.ensure_in_progress()?;
        if self.level.kind == LevelKind::Cramer {
            return Err(EngineError::invalid(
                "Cramer's rule levels are answered with determinants, not row operations",
            ));
        }

        let next = match self.current.apply_operation(&op) {
            Ok(next) => next,
            Err(err) => {
                if err.is_recoverable() {
                    debug!(level = self.level.id, %op, %err, "rejected operation");
                } else {
                    error!(level = self.level.id, %op, %err, "operation failed after validation");
                }
                return Err(err);
            }
        };

        let inverse = op.inverse()?;
        debug!(level = self.level.id, %op, "applied operation");
        let before = std::mem::replace(&mut self.current, next);
        self.undo_stack.push((inverse, before));
        self.record(op);

        Ok(self.report(true, None))
    }

    /// Append an accepted operation on the current board and re-check it
    fn record(&mut self, operation: Operation) {
        self.history.push(HistoryEntry {
            operation,
            state: self.current.clone(),
        });
        self.scorer.record_step();

        let mut status = Status::from_verdict(checker::check_state(&self.level, &self.current));
        if status == Status::InProgress
            && self
                .config
                .step_limit
                .is_some_and(|limit| self.step_count() >= limit)
        {
            status = Status::Stuck;
        }
        self.transition(status);
    }

    /// Drag-and-drop entry point; same rules and step cost as any swap
    pub fn swap_rows(&mut self, row_a: usize, row_b: usize) -> Result<MoveReport> {
        self.apply(Operation::swap(row_a, row_b))
    }

    /// Take back the last operation that has not been undone yet.
    ///
    /// The undo is appended to the history as the inverse operation and
    /// costs a step like any other move.
    pub fn undo(&mut self) -> Result<MoveReport> {
        self.ensure_in_progress()?;
        let (inverse, before) = self
            .undo_stack
            .pop()
            .ok_or_else(|| EngineError::invalid("nothing to undo"))?;

        debug!(level = self.level.id, op = %inverse, "undid operation");
        self.current = before;
        self.record(inverse);

        Ok(self.report(true, None))
    }

    /// Start the same level over with an empty history
    pub fn restart(&mut self) {
        self.transition(Status::Loading);
        self.current = self.initial.clone();
        self.history.clear();
        self.undo_stack.clear();
        self.scorer.reset();
        self.attempts = 0;
        self.transition(Status::InProgress);
    }

    fn settle_answer(&mut self, verdict: Verdict) -> MoveReport {
        match verdict {
            Verdict::Pending => {
                self.attempts += 1;
                debug!(level = self.level.id, attempts = self.attempts, "wrong answer");
                self.report(false, Some("answer does not match".to_string()))
            }
            _ => {
                self.transition(Status::from_verdict(verdict));
                self.report(true, None)
            }
        }
    }

    /// Answer a determinant level
    pub fn submit_determinant(&mut self, value: &Fraction) -> Result<MoveReport> {
        self.ensure_in_progress()?;
        if self.level.kind != LevelKind::Determinant {
            return Err(EngineError::invalid(format!(
                "{} levels do not take a determinant answer",
                self.level.kind
            )));
        }
        let verdict = checker::check_determinant(&self.level, value);
        Ok(self.settle_answer(verdict))
    }

    /// Answer a Cramer's rule level with one value per variable
    pub fn submit_cramer(&mut self, values: &BTreeMap<String, Fraction>) -> Result<MoveReport> {
        self.ensure_in_progress()?;
        if self.level.kind != LevelKind::Cramer {
            return Err(EngineError::invalid(format!(
                "{} levels do not take Cramer's rule answers",
                self.level.kind
            )));
        }
        let verdict = checker::check_cramer(&self.level, values);
        Ok(self.settle_answer(verdict))
    }

    /// Claim that the system has no unique solution.
    ///
    /// Only Cramer and determinant levels take the claim. Elimination and
    /// inverse levels are settled by reducing the board.
    pub fn declare_no_unique_solution(&mut self) -> Result<MoveReport> {
        self.ensure_in_progress()?;
        if !matches!(self.level.kind, LevelKind::Cramer | LevelKind::Determinant) {
            return Err(EngineError::invalid(format!(
                "{} levels are settled by reducing the board",
                self.level.kind
            )));
        }
        let verdict = checker::check_no_unique_solution(&self.level);
        Ok(self.settle_answer(verdict))
    }

    /// Cramer determinants of the current board
    pub fn cramer_breakdown(&self) -> Result<CramerBreakdown> {
        checker::cramer_breakdown(&self.current)
    }

    /// Lesson replaying the operations played so far
    pub fn replay_lesson(&self) -> LessonPlayer {
        let ops: Vec<Operation> = self.history.iter().map(|e| e.operation.clone()).collect();
        LessonPlayer::new(lesson_from_operations(&ops, self.current.column_count()))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level_id: self.level.id,
            title: self.level.title.clone(),
            kind: self.level.kind,
            status: self.status,
            step_count: self.step_count(),
            min_steps: self.scorer.min_steps(),
            attempts: self.attempts,
            rating: self.rating(),
            can_undo: self.status == Status::InProgress && !self.undo_stack.is_empty(),
            history: self
                .history
                .iter()
                .map(|e| e.operation.to_string())
                .collect(),
            matrix: self.current.view(),
        }
    }

    /// Turn a Rust-side result into the report JavaScript receives
    fn report_js(&self, result: Result<MoveReport>) -> JsValue {
        let report = result.unwrap_or_else(|err| self.report(false, Some(err.to_string())));
        to_js(&report)
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn config_from_js(config: JsValue) -> std::result::Result<SessionConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(SessionConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

// WASM bindings for JavaScript interop. Move methods never throw: rejected
// moves come back as `{ accepted: false, reason }`.

#[wasm_bindgen]
impl GameSession {
    /// Start a session from a level record and optional config
    #[wasm_bindgen(constructor)]
    pub fn new_js(level: JsValue, config: JsValue) -> std::result::Result<GameSession, JsValue> {
        let level: Level = serde_wasm_bindgen::from_value(level)
            .map_err(|e| JsValue::from(EngineError::malformed(e.to_string())))?;
        Ok(GameSession::load(level, config_from_js(config)?)?)
    }

    #[wasm_bindgen(js_name = fromBuiltin)]
    pub fn from_builtin_js(id: u32, config: JsValue) -> std::result::Result<GameSession, JsValue> {
        Ok(GameSession::from_builtin(id, config_from_js(config)?)?)
    }

    #[wasm_bindgen(getter, js_name = status)]
    pub fn status_js(&self) -> String {
        self.status.to_string()
    }

    #[wasm_bindgen(getter, js_name = stepCount)]
    pub fn step_count_js(&self) -> u32 {
        self.step_count()
    }

    #[wasm_bindgen(getter, js_name = attempts)]
    pub fn attempts_js(&self) -> u32 {
        self.attempts
    }

    #[wasm_bindgen(getter, js_name = levelId)]
    pub fn level_id(&self) -> u32 {
        self.level.id
    }

    /// Id of the following built-in level, if any
    #[wasm_bindgen(js_name = nextLevelId)]
    pub fn next_level_id(&self) -> Option<u32> {
        levels::next_level_id(self.level.id)
    }

    #[wasm_bindgen(js_name = applyOperation)]
    pub fn apply_operation_js(&mut self, op: JsValue) -> JsValue {
        let result = serde_wasm_bindgen::from_value::<Operation>(op)
            .map_err(|e| EngineError::invalid(e.to_string()))
            .and_then(|op| self.apply(op));
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = swapRows)]
    pub fn swap_rows_js(&mut self, row_a: usize, row_b: usize) -> JsValue {
        let result = self.swap_rows(row_a, row_b);
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = undo)]
    pub fn undo_js(&mut self) -> JsValue {
        let result = self.undo();
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = restart)]
    pub fn restart_js(&mut self) {
        self.restart();
    }

    #[wasm_bindgen(js_name = submitDeterminant)]
    pub fn submit_determinant_js(&mut self, value: JsValue) -> JsValue {
        let result = serde_wasm_bindgen::from_value::<Fraction>(value)
            .map_err(|e| EngineError::Parse(e.to_string()))
            .and_then(|value| self.submit_determinant(&value));
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = submitCramer)]
    pub fn submit_cramer_js(&mut self, values: JsValue) -> JsValue {
        let result = serde_wasm_bindgen::from_value::<BTreeMap<String, Fraction>>(values)
            .map_err(|e| EngineError::Parse(e.to_string()))
            .and_then(|values| self.submit_cramer(&values));
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = declareNoUniqueSolution)]
    pub fn declare_no_unique_solution_js(&mut self) -> JsValue {
        let result = self.declare_no_unique_solution();
        self.report_js(result)
    }

    #[wasm_bindgen(js_name = cramerBreakdown)]
    pub fn cramer_breakdown_js(&self) -> std::result::Result<JsValue, JsValue> {
        Ok(to_js(&self.cramer_breakdown()?))
    }

    #[wasm_bindgen(js_name = currentState)]
    pub fn current_state_js(&self) -> MatrixState {
        self.current.clone()
    }

    #[wasm_bindgen(js_name = replayLesson)]
    pub fn replay_lesson_js(&self) -> LessonPlayer {
        self.replay_lesson()
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot_js(&self) -> JsValue {
        to_js(&self.snapshot())
    }
}
