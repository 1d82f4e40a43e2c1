//! Lesson sequencer
//!
//! Lessons walk the player through row operations one step at a time. Each
//! step is a list of timed cues for the animator. Playback is pull-based:
//! the animator starts a step, receives a token, and polls with it until
//! the step finishes. Starting another step or cancelling bumps the
//! generation, so a stale token simply reads `Cancelled`.

use crate::error::{EngineError, Result};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wasm_bindgen::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CueEffect {
    Highlight,
    Unhighlight,
    Reveal,
    Hide,
    Pulse,
}

/// One animation instruction; `delay_ms` counts from the previous cue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    pub delay_ms: u32,
    pub target: String,
    pub effect: CueEffect,
}

impl Cue {
    pub fn new(delay_ms: u32, target: impl Into<String>, effect: CueEffect) -> Self {
        Cue {
            delay_ms,
            target: target.into(),
            effect,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    pub caption: String,
    pub cues: Vec<Cue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LessonPoll {
    Cue(Cue),
    Finished,
    Cancelled,
}

fn row_target(row: usize) -> String {
    format!("row-{}", row)
}

fn cell_target(row: usize, col: usize) -> String {
    format!("cell-{}-{}", row, col)
}

fn pulse_cells(row: usize, column_count: usize) -> impl Iterator<Item = Cue> {
    (0..column_count).map(move |col| Cue::new(150, cell_target(row, col), CueEffect::Pulse))
}

/// Cue sequence demonstrating a single row operation on a board with
/// `column_count` columns
pub fn demonstration(op: &Operation, column_count: usize) -> LessonStep {
    let mut cues = Vec::new();
    let caption = match op {
        Operation::Swap { row_a, row_b } => {
            cues.push(Cue::new(0, row_target(*row_a), CueEffect::Highlight));
            cues.push(Cue::new(0, row_target(*row_b), CueEffect::Highlight));
            cues.push(Cue::new(400, row_target(*row_a), CueEffect::Pulse));
            cues.push(Cue::new(0, row_target(*row_b), CueEffect::Pulse));
            cues.push(Cue::new(600, row_target(*row_a), CueEffect::Unhighlight));
            cues.push(Cue::new(0, row_target(*row_b), CueEffect::Unhighlight));
            format!("Swap rows {} and {}", row_a + 1, row_b + 1)
        }
        Operation::Scale { row, factor } => {
            cues.push(Cue::new(0, row_target(*row), CueEffect::Highlight));
            cues.push(Cue::new(300, "factor", CueEffect::Reveal));
            cues.extend(pulse_cells(*row, column_count));
            cues.push(Cue::new(400, "factor", CueEffect::Hide));
            cues.push(Cue::new(0, row_target(*row), CueEffect::Unhighlight));
            format!("Multiply row {} by {}", row + 1, factor)
        }
        Operation::Combine {
            target_row,
            source_row,
            factor,
        } => {
            cues.push(Cue::new(0, row_target(*source_row), CueEffect::Highlight));
            cues.push(Cue::new(300, row_target(*target_row), CueEffect::Highlight));
            cues.push(Cue::new(300, "factor", CueEffect::Reveal));
            cues.extend(pulse_cells(*target_row, column_count));
            cues.push(Cue::new(400, "factor", CueEffect::Hide));
            cues.push(Cue::new(0, row_target(*source_row), CueEffect::Unhighlight));
            cues.push(Cue::new(0, row_target(*target_row), CueEffect::Unhighlight));
            format!("Add {} times row {} to row {}", factor, source_row + 1, target_row + 1)
        }
    };
    LessonStep { caption, cues }
}

pub fn lesson_from_operations(ops: &[Operation], column_count: usize) -> Vec<LessonStep> {
    ops.iter().map(|op| demonstration(op, column_count)).collect()
}

#[wasm_bindgen]
#[derive(Clone, Debug)]
pub struct LessonPlayer {
    steps: Vec<LessonStep>,
    active: Option<usize>,
    /// Bumped on every start or cancel; the current token
    generation: u32,
    cursor: usize,
}

impl LessonPlayer {
    pub fn new(steps: Vec<LessonStep>) -> Self {
        LessonPlayer {
            steps,
            active: None,
            generation: 0,
            cursor: 0,
        }
    }

    pub fn steps(&self) -> &[LessonStep] {
        &self.steps
    }

    pub fn next_cue(&mut self, token: u32) -> LessonPoll {
        let Some(step) = self.active.filter(|_| token == self.generation) else {
            return LessonPoll::Cancelled;
        };
        match self.steps[step].cues.get(self.cursor) {
            Some(cue) => {
                self.cursor += 1;
                LessonPoll::Cue(cue.clone())
            }
            None => LessonPoll::Finished,
        }
    }
}

#[wasm_bindgen]
impl LessonPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new_js(steps: JsValue) -> std::result::Result<LessonPlayer, JsValue> {
        let steps: Vec<LessonStep> = serde_wasm_bindgen::from_value(steps)
            .map_err(|e| JsValue::from(EngineError::Parse(e.to_string())))?;
        Ok(LessonPlayer::new(steps))
    }

    /// Lesson demonstrating a list of operations
    #[wasm_bindgen(js_name = fromOperations)]
    pub fn from_operations_js(
        ops: JsValue,
        column_count: usize,
    ) -> std::result::Result<LessonPlayer, JsValue> {
        let ops: Vec<Operation> = serde_wasm_bindgen::from_value(ops)
            .map_err(|e| JsValue::from(EngineError::Parse(e.to_string())))?;
        Ok(LessonPlayer::new(lesson_from_operations(&ops, column_count)))
    }

    #[wasm_bindgen(getter, js_name = stepCount)]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn caption(&self, step: usize) -> Option<String> {
        self.steps.get(step).map(|s| s.caption.clone())
    }

    /// Begin playing step `step`, invalidating any earlier token
    #[wasm_bindgen(js_name = startStep)]
    pub fn start_step(&mut self, step: usize) -> Result<u32> {
        if step >= self.steps.len() {
            return Err(EngineError::invalid(format!(
                "lesson step {} does not exist (lesson has {} steps)",
                step,
                self.steps.len()
            )));
        }
        self.generation = self.generation.wrapping_add(1);
        self.active = Some(step);
        self.cursor = 0;
        debug!(step, token = self.generation, "lesson step started");
        Ok(self.generation)
    }

    #[wasm_bindgen(js_name = isCurrent)]
    pub fn is_current(&self, token: u32) -> bool {
        self.active.is_some() && token == self.generation
    }

    /// Next cue for `token`, or `{ state: "finished" | "cancelled" }`
    pub fn poll(&mut self, token: u32) -> JsValue {
        serde_wasm_bindgen::to_value(&self.next_cue(token)).unwrap_or(JsValue::NULL)
    }

    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            debug!(token = self.generation, "lesson cancelled");
        }
        self.generation = self.generation.wrapping_add(1);
    }
}
