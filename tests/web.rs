//! JavaScript boundary tests, run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use js_sys::Reflect;
use rowquest_core::{Fraction, GameSession, LessonPlayer};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn field(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn rejected_swap_is_reported_not_thrown() {
    let mut session = GameSession::from_builtin_js(101, JsValue::UNDEFINED).unwrap();
    let report = session.swap_rows_js(0, 0);
    assert_eq!(field(&report, "accepted"), JsValue::FALSE);
    assert!(field(&report, "reason").is_string());
    assert_eq!(session.step_count_js(), 0);

    let report = session.swap_rows_js(0, 1);
    assert_eq!(field(&report, "accepted"), JsValue::TRUE);
    assert_eq!(field(&report, "stepCount").as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn operation_objects_from_js() {
    let mut session = GameSession::from_builtin_js(101, JsValue::NULL).unwrap();
    let op = js_sys::JSON::parse(
        r#"{"kind": "combine", "targetRow": 0, "sourceRow": 1, "factor": "-1"}"#,
    )
    .unwrap();
    let report = session.apply_operation_js(op);
    assert_eq!(field(&report, "status").as_string().as_deref(), Some("inProgress"));

    let op = js_sys::JSON::parse(
        r#"{"kind": "combine", "targetRow": 1, "sourceRow": 0, "factor": -1}"#,
    )
    .unwrap();
    let report = session.apply_operation_js(op);
    assert_eq!(field(&report, "status").as_string().as_deref(), Some("solved"));
    assert_eq!(field(&report, "rating").as_string().as_deref(), Some("perfect"));
}

#[wasm_bindgen_test]
fn malformed_level_throws() {
    let level = js_sys::JSON::parse(
        r#"{"id": 1, "kind": "elimination", "size": 2, "coefficients": [[1]]}"#,
    )
    .unwrap();
    assert!(GameSession::new_js(level, JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn snapshot_shape() {
    let session = GameSession::from_builtin_js(201, JsValue::UNDEFINED).unwrap();
    let snapshot = session.snapshot_js();
    assert_eq!(field(&snapshot, "levelId").as_f64(), Some(201.0));
    assert_eq!(field(&snapshot, "constantColumns").as_f64(), Some(2.0));
    assert_eq!(field(&snapshot, "canUndo"), JsValue::FALSE);
}

#[wasm_bindgen_test]
fn determinant_answer_as_string() {
    let mut session = GameSession::from_builtin_js(401, JsValue::UNDEFINED).unwrap();
    let report = session.submit_determinant_js(JsValue::from_str("-14"));
    assert_eq!(field(&report, "accepted"), JsValue::TRUE);
    assert_eq!(Fraction::from_string("-28/2").unwrap().to_string_repr(), "-14");
}

#[wasm_bindgen_test]
fn lesson_polling() {
    let ops = js_sys::JSON::parse(r#"[{"kind": "swap", "rowA": 0, "rowB": 1}]"#).unwrap();
    let mut player = LessonPlayer::from_operations_js(ops, 3).unwrap();
    let token = player.start_step(0).unwrap();
    assert_eq!(field(&player.poll(token), "state").as_string().as_deref(), Some("cue"));
    player.cancel();
    assert_eq!(field(&player.poll(token), "state").as_string().as_deref(), Some("cancelled"));
}
