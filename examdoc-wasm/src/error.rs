//! Result envelopes for the `_res` entry points.
//!
//! Success is `{ ok: true, value }`. Failure is
//! `{ ok: false, error: { code, message, data } }`, where `code` is a stable
//! string the editor switches on and `data` names the offending input.

use crate::interop::{new_obj, set_kv};
use wasm_bindgen::prelude::*;

/// Wraps a rendered SVG, compiled expression or sample buffer.
pub fn ok(value: JsValue) -> JsValue {
    let envelope = new_obj();
    set_kv(&envelope, "ok", &JsValue::TRUE);
    set_kv(&envelope, "value", &value);
    envelope.into()
}

fn fields(pairs: &[(&str, JsValue)]) -> JsValue {
    let data = new_obj();
    for (key, value) in pairs {
        set_kv(&data, key, value);
    }
    data.into()
}

fn failure(code: &'static str, message: impl Into<String>, data: JsValue) -> JsValue {
    let error = new_obj();
    set_kv(&error, "code", &JsValue::from_str(code));
    set_kv(&error, "message", &JsValue::from_str(&message.into()));
    set_kv(&error, "data", &data);
    let envelope = new_obj();
    set_kv(&envelope, "ok", &JsValue::FALSE);
    set_kv(&envelope, "error", &error.into());
    envelope.into()
}

/// An evaluation point or sampling bound was NaN or infinite.
pub fn non_finite(param: &str) -> JsValue {
    failure(
        "non_finite",
        format!("{param} must be a finite number"),
        fields(&[("param", JsValue::from_str(param))]),
    )
}

/// A graph or options payload that does not match the content model.
/// `detail` carries the deserializer's message.
pub fn invalid_json(what: &str, detail: String) -> JsValue {
    failure(
        "invalid_json",
        format!("{what} does not match the content model"),
        fields(&[("what", JsValue::from_str(what)), ("detail", JsValue::from_str(&detail))]),
    )
}

/// Authored LaTeX outside the supported function grammar.
pub fn invalid_expression(source: &str) -> JsValue {
    failure(
        "invalid_expression",
        "expression is not a supported function of x",
        fields(&[("source", JsValue::from_str(source))]),
    )
}

pub fn invalid_range(min: f64, max: f64) -> JsValue {
    failure(
        "invalid_range",
        "sampling range is reversed",
        fields(&[("min", JsValue::from_f64(min)), ("max", JsValue::from_f64(max))]),
    )
}
