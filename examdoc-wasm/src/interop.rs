use examdoc::content::ContentInput;
use examdoc::options::{RenderOptions, TypesetConfig};
use js_sys::{Array, Float64Array, Object, Reflect};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object { Object::new() }
pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}
pub fn arr_f64(slice: &[f64]) -> Float64Array {
    let arr = Float64Array::new_with_length(slice.len() as u32);
    arr.copy_from(slice); arr
}

/// Strings take the defensive string path (JSON or legacy text); arrays and
/// objects arrive as JSON values.
pub fn content_input(v: &JsValue) -> ContentInput {
    if let Some(s) = v.as_string() {
        return ContentInput::Str(s);
    }
    if v.is_undefined() || v.is_null() {
        return ContentInput::Json(serde_json::Value::Null);
    }
    match serde_wasm_bindgen::from_value::<serde_json::Value>(v.clone()) {
        Ok(json) => ContentInput::Json(json),
        Err(err) => {
            tracing::debug!(error = %err, "content value not convertible, treated as empty");
            ContentInput::Json(serde_json::Value::Null)
        }
    }
}

/// `undefined`, a JSON string or a plain object; unreadable means defaults.
/// Arrays are refused before serde can read them as positional fields.
fn lenient<T: DeserializeOwned + Default>(v: &JsValue, from_json: fn(&str) -> T) -> T {
    if v.is_undefined() || v.is_null() || Array::is_array(v) {
        return T::default();
    }
    if let Some(s) = v.as_string() {
        return from_json(&s);
    }
    serde_wasm_bindgen::from_value(v.clone()).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "options object ignored");
        T::default()
    })
}

pub fn render_options(v: &JsValue) -> RenderOptions {
    lenient(v, RenderOptions::from_json)
}

pub fn typeset_config(v: &JsValue) -> TypesetConfig {
    lenient(v, TypesetConfig::from_json)
}

/// A JSON string or object deserialized strictly.
pub fn strict<T: DeserializeOwned>(v: &JsValue) -> Result<T, String> {
    match v.as_string() {
        Some(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
        None => serde_wasm_bindgen::from_value(v.clone()).map_err(|e| e.to_string()),
    }
}
