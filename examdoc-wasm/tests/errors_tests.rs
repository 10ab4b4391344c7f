use examdoc_wasm::{compile_expression_res, render_graph_svg_res, Expression};
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn is_err(v: &JsValue, code: &str) -> bool {
    if let Ok(ok) =
        Reflect::get(v, &JsValue::from_str("ok")).and_then(|x| x.as_bool().ok_or(JsValue::NULL))
    {
        if ok {
            return false;
        }
        if let Ok(err) = Reflect::get(v, &JsValue::from_str("error")) {
            if let Ok(c) = Reflect::get(&err, &JsValue::from_str("code")) {
                return c.as_string().map_or(false, |s| s == code);
            }
        }
    }
    false
}

fn is_ok(v: &JsValue) -> bool {
    Reflect::get(v, &JsValue::from_str("ok")).ok().and_then(|x| x.as_bool()).unwrap_or(false)
}

#[wasm_bindgen_test]
fn uncompilable_expression_is_typed_error() {
    let r = compile_expression_res(r"\alpha + x");
    assert!(is_err(&r, "invalid_expression"));
    let data = Reflect::get(&Reflect::get(&r, &JsValue::from_str("error")).unwrap(), &JsValue::from_str("data")).unwrap();
    let source = Reflect::get(&data, &JsValue::from_str("source")).unwrap();
    assert_eq!(source.as_string().as_deref(), Some(r"\alpha + x"));
    assert!(is_ok(&compile_expression_res(r"\frac{x}{2}")));
}

#[wasm_bindgen_test]
fn expression_argument_validation() {
    let e = Expression::compile("x^2").expect("compiles");
    assert!(is_err(&e.eval_res(f64::NAN), "non_finite"));
    assert!(is_err(&e.sample_res(f64::INFINITY, 1.0), "non_finite"));
    assert!(is_err(&e.sample_res(2.0, 1.0), "invalid_range"));
    assert!(is_ok(&e.sample_res(0.0, 1.0)));
}

#[wasm_bindgen_test]
fn malformed_graph_is_invalid_json() {
    let r = render_graph_svg_res(JsValue::from_str("{\"width\": "), JsValue::UNDEFINED);
    assert!(is_err(&r, "invalid_json"));
    let r = render_graph_svg_res(JsValue::from_str(r#"{"axes": {"xMin": "left"}}"#), JsValue::UNDEFINED);
    assert!(is_err(&r, "invalid_json"));
    let ok = render_graph_svg_res(JsValue::from_str("{}"), JsValue::UNDEFINED);
    assert!(is_ok(&ok));
    let svg = Reflect::get(&ok, &JsValue::from_str("value")).unwrap().as_string().unwrap();
    assert!(svg.starts_with("<svg"));
}
