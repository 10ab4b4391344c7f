use examdoc_wasm::{has_content, render_content_html, render_graph_svg, segments_to_plain_text, ContentView, Expression};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn text_segment(text: &str) -> JsValue {
    let o = Object::new();
    Reflect::set(&o, &"type".into(), &"text".into()).unwrap();
    Reflect::set(&o, &"text".into(), &text.into()).unwrap();
    o.into()
}

#[wasm_bindgen_test]
fn json_string_and_js_array_render_alike() {
    let from_string = render_content_html(
        JsValue::from_str(r#"[{"type":"text","text":"Hello"}]"#),
        JsValue::UNDEFINED,
    );
    let arr = Array::of1(&text_segment("Hello"));
    let from_array = render_content_html(arr.into(), JsValue::UNDEFINED);
    assert_eq!(from_string, from_array);
    assert!(from_string.contains(">Hello</span>"));
}

#[wasm_bindgen_test]
fn legacy_text_and_plain_text() {
    let input = JsValue::from_str("<p>Find $x$</p>");
    assert_eq!(segments_to_plain_text(input.clone()), "Find ");
    assert!(has_content(input));
    assert!(!has_content(JsValue::NULL));
    assert!(!has_content(JsValue::from_str(r#"[{"type":"math","latex":"x"}]"#)));
}

#[wasm_bindgen_test]
fn options_accept_string_or_object() {
    let graph = JsValue::from_str(r#"{"width": 400, "height": 200}"#);
    let by_string = render_graph_svg(graph.clone(), JsValue::from_str(r#"{"fitWidth": 200}"#));
    let opts = Object::new();
    Reflect::set(&opts, &"fitWidth".into(), &JsValue::from_f64(200.0)).unwrap();
    let by_object = render_graph_svg(graph.clone(), opts.into());
    assert_eq!(by_string, by_object);
    assert!(by_string.contains(r#"width="200" height="100""#));
    // positional arrays are not options
    let by_array = render_graph_svg(graph, Array::of1(&JsValue::from_f64(0.1)).into());
    assert!(by_array.contains(r#"width="400" height="200""#));
    assert_eq!(render_graph_svg(JsValue::from_str("nope"), JsValue::UNDEFINED), "");
}

#[wasm_bindgen_test]
fn expression_eval_and_sample() {
    let e = Expression::compile(r"y=\frac{1}{2}x^{2}").expect("compiles");
    assert_eq!(e.eval(2.0), 2.0);
    assert!(e.source().contains("(1)/(2)"));
    assert!(Expression::compile(r"\alpha").is_none());
    let reciprocal = Expression::compile(r"\frac{1}{x}").unwrap();
    assert!(reciprocal.eval(0.0).is_nan());
    let s = e.sample(0.0, 10.0);
    assert_eq!(s.length(), 121 * 2);
    assert_eq!(s.get_index(240), 10.0);
}

#[wasm_bindgen_test]
fn content_view_writes_html_until_destroyed() {
    let document = web_sys::window().unwrap().document().unwrap();
    let el = document.create_element("div").unwrap();
    let view = ContentView::new(el.clone(), JsValue::UNDEFINED, JsValue::from_str(r#"{"readyAttempts": 0}"#));
    view.render(JsValue::from_str(r#"[{"type":"text","text":"one"}]"#));
    assert!(el.inner_html().contains("one"));
    view.destroy();
    view.render(JsValue::from_str(r#"[{"type":"text","text":"two"}]"#));
    assert!(el.inner_html().contains("one"));
    assert!(!el.inner_html().contains("two"));
}
