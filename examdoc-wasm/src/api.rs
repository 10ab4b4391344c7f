use crate::{ContentView, Expression, MathJaxProvider};
use crate::interop::{arr_f64, content_input, render_options, strict, typeset_config};
use examdoc::content::parse_content;
use examdoc::graph::sample_function;
use examdoc::model::GraphSegment;
use examdoc::typeset::TypesetOutcome;
use js_sys::Float64Array;
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;
use crate::error;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Panic hook plus `tracing` output to the browser console. Call once.
#[wasm_bindgen]
pub fn init() {
    set_panic_hook();
    tracing_wasm::set_as_global_default();
}

// Content

#[wasm_bindgen]
pub fn render_content_html(input: JsValue, options: JsValue) -> String {
    examdoc::render_content_html(content_input(&input), &render_options(&options))
}

#[wasm_bindgen]
pub fn segments_to_plain_text(input: JsValue) -> String {
    examdoc::segments_to_plain_text(&parse_content(content_input(&input)))
}

#[wasm_bindgen]
pub fn has_content(input: JsValue) -> bool {
    examdoc::has_content(&parse_content(content_input(&input)))
}

/// Parsed segments as plain JS objects, for editors that want the model.
#[wasm_bindgen]
pub fn parse_content_segments(input: JsValue) -> JsValue {
    let segments = parse_content(content_input(&input));
    serde_wasm_bindgen::to_value(&segments).unwrap_or(JsValue::NULL)
}

// Graphs

#[wasm_bindgen]
pub fn render_graph_svg(graph: JsValue, options: JsValue) -> String {
    match strict::<GraphSegment>(&graph) {
        Ok(g) => examdoc::render_graph_svg(&g, &render_options(&options)),
        Err(e) => {
            tracing::debug!(error = e.as_str(), "graph ignored");
            String::new()
        }
    }
}

#[wasm_bindgen]
pub fn render_graph_svg_res(graph: JsValue, options: JsValue) -> JsValue {
    match strict::<GraphSegment>(&graph) {
        Ok(g) => error::ok(JsValue::from_str(&examdoc::render_graph_svg(&g, &render_options(&options)))),
        Err(e) => error::invalid_json("graph", e),
    }
}

#[wasm_bindgen]
pub fn compile_expression_res(latex: &str) -> JsValue {
    match Expression::rs_compile(latex) {
        Some(e) => error::ok(JsValue::from(e)),
        None => error::invalid_expression(latex),
    }
}

#[wasm_bindgen]
impl Expression {
    /// `None` (JS `undefined`) when the source does not compile.
    pub fn compile(latex: &str) -> Option<Expression> {
        Expression::rs_compile(latex)
    }
    /// Normalized infix source the evaluator was built from.
    pub fn source(&self) -> String {
        self.inner.source().to_string()
    }
    /// `NaN` where the expression has no finite value.
    pub fn eval(&self, x: f64) -> f64 {
        self.inner.eval_finite(x).unwrap_or(f64::NAN)
    }
    pub fn eval_res(&self, x: f64) -> JsValue {
        if !x.is_finite() {
            return error::non_finite("x");
        }
        error::ok(JsValue::from_f64(self.eval(x)))
    }
    /// Interleaved `[x0, y0, x1, y1, ...]`, non-finite samples dropped.
    pub fn sample(&self, min: f64, max: f64) -> Float64Array {
        let pts = sample_function(|x| self.inner.eval(x), min, max);
        let flat: Vec<f64> = pts.iter().flat_map(|p| [p.x, p.y]).collect();
        arr_f64(&flat)
    }
    pub fn sample_res(&self, min: f64, max: f64) -> JsValue {
        if !min.is_finite() {
            return error::non_finite("min");
        }
        if !max.is_finite() {
            return error::non_finite("max");
        }
        if min > max {
            return error::invalid_range(min, max);
        }
        error::ok(self.sample(min, max).into())
    }
}

// Live views

#[wasm_bindgen]
impl ContentView {
    #[wasm_bindgen(constructor)]
    pub fn new(element: web_sys::Element, options: JsValue, typeset: JsValue) -> ContentView {
        ContentView::rs_new(element, render_options(&options), typeset_config(&typeset))
    }

    /// Replace the element's content and schedule a typeset pass.
    pub fn render(&self, input: JsValue) {
        if self.driver.token().is_cancelled() {
            return;
        }
        let html = examdoc::render_content_html(content_input(&input), &self.options);
        self.element.set_inner_html(&html);
        let driver = self.driver.clone();
        let element = self.element.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = driver.request(&MathJaxProvider, &element).await;
            if let TypesetOutcome::Failed(err) = outcome {
                tracing::debug!(error = %err, "content view typeset failed");
            }
        });
    }

    /// Whether a typeset pass is running for this element.
    pub fn is_typesetting(&self) -> bool {
        self.driver.queue().is_busy()
    }

    /// Detach from the element; pending passes never touch it again.
    pub fn destroy(&self) {
        self.driver.cancel();
    }
}
