use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod mathjax;

pub use api::*;
pub use mathjax::MathJaxProvider;

/// A compiled graph expression of `x`.
#[wasm_bindgen]
pub struct Expression { pub(crate) inner: examdoc::expr::CompiledExpr }

impl Expression {
    pub fn rs_compile(latex: &str) -> Option<Expression> {
        examdoc::expr::compile_latex(latex).map(|inner| Expression { inner })
    }
}

/// Rich content mounted into one DOM element, typeset in place.
#[wasm_bindgen]
pub struct ContentView {
    pub(crate) element: web_sys::Element,
    pub(crate) options: examdoc::options::RenderOptions,
    pub(crate) driver: examdoc::typeset::TypesetDriver,
}

impl ContentView {
    pub fn rs_new(element: web_sys::Element, options: examdoc::options::RenderOptions, config: examdoc::options::TypesetConfig) -> ContentView {
        ContentView { element, options, driver: examdoc::typeset::TypesetDriver::new(config) }
    }
}
