pub mod compile;
pub mod latex;

pub use compile::{compile_expression, compile_latex, CompiledExpr};
pub use latex::{convert_latex_to_expression, has_latex_markers, normalize_graph_expression};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Per-render memo of compiled expressions, keyed by authored source.
///
/// Failures are cached too so a broken expression is converted once per
/// render. A cache belongs to one render pass; drop it with the pass.
#[derive(Debug, Default)]
pub struct ExprCache {
    entries: RefCell<HashMap<String, Option<Rc<CompiledExpr>>>>,
}

impl ExprCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, latex: &str) -> Option<Rc<CompiledExpr>> {
        if let Some(hit) = self.entries.borrow().get(latex) {
            return hit.clone();
        }
        let compiled = compile_latex(latex).map(Rc::new);
        self.entries.borrow_mut().insert(latex.to_string(), compiled.clone());
        compiled
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
