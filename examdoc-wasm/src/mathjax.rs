//! `window.MathJax` (v3) as the page's typesetting engine.

use examdoc::typeset::{TypesetError, TypesetProvider};
use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[derive(Clone, Copy, Debug, Default)]
pub struct MathJaxProvider;

fn mathjax() -> Option<JsValue> {
    let window = web_sys::window()?;
    let mj = Reflect::get(&window, &JsValue::from_str("MathJax")).ok()?;
    (!mj.is_undefined() && !mj.is_null()).then_some(mj)
}

fn method(obj: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(obj, &JsValue::from_str(name)).ok()?.dyn_into::<Function>().ok()
}

fn engine_error(v: JsValue) -> TypesetError {
    let message = v
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| v.as_string())
        .unwrap_or_else(|| format!("{:?}", v));
    TypesetError::Engine(message)
}

impl TypesetProvider for MathJaxProvider {
    type Target = web_sys::Element;

    /// The startup script replaces the config object with the live API, so
    /// `typesetPromise` only exists once the engine has loaded.
    fn is_ready(&self) -> bool {
        mathjax().and_then(|mj| method(&mj, "typesetPromise")).is_some()
    }

    async fn sleep(&self, ms: u32) {
        let promise = Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map_or(false, |w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms.min(i32::MAX as u32) as i32)
                    .is_ok()
            });
            if !scheduled {
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    async fn typeset(&self, target: &web_sys::Element) -> Result<(), TypesetError> {
        let mj = mathjax().ok_or_else(|| TypesetError::Engine("MathJax is not loaded".into()))?;
        let run = method(&mj, "typesetPromise")
            .ok_or_else(|| TypesetError::Engine("MathJax.typesetPromise is missing".into()))?;
        let nodes = Array::of1(target);
        // forget math from the previous render of this element
        if let Some(clear) = method(&mj, "typesetClear") {
            let _ = clear.call1(&mj, &nodes);
        }
        let pending = run.call1(&mj, &nodes).map_err(engine_error)?;
        let promise = pending
            .dyn_into::<Promise>()
            .map_err(|_| TypesetError::Engine("typesetPromise did not return a promise".into()))?;
        JsFuture::from(promise).await.map(|_| ()).map_err(engine_error)
    }
}
