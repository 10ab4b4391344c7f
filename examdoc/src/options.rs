//! Render and typesetting configuration, deserialized from the options
//! object the host page passes in.

use crate::content::table::MAX_SHEET_WIDTH;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options must be a JSON object. serde would read an array as the struct's
/// fields in order, so anything that is not an object yields the defaults.
fn object_or_default<T: DeserializeOwned + Default>(src: &str, what: &'static str) -> T {
    if src.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str::<Value>(src) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::debug!(what, error = %err, "options ignored");
            T::default()
        }),
        Ok(_) => {
            tracing::debug!(what, "options ignored, not an object");
            T::default()
        }
        Err(err) => {
            tracing::debug!(what, error = %err, "options ignored");
            T::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Explicit graph scale; wins over `fit_width`.
    pub scale: Option<f64>,
    /// Available width; graphs wider than this shrink to fit.
    pub fit_width: Option<f64>,
    /// Inline math size relative to body text.
    pub math_scale: f64,
    pub max_sheet_width: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: None,
            fit_width: None,
            math_scale: 1.0,
            max_sheet_width: MAX_SHEET_WIDTH,
        }
    }
}

impl RenderOptions {
    /// Lenient parse: empty or malformed input yields the defaults.
    pub fn from_json(src: &str) -> Self {
        object_or_default(src, "render options")
    }

    pub fn math_scale(&self) -> f64 {
        if self.math_scale.is_finite() && self.math_scale > 0.0 {
            self.math_scale
        } else {
            1.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypesetConfig {
    /// Idle delay that batches rapid content changes into one pass.
    pub debounce_ms: u32,
    /// Readiness polls before giving up on the engine.
    pub ready_attempts: u32,
    pub ready_interval_ms: u32,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self { debounce_ms: 60, ready_attempts: 50, ready_interval_ms: 100 }
    }
}

impl TypesetConfig {
    pub fn from_json(src: &str) -> Self {
        object_or_default(src, "typeset config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let o = RenderOptions::from_json(r#"{"fitWidth": 300}"#);
        assert_eq!(o.fit_width, Some(300.0));
        assert_eq!(o.scale, None);
        assert_eq!(o.math_scale, 1.0);
        assert_eq!(o.max_sheet_width, 820.0);
    }

    #[test]
    fn malformed_options_fall_back() {
        assert_eq!(RenderOptions::from_json("{oops"), RenderOptions::default());
        assert_eq!(RenderOptions::from_json(""), RenderOptions::default());
        assert_eq!(TypesetConfig::from_json("[1]"), TypesetConfig::default());
    }

    #[test]
    fn non_object_options_are_defaults() {
        assert_eq!(RenderOptions::from_json("[0.5, 300]"), RenderOptions::default());
        assert_eq!(RenderOptions::from_json("2"), RenderOptions::default());
        assert_eq!(RenderOptions::from_json("null"), RenderOptions::default());
        assert_eq!(TypesetConfig::from_json(r#""fast""#), TypesetConfig::default());
        assert_eq!(TypesetConfig::from_json(r#"{"debounceMs": 5}"#).debounce_ms, 5);
    }

    #[test]
    fn typeset_config_parses() {
        let c = TypesetConfig::from_json(r#"{"debounceMs": 10, "readyAttempts": 3}"#);
        assert_eq!(c, TypesetConfig { debounce_ms: 10, ready_attempts: 3, ready_interval_ms: 100 });
    }

    #[test]
    fn bad_math_scale_is_one() {
        let o = RenderOptions { math_scale: -2.0, ..RenderOptions::default() };
        assert_eq!(o.math_scale(), 1.0);
    }
}
