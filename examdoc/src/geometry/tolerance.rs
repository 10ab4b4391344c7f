// Centralized tolerances and helpers for graph geometry

pub const EPS_BOX: f64 = 1e-6;            // inside-viewport slack for clipping
pub const EPS_LEN: f64 = 1e-12;           // zero-length vector threshold
pub const EPS_DENOM: f64 = 1e-12;         // denominator guard for parametric solves
pub const EPS_DEDUP: f64 = 1e-9;          // coincident intersection threshold

#[inline] pub fn clamp01(x: f64) -> f64 { x.max(0.0).min(1.0) }
#[inline] pub fn near_zero(x: f64, eps: f64) -> bool { x.abs() <= eps }
#[inline] pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

#[inline]
pub fn norm2(mut x: f64, mut y: f64) -> ((f64, f64), f64) {
    let len = (x*x + y*y).sqrt();
    if len > EPS_LEN { x/=len; y/=len; ((x,y), len) } else { ((0.0,0.0), 0.0) }
}
