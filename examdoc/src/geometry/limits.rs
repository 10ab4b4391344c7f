// Centralized caps to harden against untrusted persisted content

// Content nesting (tables in tables, segment labels inside graphs)
pub const MAX_CONTENT_DEPTH: usize = 8;
pub const MAX_SEGMENTS: usize = 20_000;

// Expressions
pub const MAX_EXPRESSION_LEN: usize = 4_096;
pub const MAX_EXPRESSION_DEPTH: usize = 64;

// Sampling
pub const MIN_FUNCTION_SAMPLES: usize = 80;
pub const SAMPLES_PER_UNIT: f64 = 12.0;
pub const MAX_FUNCTION_SAMPLES: usize = 20_000;

// Grid lines per direction; denser grids are skipped
pub const MAX_GRID_LINES: usize = 1_000;

// Numeric bounds
pub const COORD_MIN: f64 = -1.0e9;
pub const COORD_MAX: f64 =  1.0e9;
pub const SIZE_MAX: f64 = 10_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_size_bounds(w: f64) -> bool { w.is_finite() && w > 0.0 && w <= SIZE_MAX }
