use crate::geometry::limits::{MAX_FUNCTION_SAMPLES, MIN_FUNCTION_SAMPLES, SAMPLES_PER_UNIT};
use crate::model::{Domain, GraphAxes, GraphFunction, Vec2};

/// Number of intervals for a domain: at least 80, else 12 per unit.
pub fn sample_count(min_x: f64, max_x: f64) -> usize {
    let per_unit = ((max_x - min_x) * SAMPLES_PER_UNIT).round();
    let per_unit = if per_unit.is_finite() && per_unit > 0.0 { per_unit as usize } else { 0 };
    per_unit.max(MIN_FUNCTION_SAMPLES).min(MAX_FUNCTION_SAMPLES)
}

/// Sample `f` on `[min_x, max_x]` inclusive (`sample_count + 1` abscissas).
///
/// Samples with a non-finite value are dropped, so the result may have gaps;
/// consumers connect what remains.
pub fn sample_function(f: impl Fn(f64) -> f64, min_x: f64, max_x: f64) -> Vec<Vec2> {
    if !(min_x.is_finite() && max_x.is_finite()) || max_x < min_x {
        return Vec::new();
    }
    let n = sample_count(min_x, max_x);
    let step = (max_x - min_x) / n as f64;
    (0..=n)
        .filter_map(|i| {
            // last abscissa lands exactly on max_x
            let x = if i == n { max_x } else { min_x + step * i as f64 };
            let y = f(x);
            y.is_finite().then(|| Vec2::new(x, y))
        })
        .collect()
}

/// The function's own domain when valid, else the axes' x range.
pub fn effective_domain(func: &GraphFunction, axes: &GraphAxes) -> Domain {
    match func.domain {
        Some(d) if d.is_valid() => d,
        _ => Domain { min: axes.x_min, max: axes.x_min + axes.x_range() },
    }
}

/// Overlap of two domains, `None` when empty.
pub fn overlap(a: Domain, b: Domain) -> Option<Domain> {
    let d = Domain { min: a.min.max(b.min), max: a.max.min(b.max) };
    d.is_valid().then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_on_zero_to_ten() {
        let s = sample_function(|x| x, 0.0, 10.0);
        assert_eq!(sample_count(0.0, 10.0), 120);
        assert_eq!(s.len(), 121);
        assert!(s.windows(2).all(|w| w[1].x > w[0].x));
        assert!(s.iter().all(|p| p.x == p.y));
        assert_eq!(s.first().unwrap().x, 0.0);
        assert_eq!(s.last().unwrap().x, 10.0);
    }

    #[test]
    fn narrow_domain_uses_minimum() {
        assert_eq!(sample_count(0.0, 1.0), 80);
        assert_eq!(sample_function(|x| x, 0.0, 1.0).len(), 81);
    }

    #[test]
    fn non_finite_samples_dropped() {
        let s = sample_function(|x| if x < 0.01 { f64::NAN } else { x.ln() }, -1.0, 1.0);
        // 81 abscissas at steps of 0.025; the first 41 are below 0.01
        assert_eq!(s.len(), 40);
        assert!(s.iter().all(|p| p.y.is_finite()));
    }

    #[test]
    fn reversed_domain_is_empty() {
        assert!(sample_function(|x| x, 1.0, 0.0).is_empty());
        assert!(sample_function(|x| x, f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn huge_domain_is_capped() {
        assert_eq!(sample_count(0.0, 1.0e9), MAX_FUNCTION_SAMPLES);
    }
}
