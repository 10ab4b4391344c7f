use super::resolve::Resolver;
use super::sample::{effective_domain, overlap, sample_function};
use crate::model::{AreaMode, Domain, GraphArea, Vec2};

/// Closed outline of an area in data space. Callers skip outlines with
/// fewer than three points.
pub fn area_outline<'g>(area: &'g GraphArea, resolver: &Resolver<'g>) -> Vec<Vec2> {
    match area.mode {
        AreaMode::Polygon => area
            .points
            .iter()
            .filter_map(|a| resolver.resolve_anchor(a))
            .collect(),
        AreaMode::UnderFunction => under_function(area, resolver).unwrap_or_default(),
        AreaMode::BetweenFunctions => between_functions(area, resolver).unwrap_or_default(),
    }
}

/// Domain an area covers: the function's effective domain (or the overlap
/// of both functions'), narrowed to the area's own domain when that is valid.
pub fn area_domain(area: &GraphArea, resolver: &Resolver<'_>) -> Option<Domain> {
    let graph = resolver.graph();
    let f1 = graph.function(area.function_id.as_deref()?)?;
    let d1 = effective_domain(f1, &graph.axes);
    let functions = match area.mode {
        AreaMode::BetweenFunctions => {
            let f2 = graph.function(area.function_id2.as_deref()?)?;
            overlap(d1, effective_domain(f2, &graph.axes))?
        }
        _ => d1,
    };
    match area.domain.filter(Domain::is_valid) {
        Some(own) => overlap(own, functions),
        None => Some(functions),
    }
}

fn under_function(area: &GraphArea, resolver: &Resolver<'_>) -> Option<Vec<Vec2>> {
    let graph = resolver.graph();
    let func = graph.function(area.function_id.as_deref()?)?;
    let compiled = resolver.exprs().get(&func.expression)?;
    let domain = area_domain(area, resolver)?;
    let samples = sample_function(|x| compiled.eval(x), domain.min, domain.max);
    let (first, last) = (samples.first()?.x, samples.last()?.x);
    let mut outline = Vec::with_capacity(samples.len() + 2);
    outline.push(Vec2::new(first, 0.0));
    outline.extend(samples);
    outline.push(Vec2::new(last, 0.0));
    Some(outline)
}

fn between_functions(area: &GraphArea, resolver: &Resolver<'_>) -> Option<Vec<Vec2>> {
    let graph = resolver.graph();
    let f1 = graph.function(area.function_id.as_deref()?)?;
    let f2 = graph.function(area.function_id2.as_deref()?)?;
    let c1 = resolver.exprs().get(&f1.expression)?;
    let c2 = resolver.exprs().get(&f2.expression)?;
    let domain = area_domain(area, resolver)?;
    let mut outline = sample_function(|x| c1.eval(x), domain.min, domain.max);
    let mut lower = sample_function(|x| c2.eval(x), domain.min, domain.max);
    lower.reverse();
    outline.extend(lower);
    Some(outline)
}

/// Default label anchor: centroid for polygons, halfway between the
/// bounding curves at the domain midpoint otherwise.
pub fn area_label_anchor(area: &GraphArea, outline: &[Vec2], resolver: &Resolver<'_>) -> Option<Vec2> {
    match area.mode {
        AreaMode::Polygon => {
            if outline.is_empty() {
                return None;
            }
            let n = outline.len() as f64;
            let (sx, sy) = outline.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            Some(Vec2::new(sx / n, sy / n))
        }
        AreaMode::UnderFunction | AreaMode::BetweenFunctions => {
            let graph = resolver.graph();
            let mid = area_domain(area, resolver)?.mid();
            let value = |id: Option<&str>| -> Option<f64> {
                let f = graph.function(id?)?;
                resolver.exprs().get(&f.expression)?.eval_finite(mid)
            };
            let top = value(area.function_id.as_deref())?;
            let bottom = match area.mode {
                AreaMode::BetweenFunctions => value(area.function_id2.as_deref())?,
                _ => 0.0,
            };
            Some(Vec2::new(mid, (top + bottom) * 0.5))
        }
    }
}
