//! Normalization Utilities
//!
//! Piecewise linear mapping of a raw value onto a bounded score. Both scoring
//! directions share [`interpolate_between`]; only the clamping differs.

/// Fraction of the way from `worst` to `best`
///
/// Works in either direction: with `worst > best` (lower is better) the
/// fraction still grows as `value` approaches `best`.
pub fn interpolate_between(value: f64, worst: f64, best: f64) -> f64 {
    (value - worst) / (best - worst)
}

/// Clamp-and-interpolate where larger values are better
///
/// `value >= best` earns `max_score`, `value <= worst` earns 0.
pub fn ascending_score(value: f64, worst: f64, best: f64, max_score: f64) -> f64 {
    if value >= best {
        return max_score;
    }
    if value <= worst {
        return 0.0;
    }
    max_score * interpolate_between(value, worst, best)
}

/// Clamp-and-interpolate where smaller values are better
///
/// Here `worst` is the numerically larger bound: `value <= best` earns
/// `max_score`, `value >= worst` earns 0.
pub fn descending_score(value: f64, worst: f64, best: f64, max_score: f64) -> f64 {
    if value <= best {
        return max_score;
    }
    if value >= worst {
        return 0.0;
    }
    max_score * interpolate_between(value, worst, best)
}
