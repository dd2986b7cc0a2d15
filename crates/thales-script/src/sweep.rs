//! Frequency grids for impedance spectra.

use crate::error::{Result, ScriptError};

/// `points` logarithmically equidistant frequencies, from `upper` down to
/// `lower`.
///
/// Spectra are measured from high to low frequency. The end points are
/// returned exactly as given. One point yields `[upper]`.
pub fn log_spaced_frequencies(lower: f64, upper: f64, points: usize) -> Result<Vec<f64>> {
    let valid = |f: f64| f.is_finite() && f > 0.0;
    if !valid(lower) || !valid(upper) {
        return Err(ScriptError::InvalidSweep { lower, upper });
    }

    match points {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![upper]),
        _ => {}
    }

    let log_lower = lower.ln();
    let step = (upper.ln() - log_lower) / (points - 1) as f64;
    let last = points - 1;

    Ok((0..points)
        .rev()
        .map(|i| match i {
            0 => lower,
            i if i == last => upper,
            i => (log_lower + step * i as f64).exp(),
        })
        .collect())
}
