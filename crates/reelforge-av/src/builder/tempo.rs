//! Audio tempo decomposition.
//!
//! The `atempo` filter only accepts factors in `[0.5, 2.0]`, so larger changes
//! are expressed as a chain of equal in-range steps.

use crate::error::BuildError;

pub const TEMPO_MIN: f64 = 0.5;
pub const TEMPO_MAX: f64 = 2.0;

/// Split `factor` into the fewest equal steps that each lie in range and
/// multiply back to `factor`.
pub fn decompose(factor: f64) -> Result<Vec<f64>, BuildError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(BuildError::invalid(
            "speed",
            format!("tempo factor must be a positive number, got {factor}"),
        ));
    }
    if (TEMPO_MIN..=TEMPO_MAX).contains(&factor) {
        return Ok(vec![factor]);
    }

    let steps = (factor.log2().abs() - 1e-9).ceil().max(1.0);
    let step = factor
        .powf(1.0 / steps)
        .clamp(TEMPO_MIN, TEMPO_MAX);
    Ok(vec![step; steps as usize])
}

/// Render the decomposition as an `atempo` filter chain.
pub fn atempo_chain(factor: f64) -> Result<String, BuildError> {
    Ok(decompose(factor)?
        .iter()
        .map(|step| format!("atempo={step}"))
        .collect::<Vec<_>>()
        .join(","))
}
