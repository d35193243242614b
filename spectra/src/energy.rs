//! Energy/frequency bin geometry.
//!
//! Instrument files supply bin centres in whatever order the telemetry
//! packs them, sometimes without widths, and PAD products supply explicit
//! (min, max) bounds instead. This module derives whichever representation
//! is missing.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

/// Errors from bin geometry derivations
#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("Bin bound arrays differ in length ({0} vs {1})")]
    BoundLengthMismatch(usize, usize),

    #[error("Need at least 2 bins to derive bounds, got {0}")]
    InsufficientBins(usize),
}

/// Derive full bin widths from an array of bin centres.
///
/// The centres are sorted and de-duplicated first, so the result is a
/// function of the set of centres, not of their storage order. Each interior
/// centre gets the mean of its two neighbouring gaps as its width; the edge
/// centres get their single neighbouring gap. Widths are mapped back onto
/// the input order. Non-finite or non-positive centres (fill values for
/// dead channels) get `NaN` widths.
///
/// # Arguments
///
/// * `centers` - bin centre values, any order, duplicates allowed
///
/// # Returns
///
/// Full width for each input centre.
pub fn widths_from_centers(centers: ArrayView1<f64>) -> Array1<f64> {
    let mut unique: Vec<f64> = centers
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();
    unique.sort_by(|a, b| a.partial_cmp(b).unwrap());
    unique.dedup();

    if unique.len() < 2 {
        return Array1::from_elem(centers.len(), f64::NAN);
    }

    // gap to the next sorted centre
    let gaps: Vec<f64> = unique.windows(2).map(|w| w[1] - w[0]).collect();

    let width_of = |rank: usize| -> f64 {
        if rank == 0 {
            gaps[0]
        } else if rank == unique.len() - 1 {
            gaps[gaps.len() - 1]
        } else {
            0.5 * (gaps[rank - 1] + gaps[rank])
        }
    };

    let mut widths = Array1::from_elem(centers.len(), f64::NAN);
    for (i, &c) in centers.iter().enumerate() {
        if !c.is_finite() || c <= 0.0 {
            continue;
        }
        if let Ok(rank) = unique.binary_search_by(|u| u.partial_cmp(&c).unwrap()) {
            widths[i] = width_of(rank);
        }
    }
    widths
}

/// Row-wise [`widths_from_centers`] for per-timestamp bin centres.
pub fn widths_from_centers_2d(centers: ArrayView2<f64>) -> Array2<f64> {
    let mut widths = Array2::from_elem(centers.raw_dim(), f64::NAN);
    for (row, mut out) in centers
        .axis_iter(Axis(0))
        .zip(widths.axis_iter_mut(Axis(0)))
    {
        out.assign(&widths_from_centers(row));
    }
    widths
}

/// Geometric (log-midpoint) bin centres from explicit (min, max) bounds.
pub fn geometric_centers(
    lower: ArrayView1<f64>,
    upper: ArrayView1<f64>,
) -> Result<Array1<f64>, EnergyError> {
    if lower.len() != upper.len() {
        return Err(EnergyError::BoundLengthMismatch(lower.len(), upper.len()));
    }
    let mut centers = Array1::zeros(lower.len());
    for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
        centers[i] = (lo * hi).sqrt();
    }
    Ok(centers)
}

/// Derive (lower, upper) bin bounds from centres using log-space gaps.
///
/// Each centre is flanked at half the logarithmic gap to its neighbour, with
/// the edge gaps reused for the outermost bins. Returned as
/// (lower, upper) in linear units.
pub fn log_bounds_from_centers(
    centers: ArrayView1<f64>,
) -> Result<(Array1<f64>, Array1<f64>), EnergyError> {
    let n = centers.len();
    if n < 2 {
        return Err(EnergyError::InsufficientBins(n));
    }

    let log_c: Vec<f64> = centers.iter().map(|&c| c.log10()).collect();
    let log_gaps: Vec<f64> = log_c.windows(2).map(|w| (w[1] - w[0]).abs()).collect();

    let mut lower = Array1::zeros(n);
    let mut upper = Array1::zeros(n);
    for i in 0..n {
        let gap_below = log_gaps[i.saturating_sub(1).min(log_gaps.len() - 1)];
        let gap_above = log_gaps[i.min(log_gaps.len() - 1)];
        lower[i] = 10f64.powf(log_c[i] - gap_below / 2.0);
        upper[i] = 10f64.powf(log_c[i] + gap_above / 2.0);
    }
    Ok((lower, upper))
}
