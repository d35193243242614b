//! Immutable data blocks held by a spectral series.
//!
//! A block is one contiguous chunk of spectra, typically one date of one
//! instrument product. Blocks are never mutated after insertion.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::energy;
use crate::psd;

/// An energy/frequency-like bin axis: either fixed for the whole block or
/// varying per timestamp.
#[derive(Debug, Clone)]
pub enum BinAxis {
    /// One set of bin centres shared by every timestamp, length nBins
    Fixed(Array1<f64>),
    /// Per-timestamp bin centres, shape (nTime, nBins)
    PerTime(Array2<f64>),
}

impl BinAxis {
    /// Number of bins per spectrum.
    pub fn n_bins(&self) -> usize {
        match self {
            BinAxis::Fixed(a) => a.len(),
            BinAxis::PerTime(a) => a.len_of(Axis(1)),
        }
    }

    /// Number of timestamps, for per-timestamp axes.
    pub fn n_times(&self) -> Option<usize> {
        match self {
            BinAxis::Fixed(_) => None,
            BinAxis::PerTime(a) => Some(a.len_of(Axis(0))),
        }
    }

    /// The bin centres in effect at timestamp `i`.
    pub fn row(&self, i: usize) -> ArrayView1<f64> {
        match self {
            BinAxis::Fixed(a) => a.view(),
            BinAxis::PerTime(a) => a.row(i),
        }
    }

    /// Derive full bin widths from the centres (see
    /// [`energy::widths_from_centers`]).
    pub fn derive_widths(&self) -> BinAxis {
        match self {
            BinAxis::Fixed(a) => BinAxis::Fixed(energy::widths_from_centers(a.view())),
            BinAxis::PerTime(a) => BinAxis::PerTime(energy::widths_from_centers_2d(a.view())),
        }
    }

    /// An axis of the same shape filled with one value.
    pub fn filled_like(&self, value: f64) -> BinAxis {
        match self {
            BinAxis::Fixed(a) => BinAxis::Fixed(Array1::from_elem(a.len(), value)),
            BinAxis::PerTime(a) => BinAxis::PerTime(Array2::from_elem(a.raw_dim(), value)),
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> BinAxis {
        match self {
            BinAxis::Fixed(a) => BinAxis::Fixed(a.mapv(&f)),
            BinAxis::PerTime(a) => BinAxis::PerTime(a.mapv(&f)),
        }
    }

    /// Elementwise combination of two same-shaped axes.
    fn zip_map(&self, other: &BinAxis, f: impl Fn(f64, f64) -> f64) -> BinAxis {
        match (self, other) {
            (BinAxis::Fixed(a), BinAxis::Fixed(b)) => {
                let mut out = a.clone();
                out.zip_mut_with(b, |x, &y| *x = f(*x, y));
                BinAxis::Fixed(out)
            }
            (BinAxis::PerTime(a), BinAxis::PerTime(b)) => {
                let mut out = a.clone();
                out.zip_mut_with(b, |x, &y| *x = f(*x, y));
                BinAxis::PerTime(out)
            }
            // resolved widths always share the axis shape
            _ => unreachable!("bin axis shapes diverged"),
        }
    }
}

/// How bin widths are supplied to `add_data` when not derived.
#[derive(Debug, Clone)]
pub enum BinWidth {
    /// One width for every bin
    Uniform(f64),
    /// One width per bin, for a fixed axis
    PerBin(Array1<f64>),
    /// One width per (timestamp, bin), for a per-timestamp axis
    PerTime(Array2<f64>),
}

/// One appended chunk of spectra and its derived quantities.
#[derive(Debug, Clone)]
pub struct SpectrumBlock {
    /// yyyymmdd date of each row
    pub date: Array1<i32>,
    /// Time of day of each row, hours
    pub ut: Array1<f64>,
    /// Continuous time of each row, hours since the reference day
    pub epoch: Array1<f64>,
    /// Energy (keV) or frequency bin centres
    pub axis: BinAxis,
    /// Full bin widths, same shape as `axis`
    pub width: BinAxis,
    /// Flux values, shape (nTime, nBins); missing samples are NaN
    pub flux: Array2<f64>,
    /// Duration of each row, hours
    pub dt: Array1<f64>,
    /// Velocity bin centres in m/s (particle species only)
    pub velocity: Option<BinAxis>,
    /// Velocity bin widths, asymmetric in velocity space
    pub vwidth: Option<BinAxis>,
    /// Phase space density, same shape as `flux`
    pub psd: Option<Array2<f64>>,
    /// Free-text label, carried into query output
    pub label: String,
}

/// The modal positive delta between consecutive timestamps.
///
/// Used as the nominal cadence when no sample duration is supplied. The mode
/// is robust to a few irregular dropout gaps that would bias a mean; ties
/// resolve to the smallest delta.
pub fn modal_cadence(ut: ArrayView1<f64>) -> Option<f64> {
    let mut deltas = Vec::with_capacity(ut.len().saturating_sub(1));
    for i in 1..ut.len() {
        let d = ut[i] - ut[i - 1];
        if d > 0.0 && d.is_finite() {
            deltas.push(d);
        }
    }
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut best = deltas[0];
    let mut best_count = 0;
    let mut i = 0;
    while i < deltas.len() {
        let mut j = i;
        while j < deltas.len() && deltas[j] == deltas[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = deltas[i];
        }
        i = j;
    }
    Some(best)
}

/// Velocity bin centres and widths for an energy axis in keV.
///
/// The width is taken between the speeds at `E - w/2` and `E + w/2`; equal
/// energy half-widths map to unequal velocity half-widths, so the velocity
/// bins are deliberately asymmetric about their centres.
pub(crate) fn velocity_axes(axis: &BinAxis, width: &BinAxis, mass: f64) -> (BinAxis, BinAxis) {
    let velocity = axis.map(|e| psd::velocity_from_energy(e, mass));
    let v_lower = axis.zip_map(width, |e, w| psd::velocity_from_energy(e - w / 2.0, mass));
    let v_upper = axis.zip_map(width, |e, w| psd::velocity_from_energy(e + w / 2.0, mass));
    let vwidth = v_upper.zip_map(&v_lower, |hi, lo| hi - lo);
    (velocity, vwidth)
}

/// Phase space density for every sample of a flux block.
pub(crate) fn psd_from_flux(flux: &Array2<f64>, velocity: &BinAxis, mass: f64) -> Array2<f64> {
    let mut out = flux.clone();
    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        let v = velocity.row(i);
        for (value, &vi) in row.iter_mut().zip(v.iter()) {
            *value = psd::flux_to_psd(*value, vi, mass);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SI;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_modal_cadence_robust_to_dropouts() {
        // 9 one-second gaps and a single 60-second dropout: the cadence is
        // the mode, not the ~6.9 s mean
        let mut ut = Vec::new();
        let mut t = 0.0;
        for i in 0..10 {
            ut.push(t);
            t += if i == 4 { 60.0 } else { 1.0 };
        }
        let ut = Array1::from(ut);
        assert_relative_eq!(modal_cadence(ut.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_modal_cadence_tie_takes_smallest() {
        let ut = array![0.0, 1.0, 2.0, 4.0, 6.0];
        assert_relative_eq!(modal_cadence(ut.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_modal_cadence_degenerate() {
        assert!(modal_cadence(array![5.0].view()).is_none());
        assert!(modal_cadence(array![5.0, 5.0].view()).is_none());
    }

    #[test]
    fn test_velocity_widths_are_asymmetric() {
        let axis = BinAxis::Fixed(array![10.0]);
        let width = BinAxis::Fixed(array![4.0]);
        let (velocity, vwidth) = velocity_axes(&axis, &width, SI::ELECTRON_MASS);

        let v = velocity.row(0)[0];
        let v_lo = psd::velocity_from_energy(8.0, SI::ELECTRON_MASS);
        let v_hi = psd::velocity_from_energy(12.0, SI::ELECTRON_MASS);
        assert_relative_eq!(vwidth.row(0)[0], v_hi - v_lo, max_relative = 1e-12);

        // sqrt compresses the high side: the centre sits above the midpoint
        assert!(v - v_lo > v_hi - v);
    }

    #[test]
    fn test_velocity_lower_bound_underflow_is_nan() {
        // E - w/2 < 0 has no physical speed
        let axis = BinAxis::Fixed(array![1.0]);
        let width = BinAxis::Fixed(array![4.0]);
        let (_, vwidth) = velocity_axes(&axis, &width, SI::ELECTRON_MASS);
        assert!(vwidth.row(0)[0].is_nan());
    }

    #[test]
    fn test_psd_from_flux_shape_and_missing() {
        let flux = array![[1.0e5, f64::NAN], [2.0e5, 3.0e5]];
        let velocity = BinAxis::Fixed(array![1.0e7, 2.0e7]);
        let psd = psd_from_flux(&flux, &velocity, SI::ELECTRON_MASS);

        assert_eq!(psd.dim(), (2, 2));
        assert!(psd[[0, 1]].is_nan());
        assert_relative_eq!(
            psd[[1, 0]],
            psd::flux_to_psd(2.0e5, 1.0e7, SI::ELECTRON_MASS),
            max_relative = 1e-12
        );
    }
}
