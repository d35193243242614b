//! Pitch angle distribution (PAD) binning.
//!
//! Instruments report flux per look direction; the pitch angle of each
//! direction (angle between particle velocity and the local magnetic field)
//! changes every spin sector. This module projects those irregularly
//! sampled angles onto a fixed grid of equal-width bins over [0°, 180°],
//! averaging all valid flux samples that land in each bin.

use ndarray::parallel::prelude::*;
use ndarray::{Array, Array1, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use thiserror::Error;

/// Errors that can occur during PAD binning
#[derive(Debug, Error)]
pub enum BinError {
    #[error("Bin count must be at least 1")]
    InvalidBinCount,

    #[error("Angle array shape {angles:?} does not match flux shape {flux:?}")]
    ShapeMismatch { angles: Vec<usize>, flux: Vec<usize> },
}

/// A fixed grid of equal-width pitch angle bins spanning [0°, 180°].
///
/// Bin `k` covers `[edges[k], edges[k+1])`; the last bin is closed on both
/// ends so that 180° is covered.
#[derive(Debug, Clone)]
pub struct AngleBins {
    edges: Array1<f64>,
}

impl AngleBins {
    /// Create `na` equal-width bins. `na` must be at least 1.
    pub fn new(na: usize) -> Result<Self, BinError> {
        if na < 1 {
            return Err(BinError::InvalidBinCount);
        }
        Ok(Self {
            edges: Array::linspace(0.0, 180.0, na + 1),
        })
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// Always false; a valid grid has at least one bin.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bin edges in degrees, `len() + 1` values.
    pub fn edges(&self) -> ArrayView1<f64> {
        self.edges.view()
    }

    /// Bin centres in degrees.
    pub fn centers(&self) -> Array1<f64> {
        let mut centers = Array1::zeros(self.len());
        for (i, c) in centers.iter_mut().enumerate() {
            *c = 0.5 * (self.edges[i] + self.edges[i + 1]);
        }
        centers
    }

    /// Width of one bin in degrees.
    pub fn width(&self) -> f64 {
        180.0 / self.len() as f64
    }

    /// The bin containing `angle_deg`, or `None` for non-finite angles and
    /// angles outside [0°, 180°].
    ///
    /// An angle exactly on an interior edge belongs to the bin whose lower
    /// edge it is; 180° belongs to the last bin.
    pub fn index_of(&self, angle_deg: f64) -> Option<usize> {
        if !angle_deg.is_finite() || !(0.0..=180.0).contains(&angle_deg) {
            return None;
        }
        let na = self.len();
        if angle_deg >= 180.0 {
            return Some(na - 1);
        }

        let mut idx = ((angle_deg / 180.0) * na as f64) as usize;
        if idx >= na {
            idx = na - 1;
        }
        // nudge across an edge where floating point put us on the wrong side
        if idx + 1 < na && angle_deg >= self.edges[idx + 1] {
            idx += 1;
        } else if idx > 0 && angle_deg < self.edges[idx] {
            idx -= 1;
        }
        Some(idx)
    }

    /// Human-readable range of bin `k`, e.g. for per-bin series labels.
    pub fn bin_label(&self, k: usize) -> String {
        format!("{:.0}-{:.0} deg", self.edges[k], self.edges[k + 1])
    }
}

/// Per-sample pitch angles, either one per look direction or resolved
/// additionally by energy channel.
pub enum PitchAngles<'a> {
    /// Shape (nTime, nDirections): every energy channel shares the
    /// direction angles of its timestamp
    PerDirection(ArrayView2<'a, f64>),
    /// Shape (nTime, nEnergy, nDirections)
    PerEnergy(ArrayView3<'a, f64>),
}

impl PitchAngles<'_> {
    fn shape(&self) -> Vec<usize> {
        match self {
            PitchAngles::PerDirection(a) => a.shape().to_vec(),
            PitchAngles::PerEnergy(a) => a.shape().to_vec(),
        }
    }
}

/// Bin-averaged pitch angle distribution, shape (nTime, nEnergy, nBins).
///
/// Cells with no contributing samples are `NaN`, never zero.
#[derive(Debug, Clone)]
pub struct PadCube {
    flux: Array3<f64>,
    bins: AngleBins,
}

impl PadCube {
    /// The bin-averaged flux cube.
    pub fn flux(&self) -> ArrayView3<f64> {
        self.flux.view()
    }

    /// The angle grid the cube was binned on.
    pub fn bins(&self) -> &AngleBins {
        &self.bins
    }

    pub fn n_times(&self) -> usize {
        self.flux.len_of(Axis(0))
    }

    pub fn n_energies(&self) -> usize {
        self.flux.len_of(Axis(1))
    }

    pub fn n_angle_bins(&self) -> usize {
        self.flux.len_of(Axis(2))
    }

    /// The (nTime, nEnergy) flux plane of angle bin `k`, the shape consumed
    /// by a spectral series block.
    pub fn angle_slice(&self, k: usize) -> ArrayView2<f64> {
        self.flux.index_axis(Axis(2), k)
    }
}

/// Bin per-direction flux samples into a pitch angle distribution.
///
/// For every (time, energy) cell independently, all direction samples with
/// valid flux are averaged into the angle bin their pitch angle falls in.
/// Flux values that are non-finite or ≤ 0 are missing and excluded; a bin
/// that receives no valid samples stays `NaN`. No interpolation is done
/// across energy, time or angle.
///
/// # Arguments
///
/// * `angles` - pitch angles in degrees, [0°, 180°]; the caller folds any
///   azimuthal wrap beforehand
/// * `flux` - flux samples, shape (nTime, nEnergy, nDirections)
/// * `bins` - the target angle grid
///
/// # Returns
///
/// A [`PadCube`] of shape (nTime, nEnergy, `bins.len()`), or a shape error
/// when the leading dimensions of `angles` and `flux` disagree.
pub fn bin_pitch_angles(
    angles: &PitchAngles,
    flux: ArrayView3<f64>,
    bins: &AngleBins,
) -> Result<PadCube, BinError> {
    let (nt, ne, nd) = flux.dim();

    let angles_ok = match angles {
        PitchAngles::PerDirection(a) => a.dim() == (nt, nd),
        PitchAngles::PerEnergy(a) => a.dim() == (nt, ne, nd),
    };
    if !angles_ok {
        return Err(BinError::ShapeMismatch {
            angles: angles.shape(),
            flux: flux.shape().to_vec(),
        });
    }

    let na = bins.len();
    let mut cube = Array3::from_elem((nt, ne, na), f64::NAN);

    // One scatter-add pass per (time, energy) cell: a sum and a count per
    // bin, then the mean. Times are independent, so the outer axis runs in
    // parallel.
    cube.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(it, mut plane)| {
            let mut sums = vec![0.0_f64; na];
            let mut counts = vec![0_usize; na];
            for ie in 0..ne {
                sums.fill(0.0);
                counts.fill(0);
                for id in 0..nd {
                    let f = flux[[it, ie, id]];
                    if !f.is_finite() || f <= 0.0 {
                        continue;
                    }
                    let angle = match angles {
                        PitchAngles::PerDirection(a) => a[[it, id]],
                        PitchAngles::PerEnergy(a) => a[[it, ie, id]],
                    };
                    if let Some(k) = bins.index_of(angle) {
                        sums[k] += f;
                        counts[k] += 1;
                    }
                }
                for k in 0..na {
                    if counts[k] > 0 {
                        plane[[ie, k]] = sums[k] / counts[k] as f64;
                    }
                }
            }
        });

    Ok(PadCube {
        flux: cube,
        bins: bins.clone(),
    })
}
