//! Spectrum extraction at a requested time.

use ndarray::{Array1, Array2};

use super::block::{BinAxis, SpectrumBlock};
use super::{SeriesError, SpectralSeries};
use crate::time;

/// How a query instant is matched against stored timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMethod {
    /// Take the row nearest in continuous time
    Nearest,
    /// Linearly blend the two bracketing rows; falls back to nearest when
    /// the instant lies outside the block's covered range
    Interpolate,
}

/// Parameters of a spectrum query.
#[derive(Debug, Clone)]
pub struct SpectrumQuery {
    pub method: SampleMethod,
    /// Maximum distance in seconds between the query instant and a block's
    /// nearest sample; blocks further away contribute nothing
    pub max_dt: f64,
    /// Return phase space density against velocity instead of flux against
    /// energy (particle species only; ignored for frequency series)
    pub use_psd: bool,
}

impl Default for SpectrumQuery {
    fn default() -> Self {
        SpectrumQuery {
            method: SampleMethod::Nearest,
            max_dt: 60.0,
            use_psd: false,
        }
    }
}

/// One block's contribution to a query: bin-axis values sorted ascending
/// with their spectral values.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub axis: Array1<f64>,
    pub values: Array1<f64>,
    pub label: String,
}

/// All contributing blocks merged into a single sorted curve.
#[derive(Debug, Clone)]
pub struct MergedSpectrum {
    pub axis: Array1<f64>,
    pub values: Array1<f64>,
    pub labels: Vec<String>,
}

impl SpectralSeries {
    /// Extract one spectrum per contributing block at the given instant.
    ///
    /// Blocks whose nearest sample is further than `query.max_dt` from the
    /// instant are skipped; a query that no block can answer returns an
    /// empty vector, not an error.
    pub fn spectra_at(
        &self,
        date: i32,
        ut: f64,
        query: &SpectrumQuery,
    ) -> Result<Vec<Spectrum>, SeriesError> {
        let target = time::continuous_time(date, ut)?;
        let max_dt_hours = query.max_dt / 3600.0;
        let use_psd = query.use_psd && self.species().is_particle();

        let mut out = Vec::new();
        for block in self.blocks() {
            if let Some((axis, values)) =
                block_spectrum(block, target, max_dt_hours, query.method, use_psd)
            {
                out.push(Spectrum {
                    axis,
                    values,
                    label: block.label.clone(),
                });
            }
        }
        Ok(out)
    }

    /// Extract a single combined spectrum: every contributing block's
    /// (axis, value) pairs concatenated and re-sorted by axis value.
    pub fn spectrum_at(
        &self,
        date: i32,
        ut: f64,
        query: &SpectrumQuery,
    ) -> Result<MergedSpectrum, SeriesError> {
        let parts = self.spectra_at(date, ut, query)?;

        let mut labels = Vec::with_capacity(parts.len());
        let mut pairs = Vec::new();
        for part in parts {
            pairs.extend(part.axis.iter().copied().zip(part.values.iter().copied()));
            labels.push(part.label);
        }
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        Ok(MergedSpectrum {
            axis: pairs.iter().map(|p| p.0).collect(),
            values: pairs.iter().map(|p| p.1).collect(),
            labels,
        })
    }
}

/// A single block's (axis, values) contribution, or `None` when the block
/// has no sample within reach or no valid bins at the matched row.
fn block_spectrum(
    block: &SpectrumBlock,
    target: f64,
    max_dt_hours: f64,
    method: SampleMethod,
    use_psd: bool,
) -> Option<(Array1<f64>, Array1<f64>)> {
    let (axis, values): (&BinAxis, &Array2<f64>) = if use_psd {
        match (&block.velocity, &block.psd) {
            (Some(v), Some(p)) => (v, p),
            _ => (&block.axis, &block.flux),
        }
    } else {
        (&block.axis, &block.flux)
    };

    let epoch = &block.epoch;
    let n = epoch.len();
    if n == 0 {
        return None;
    }

    // nearest stored sample in continuous time
    let mut near = 0;
    let mut best = f64::INFINITY;
    for (i, &e) in epoch.iter().enumerate() {
        let d = (e - target).abs();
        if d < best {
            best = d;
            near = i;
        }
    }
    if best > max_dt_hours {
        return None;
    }

    let inside = target >= epoch[0] && target <= epoch[n - 1];
    let (axis_row, value_row) = if method == SampleMethod::Nearest || !inside {
        (axis.row(near).to_owned(), block_row(values, near))
    } else {
        // bracketing rows around the instant
        let before = epoch.iter().rposition(|&e| e <= target)?;
        let after = epoch.iter().position(|&e| e > target);
        match after {
            // duplicate timestamps or an instant exactly on the last row:
            // nothing to blend across
            None => (axis.row(near).to_owned(), block_row(values, near)),
            Some(after) if epoch[after] == epoch[before] => {
                (axis.row(near).to_owned(), block_row(values, near))
            }
            Some(after) => {
                let frac = (target - epoch[before]) / (epoch[after] - epoch[before]);
                let blend = |lo: &Array1<f64>, hi: &Array1<f64>| -> Array1<f64> {
                    let mut out = lo.clone();
                    out.zip_mut_with(hi, |a, &b| *a += frac * (b - *a));
                    out
                };
                let v = blend(&block_row(values, before), &block_row(values, after));
                // a fixed axis blends to itself; a per-timestamp axis is
                // blended element-by-index, assuming bins keep their
                // identity between the two rows
                let a = blend(
                    &axis.row(before).to_owned(),
                    &axis.row(after).to_owned(),
                );
                (a, v)
            }
        }
    };

    // discard non-positive (missing/invalid) bins, then sort by axis value
    let mut pairs: Vec<(f64, f64)> = axis_row
        .iter()
        .zip(value_row.iter())
        .filter(|(a, _)| **a > 0.0)
        .map(|(&a, &v)| (a, v))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    Some((
        pairs.iter().map(|p| p.0).collect(),
        pairs.iter().map(|p| p.1).collect(),
    ))
}

fn block_row(values: &Array2<f64>, i: usize) -> Array1<f64> {
    values.row(i).to_owned()
}
