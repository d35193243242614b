//! Display extents and colour-scale statistics.
//!
//! Every insertion into a series recomputes these in full over all stored
//! blocks; the running extents therefore only ever widen. Missing samples
//! (NaN) contribute nothing anywhere.

use ndarray::ArrayView2;

use super::block::BinAxis;

/// Policy for the automatic colour-scale bounds of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Absolute finite minimum and maximum
    #[default]
    Range,
    /// Mean ± nStd standard deviations
    Std,
    /// [0, nStd · rms] where rms is the root mean square about zero, the
    /// natural reference point for strictly positive quantities
    Positive,
}

/// A widening [min, max] interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// An interval that no value has touched yet.
    pub fn empty() -> Self {
        Extent {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn new(min: f64, max: f64) -> Self {
        Extent { min, max }
    }

    /// True once at least one finite value has been included.
    pub fn is_defined(&self) -> bool {
        self.min <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Include a single value; NaN is ignored.
    pub fn include(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Widen to cover another extent; never narrows.
    pub fn widen(&mut self, other: &Extent) {
        self.include(other.min);
        self.include(other.max);
    }
}

/// Per-block colour-scale bounds, linear and logarithmic.
///
/// The log bounds are computed over log10 of the positive values and
/// returned in linear units. A block with no valid values yields empty
/// extents, which contribute nothing to the running union.
pub(crate) fn value_scale(
    values: ArrayView2<f64>,
    mode: ScaleMode,
    n_std: f64,
) -> (Extent, Extent) {
    // single pass over finite values and their logs
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0_usize;

    let mut lmin = f64::INFINITY;
    let mut lmax = f64::NEG_INFINITY;
    let mut lsum = 0.0;
    let mut lsum_sq = 0.0;
    let mut lcount = 0_usize;

    for &v in values.iter() {
        if !v.is_finite() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
        sum += v;
        sum_sq += v * v;
        count += 1;

        if v > 0.0 {
            let l = v.log10();
            lmin = lmin.min(l);
            lmax = lmax.max(l);
            lsum += l;
            lsum_sq += l * l;
            lcount += 1;
        }
    }

    if count == 0 {
        return (Extent::empty(), Extent::empty());
    }

    let linear = match mode {
        ScaleMode::Range => Extent::new(min, max),
        ScaleMode::Std => {
            let mu = sum / count as f64;
            let sd = (sum_sq / count as f64 - mu * mu).max(0.0).sqrt();
            Extent::new(mu - n_std * sd, mu + n_std * sd)
        }
        ScaleMode::Positive => {
            let rms = (sum_sq / count as f64).sqrt();
            Extent::new(0.0, n_std * rms)
        }
    };

    let log = if lcount == 0 {
        Extent::empty()
    } else {
        let bounds = match mode {
            ScaleMode::Range => (lmin, lmax),
            ScaleMode::Std => {
                let lmu = lsum / lcount as f64;
                let lsd = (lsum_sq / lcount as f64 - lmu * lmu).max(0.0).sqrt();
                (lmu - n_std * lsd, lmu + n_std * lsd)
            }
            ScaleMode::Positive => {
                let lrms = (lsum_sq / lcount as f64).sqrt();
                (lmin, n_std * lrms)
            }
        };
        Extent::new(10f64.powf(bounds.0), 10f64.powf(bounds.1))
    };

    (linear, log)
}

/// Per-block bin-axis extents, linear and logarithmic, from bin centres and
/// full widths. Bins with non-finite centres (or, for the log extent,
/// non-positive centres) are skipped.
pub(crate) fn axis_extents(axis: &BinAxis, width: &BinAxis) -> (Extent, Extent) {
    let mut linear = Extent::empty();
    let mut log = Extent::empty();

    let mut visit = |c: f64, w: f64| {
        if !c.is_finite() {
            return;
        }
        let lo = c - w / 2.0;
        let hi = c + w / 2.0;
        linear.include(lo);
        linear.include(hi);
        if c > 0.0 {
            if lo > 0.0 {
                log.include(lo.log10());
            }
            if hi > 0.0 {
                log.include(hi.log10());
            }
        }
    };

    match (axis, width) {
        (BinAxis::Fixed(c), BinAxis::Fixed(w)) => {
            for (&c, &w) in c.iter().zip(w.iter()) {
                visit(c, w);
            }
        }
        (BinAxis::PerTime(c), BinAxis::PerTime(w)) => {
            for (&c, &w) in c.iter().zip(w.iter()) {
                visit(c, w);
            }
        }
        _ => unreachable!("bin axis shapes diverged"),
    }

    let log = if log.is_defined() {
        Extent::new(10f64.powf(log.min), 10f64.powf(log.max))
    } else {
        Extent::empty()
    };
    (linear, log)
}
