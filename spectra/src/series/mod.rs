//! The spectral series container.
//!
//! A [`SpectralSeries`] accumulates blocks of (time × bin) spectra — one
//! block per date or instrument sub-range — and maintains the derived
//! quantities a plot or query consumer needs: a continuous time axis,
//! bin widths, phase space density for particle species, and auto-ranged
//! display extents. All derived statistics are recomputed in full on every
//! insertion; with the small block counts of interactive use this is
//! preferred over incremental bookkeeping.
//!
//! A series is single-writer: `add_data` replaces the derived statistics in
//! place, so readers must not run concurrently with it. Concurrent reads
//! are fine.

mod block;
mod query;
mod scale;

pub use block::{BinAxis, BinWidth, SpectrumBlock};
pub use query::{MergedSpectrum, SampleMethod, Spectrum, SpectrumQuery};
pub use scale::{Extent, ScaleMode};

use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

use crate::species::Species;
use crate::time::{self, TimeError};

/// Errors from series construction and queries
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Flux has {flux} rows but {times} time samples were supplied")]
    RowCountMismatch { flux: usize, times: usize },

    #[error("Flux has {flux} columns but the bin axis has {axis} bins")]
    BinCountMismatch { flux: usize, axis: usize },

    #[error("Per-timestamp bin axis has {axis} rows but {times} time samples were supplied")]
    AxisTimeMismatch { axis: usize, times: usize },

    #[error("Supplied bin widths do not match the bin axis shape")]
    WidthShapeMismatch,

    #[error("The series holds no data")]
    Empty,

    #[error("Velocity-space quantities are not defined for frequency series")]
    NotParticle,

    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Static labels and display policy, fixed at construction.
#[derive(Debug, Clone)]
pub struct SeriesOptions {
    /// Label for the time axis
    pub time_label: String,
    /// Label for the energy/frequency axis
    pub axis_label: String,
    /// Label for the colour scale
    pub value_label: String,
    /// Logarithmic energy/frequency axis
    pub axis_log: bool,
    /// Logarithmic colour scale
    pub value_log: bool,
    /// Colour-scale bound policy
    pub scale_mode: ScaleMode,
    /// Deviations above/below the reference for `Std` and `Positive` modes
    pub n_std: f64,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        SeriesOptions {
            time_label: "UT".to_string(),
            axis_label: "Energy (keV)".to_string(),
            value_label: String::new(),
            axis_log: false,
            value_log: false,
            scale_mode: ScaleMode::Range,
            n_std: 2.0,
        }
    }
}

/// Velocity-space extents, present for particle species only.
#[derive(Debug, Clone, Copy)]
struct ParticleLimits {
    velocity: Extent,
    velocity_log: Extent,
    psd: Extent,
    psd_log: Extent,
}

/// Derived display statistics over all blocks, replaced on every insertion.
#[derive(Debug, Clone, Copy)]
struct DerivedLimits {
    time: Extent,
    axis: Extent,
    axis_log: Extent,
    scale: Extent,
    scale_log: Extent,
    particle: Option<ParticleLimits>,
}

/// An append-only container of spectrogram blocks for one measured quantity.
pub struct SpectralSeries {
    species: Species,
    options: SeriesOptions,
    blocks: Vec<SpectrumBlock>,
    limits: Option<DerivedLimits>,
}

impl SpectralSeries {
    /// Create an empty series for a species, with default labels.
    pub fn new(species: Species) -> Self {
        Self::with_options(species, SeriesOptions::default())
    }

    /// Create an empty series with explicit labels and scale policy.
    pub fn with_options(species: Species, options: SeriesOptions) -> Self {
        SpectralSeries {
            species,
            options,
            blocks: Vec::new(),
            limits: None,
        }
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn options(&self) -> &SeriesOptions {
        &self.options
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Read access to the stored blocks, in insertion order.
    pub fn blocks(&self) -> &[SpectrumBlock] {
        &self.blocks
    }

    /// Append a block of spectra.
    ///
    /// # Arguments
    ///
    /// * `date` - yyyymmdd date of each row
    /// * `ut` - time of day of each row, hours
    /// * `axis` - energy (keV) or frequency bin centres
    /// * `flux` - spectral values, shape (nTime, nBins)
    /// * `width` - bin widths; derived from the centres when `None`
    /// * `dt` - duration of each row in hours; the modal timestamp delta
    ///   when `None`
    /// * `label` - free-text label carried into query output
    ///
    /// Derives the continuous time axis, bin widths and sample durations,
    /// converts flux to phase space density for particle species, and
    /// recomputes all display extents over every stored block.
    #[allow(clippy::too_many_arguments)]
    pub fn add_data(
        &mut self,
        date: ArrayView1<i32>,
        ut: ArrayView1<f64>,
        axis: BinAxis,
        flux: Array2<f64>,
        width: Option<BinWidth>,
        dt: Option<f64>,
        label: &str,
    ) -> Result<(), SeriesError> {
        let (nt, nbins) = flux.dim();

        if date.len() != nt || ut.len() != nt {
            return Err(SeriesError::RowCountMismatch {
                flux: nt,
                times: date.len().min(ut.len()),
            });
        }
        if axis.n_bins() != nbins {
            return Err(SeriesError::BinCountMismatch {
                flux: nbins,
                axis: axis.n_bins(),
            });
        }
        if let Some(axis_times) = axis.n_times() {
            if axis_times != nt {
                return Err(SeriesError::AxisTimeMismatch {
                    axis: axis_times,
                    times: nt,
                });
            }
        }

        let epoch = time::continuous_axis(date, ut)?;

        let width = match width {
            None => axis.derive_widths(),
            Some(BinWidth::Uniform(w)) => axis.filled_like(w),
            Some(BinWidth::PerBin(w)) => match &axis {
                BinAxis::Fixed(_) if w.len() == nbins => BinAxis::Fixed(w),
                _ => return Err(SeriesError::WidthShapeMismatch),
            },
            Some(BinWidth::PerTime(w)) => match &axis {
                BinAxis::PerTime(_) if w.dim() == (nt, nbins) => BinAxis::PerTime(w),
                _ => return Err(SeriesError::WidthShapeMismatch),
            },
        };

        let dt = Array1::from_elem(
            nt,
            dt.unwrap_or_else(|| block::modal_cadence(ut).unwrap_or(0.0)),
        );

        let (velocity, vwidth, psd) = match self.species.mass() {
            Some(mass) => {
                let (velocity, vwidth) = block::velocity_axes(&axis, &width, mass);
                let psd = block::psd_from_flux(&flux, &velocity, mass);
                (Some(velocity), Some(vwidth), Some(psd))
            }
            None => (None, None, None),
        };

        self.blocks.push(SpectrumBlock {
            date: date.to_owned(),
            ut: ut.to_owned(),
            epoch,
            axis,
            width,
            flux,
            dt,
            velocity,
            vwidth,
            psd,
            label: label.to_string(),
        });

        self.recompute_limits();
        Ok(())
    }

    /// Full recompute of every display extent over all stored blocks.
    fn recompute_limits(&mut self) {
        let mut time = Extent::empty();
        let mut axis = Extent::empty();
        let mut axis_log = Extent::empty();
        let mut scale = Extent::empty();
        let mut scale_log = Extent::empty();
        let mut particle = self.species.is_particle().then(|| ParticleLimits {
            velocity: Extent::empty(),
            velocity_log: Extent::empty(),
            psd: Extent::empty(),
            psd_log: Extent::empty(),
        });

        for b in &self.blocks {
            // rows span [epoch, epoch + dt]
            for (&e, &d) in b.epoch.iter().zip(b.dt.iter()) {
                time.include(e);
                time.include(e + d);
            }

            let (a_lin, a_log) = scale::axis_extents(&b.axis, &b.width);
            axis.widen(&a_lin);
            axis_log.widen(&a_log);

            let (s_lin, s_log) =
                scale::value_scale(b.flux.view(), self.options.scale_mode, self.options.n_std);
            scale.widen(&s_lin);
            scale_log.widen(&s_log);

            if let Some(p) = particle.as_mut() {
                if let (Some(v), Some(vw), Some(psd)) = (&b.velocity, &b.vwidth, &b.psd) {
                    let (v_lin, v_log) = scale::axis_extents(v, vw);
                    p.velocity.widen(&v_lin);
                    p.velocity_log.widen(&v_log);

                    let (p_lin, p_log) =
                        scale::value_scale(psd.view(), self.options.scale_mode, self.options.n_std);
                    p.psd.widen(&p_lin);
                    p.psd_log.widen(&p_log);
                }
            }
        }

        // the linear bin-axis floor is pinned at zero for display
        if axis.is_defined() && axis.min > 0.0 {
            axis.min = 0.0;
        }
        if let Some(p) = particle.as_mut() {
            if p.velocity.is_defined() && p.velocity.min > 0.0 {
                p.velocity.min = 0.0;
            }
        }

        self.limits = Some(DerivedLimits {
            time,
            axis,
            axis_log,
            scale,
            scale_log,
            particle,
        });
    }

    fn limits(&self) -> Result<&DerivedLimits, SeriesError> {
        self.limits.as_ref().ok_or(SeriesError::Empty)
    }

    fn particle_limits(&self) -> Result<&ParticleLimits, SeriesError> {
        match &self.limits()?.particle {
            Some(p) => Ok(p),
            None => Err(SeriesError::NotParticle),
        }
    }

    /// Covered time range, hours since the reference day.
    pub fn time_extent(&self) -> Result<Extent, SeriesError> {
        Ok(self.limits()?.time)
    }

    /// Energy/frequency extent including bin half-widths, linear axis.
    pub fn axis_extent(&self) -> Result<Extent, SeriesError> {
        Ok(self.limits()?.axis)
    }

    /// Energy/frequency extent for a logarithmic axis (positive bins only).
    pub fn axis_extent_log(&self) -> Result<Extent, SeriesError> {
        Ok(self.limits()?.axis_log)
    }

    /// Colour-scale bounds under the configured [`ScaleMode`], linear.
    pub fn scale(&self) -> Result<Extent, SeriesError> {
        Ok(self.limits()?.scale)
    }

    /// Colour-scale bounds for a logarithmic colour axis.
    pub fn scale_log(&self) -> Result<Extent, SeriesError> {
        Ok(self.limits()?.scale_log)
    }

    /// Velocity extent in m/s; particle species only.
    pub fn velocity_extent(&self) -> Result<Extent, SeriesError> {
        Ok(self.particle_limits()?.velocity)
    }

    pub fn velocity_extent_log(&self) -> Result<Extent, SeriesError> {
        Ok(self.particle_limits()?.velocity_log)
    }

    /// PSD colour-scale bounds; particle species only.
    pub fn psd_scale(&self) -> Result<Extent, SeriesError> {
        Ok(self.particle_limits()?.psd)
    }

    pub fn psd_scale_log(&self) -> Result<Extent, SeriesError> {
        Ok(self.particle_limits()?.psd_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn simple_series() -> SpectralSeries {
        let mut series = SpectralSeries::new(Species::Electron);
        let date = array![20170301, 20170301, 20170301];
        let ut = array![1.0, 2.0, 3.0];
        let flux = array![[10.0, 20.0], [30.0, 40.0], [50.0, 60.0]];
        series
            .add_data(
                date.view(),
                ut.view(),
                BinAxis::Fixed(array![10.0, 20.0]),
                flux,
                None,
                None,
                "test",
            )
            .unwrap();
        series
    }

    #[test]
    fn test_empty_series_has_no_extents() {
        let series = SpectralSeries::new(Species::Electron);
        assert!(series.is_empty());
        assert!(matches!(series.time_extent(), Err(SeriesError::Empty)));
        assert!(matches!(series.scale(), Err(SeriesError::Empty)));
    }

    #[test]
    fn test_add_data_populates_derived_state() {
        let series = simple_series();
        assert_eq!(series.len(), 1);

        let block = &series.blocks()[0];
        // modal cadence of an hourly sequence
        assert_relative_eq!(block.dt[0], 1.0);
        // derived widths from centres 10 and 20
        assert_relative_eq!(block.width.row(0)[0], 10.0);
        assert!(block.psd.is_some());

        let scale = series.scale().unwrap();
        assert_relative_eq!(scale.min, 10.0);
        assert_relative_eq!(scale.max, 60.0);

        let t = series.time_extent().unwrap();
        // rows at 1..3 h plus one cadence at the end
        assert_relative_eq!(t.span(), 3.0);
    }

    #[test]
    fn test_axis_extent_floor_is_zero() {
        let series = simple_series();
        let a = series.axis_extent().unwrap();
        assert_relative_eq!(a.min, 0.0);
        assert_relative_eq!(a.max, 25.0);

        // the log extent is not pinned
        let al = series.axis_extent_log().unwrap();
        assert_relative_eq!(al.min, 5.0, max_relative = 1e-12);
    }

    #[test]
    fn test_shape_mismatches_fail_fast() {
        let mut series = SpectralSeries::new(Species::Electron);
        let date = array![20170301, 20170301];
        let ut = array![1.0, 2.0];

        // flux rows disagree with the time arrays
        let result = series.add_data(
            date.view(),
            ut.view(),
            BinAxis::Fixed(array![10.0, 20.0]),
            array![[1.0, 2.0]],
            None,
            None,
            "",
        );
        assert!(matches!(result, Err(SeriesError::RowCountMismatch { .. })));

        // flux columns disagree with the axis
        let result = series.add_data(
            date.view(),
            ut.view(),
            BinAxis::Fixed(array![10.0, 20.0, 30.0]),
            array![[1.0, 2.0], [3.0, 4.0]],
            None,
            None,
            "",
        );
        assert!(matches!(result, Err(SeriesError::BinCountMismatch { .. })));
        assert!(series.is_empty());
    }

    #[test]
    fn test_per_time_axis_row_count_checked() {
        let mut series = SpectralSeries::new(Species::Electron);
        let result = series.add_data(
            array![20170301, 20170301].view(),
            array![1.0, 2.0].view(),
            BinAxis::PerTime(array![[10.0, 20.0]]),
            array![[1.0, 2.0], [3.0, 4.0]],
            None,
            None,
            "",
        );
        assert!(matches!(result, Err(SeriesError::AxisTimeMismatch { .. })));
    }

    #[test]
    fn test_width_shape_mismatch() {
        let mut series = SpectralSeries::new(Species::Electron);
        let result = series.add_data(
            array![20170301].view(),
            array![1.0].view(),
            BinAxis::Fixed(array![10.0, 20.0]),
            array![[1.0, 2.0]],
            Some(BinWidth::PerBin(array![1.0])),
            None,
            "",
        );
        assert!(matches!(result, Err(SeriesError::WidthShapeMismatch)));
    }

    #[test]
    fn test_running_extents_never_narrow() {
        let mut series = simple_series();
        let before_scale = series.scale().unwrap();
        let before_time = series.time_extent().unwrap();

        // a second, narrower block must not shrink anything
        series
            .add_data(
                array![20170302].view(),
                array![1.0].view(),
                BinAxis::Fixed(array![12.0, 15.0]),
                array![[35.0, 36.0]],
                None,
                Some(0.5),
                "later",
            )
            .unwrap();

        let after_scale = series.scale().unwrap();
        let after_time = series.time_extent().unwrap();
        assert!(after_scale.min <= before_scale.min);
        assert!(after_scale.max >= before_scale.max);
        assert!(after_time.min <= before_time.min);
        assert!(after_time.max >= before_time.max);
        assert!(after_time.span() > before_time.span());
    }

    #[test]
    fn test_frequency_series_has_no_velocity_state() {
        let mut series = SpectralSeries::new(Species::Frequency);
        series
            .add_data(
                array![20170301].view(),
                array![1.0].view(),
                BinAxis::Fixed(array![100.0, 200.0]),
                array![[1.0, 2.0]],
                None,
                Some(1.0),
                "waves",
            )
            .unwrap();

        assert!(series.blocks()[0].psd.is_none());
        assert!(matches!(
            series.velocity_extent(),
            Err(SeriesError::NotParticle)
        ));
        assert!(series.scale().is_ok());
    }

    #[test]
    fn test_positive_scale_policy_round_trip() {
        let mut series = SpectralSeries::with_options(
            Species::Frequency,
            SeriesOptions {
                scale_mode: ScaleMode::Positive,
                n_std: 2.0,
                ..SeriesOptions::default()
            },
        );
        series
            .add_data(
                array![20170301, 20170301].view(),
                array![1.0, 2.0].view(),
                BinAxis::Fixed(array![100.0, 200.0]),
                array![[3.0, 3.0], [3.0, 3.0]],
                None,
                None,
                "",
            )
            .unwrap();

        let scale = series.scale().unwrap();
        assert_relative_eq!(scale.min, 0.0);
        assert_relative_eq!(scale.max, 6.0);
    }
}
