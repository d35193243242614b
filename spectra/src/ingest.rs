//! Ingestion boundary between instrument file readers and the core.
//!
//! The file/index subsystem hands over raw per-date products as name→array
//! maps; everything instrument-specific (variable names, labels, species,
//! validity convention) is resolved here through a [`ProductConfig`] record
//! so that the series container never sees instrument naming.

use std::collections::HashMap;

use log::info;
use ndarray::{Array1, ArrayD, ArrayView1, Ix1, Ix2};
use thiserror::Error;

use crate::energy::{self, EnergyError};
use crate::pitch_angle::PadCube;
use crate::series::{BinAxis, BinWidth, SeriesError, SeriesOptions, SpectralSeries};
use crate::species::Species;
use crate::time::{DateSelection, TimeError};

/// Errors raised while assembling series from raw products
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Product is missing required field {0:?}")]
    MissingField(String),

    #[error("Field {0:?} has unexpected dimensionality {1}")]
    FieldShape(String, usize),

    #[error("Reader failed: {0}")]
    Reader(String),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Energy(#[from] EnergyError),
}

/// One date's worth of a raw instrument product, as produced by the
/// (external) file reader: timestamps plus a variable-name→array map.
#[derive(Debug, Clone)]
pub struct RawProduct {
    /// yyyymmdd date of each row
    pub date: Array1<i32>,
    /// Time of day of each row, hours
    pub ut: Array1<f64>,
    /// Raw variables keyed by their file names
    pub fields: HashMap<String, ArrayD<f64>>,
}

/// Source of raw products, implemented by the file/index subsystem.
///
/// `Ok(None)` means "no data for this date" and is a legitimate,
/// non-exceptional result: callers skip the date and continue.
pub trait ProductReader {
    fn read_product(
        &self,
        date: i32,
        level: u8,
        product: &str,
    ) -> Result<Option<RawProduct>, IngestError>;
}

/// Which flux values a product treats as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Values below zero are fill; zero is a real measurement
    Negative,
    /// Values at or below zero are fill
    NonPositive,
}

impl Validity {
    pub fn is_invalid(&self, value: f64) -> bool {
        if !value.is_finite() {
            return true;
        }
        match self {
            Validity::Negative => value < 0.0,
            Validity::NonPositive => value <= 0.0,
        }
    }
}

/// Static description of one instrument product: where its arrays live in
/// the raw files and how the resulting series should be tagged.
#[derive(Debug, Clone)]
pub struct ProductConfig {
    /// Product name in the data index
    pub product: String,
    /// Processing level to read
    pub level: u8,
    /// Raw variable holding the flux array
    pub flux_field: String,
    /// Raw variable holding the energy/frequency bin centres
    pub energy_field: String,
    /// Label attached to every block built from this product
    pub label: String,
    pub species: Species,
    pub validity: Validity,
    pub options: SeriesOptions,
}

/// Build a series by reading one product over a date selection.
///
/// Dates with no data are skipped; if every date is missing the result is
/// `Ok(None)`. Invalid flux samples are masked to NaN before insertion.
pub fn build_series<R: ProductReader>(
    reader: &R,
    config: &ProductConfig,
    dates: &DateSelection,
) -> Result<Option<SpectralSeries>, IngestError> {
    let mut series: Option<SpectralSeries> = None;

    for date in dates.resolve()? {
        let mut raw = match reader.read_product(date, config.level, &config.product)? {
            Some(raw) => raw,
            None => {
                info!("no {} data for {}, skipping", config.product, date);
                continue;
            }
        };

        let axis = take_axis(&mut raw.fields, &config.energy_field)?;
        let mut flux = take_field(&mut raw.fields, &config.flux_field)?
            .into_dimensionality::<Ix2>()
            .map_err(|_| IngestError::FieldShape(config.flux_field.clone(), 0))?;
        flux.mapv_inplace(|v| {
            if config.validity.is_invalid(v) {
                f64::NAN
            } else {
                v
            }
        });

        let series = series.get_or_insert_with(|| {
            SpectralSeries::with_options(config.species, config.options.clone())
        });
        series.add_data(
            raw.date.view(),
            raw.ut.view(),
            axis,
            flux,
            None,
            None,
            &config.label,
        )?;
    }

    Ok(series)
}

/// One series per pitch angle bin from a PAD cube, each holding that bin's
/// (time × energy) flux plane with a labelled angle range.
///
/// # Arguments
///
/// * `cube` - binned pitch angle distribution
/// * `date`/`ut` - timestamps of the cube's time axis
/// * `energy_lower`/`energy_upper` - explicit energy bin bounds in keV;
///   centres are taken geometrically
/// * `species` - measured species (fixes the PSD conversion mass)
/// * `options` - labels and scale policy shared by all bins
/// * `label` - base label; the angle range of each bin is appended
pub fn pad_series(
    cube: &PadCube,
    date: ArrayView1<i32>,
    ut: ArrayView1<f64>,
    energy_lower: ArrayView1<f64>,
    energy_upper: ArrayView1<f64>,
    species: Species,
    options: &SeriesOptions,
    label: &str,
) -> Result<Vec<SpectralSeries>, IngestError> {
    let centers = energy::geometric_centers(energy_lower, energy_upper)?;
    let widths: Array1<f64> = energy_upper
        .iter()
        .zip(energy_lower.iter())
        .map(|(&hi, &lo)| hi - lo)
        .collect();

    let mut out = Vec::with_capacity(cube.n_angle_bins());
    for k in 0..cube.n_angle_bins() {
        let mut series = SpectralSeries::with_options(species, options.clone());
        series.add_data(
            date,
            ut,
            BinAxis::Fixed(centers.clone()),
            cube.angle_slice(k).to_owned(),
            Some(BinWidth::PerBin(widths.clone())),
            None,
            &format!("{} {}", label, cube.bins().bin_label(k)),
        )?;
        out.push(series);
    }
    Ok(out)
}

fn take_field(
    fields: &mut HashMap<String, ArrayD<f64>>,
    name: &str,
) -> Result<ArrayD<f64>, IngestError> {
    fields
        .remove(name)
        .ok_or_else(|| IngestError::MissingField(name.to_string()))
}

fn take_axis(
    fields: &mut HashMap<String, ArrayD<f64>>,
    name: &str,
) -> Result<BinAxis, IngestError> {
    let raw = take_field(fields, name)?;
    match raw.ndim() {
        1 => Ok(BinAxis::Fixed(
            raw.into_dimensionality::<Ix1>()
                .map_err(|_| IngestError::FieldShape(name.to_string(), 1))?,
        )),
        2 => Ok(BinAxis::PerTime(
            raw.into_dimensionality::<Ix2>()
                .map_err(|_| IngestError::FieldShape(name.to_string(), 2))?,
        )),
        n => Err(IngestError::FieldShape(name.to_string(), n)),
    }
}
