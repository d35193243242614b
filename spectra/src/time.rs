//! Continuous time axis construction and date handling.
//!
//! Spectral data arrive stamped with an integer date (yyyymmdd) and a
//! time-of-day in hours. Comparing or interpolating across day boundaries
//! needs a single monotonic axis, so both are folded into a "continuous
//! time": hours elapsed since 1950-01-01 00:00.

use chrono::NaiveDate;
use ndarray::{Array1, ArrayView1};
use thiserror::Error;

/// Errors from date parsing and time axis construction
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Invalid date: {0} is not a valid yyyymmdd value")]
    InvalidDate(i32),

    #[error("Date range end {1} precedes start {0}")]
    ReversedRange(i32, i32),

    #[error("Date and time arrays differ in length ({0} vs {1})")]
    LengthMismatch(usize, usize),

    #[error("Time axis reverses at sample {0}")]
    NonMonotonic(usize),
}

/// Reference day of the continuous time axis.
fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1950, 1, 1).unwrap()
}

/// Parse an integer date in yyyymmdd format.
pub fn parse_date(date: i32) -> Result<NaiveDate, TimeError> {
    let year = date / 10000;
    let month = (date / 100) % 100;
    let day = date % 100;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or(TimeError::InvalidDate(date))
}

fn date_to_int(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.year() * 10000 + date.month() as i32 * 100 + date.day() as i32
}

/// Convert a (yyyymmdd, hours-of-day) pair to hours since 1950-01-01 00:00.
pub fn continuous_time(date: i32, ut: f64) -> Result<f64, TimeError> {
    let days = parse_date(date)?
        .signed_duration_since(reference_date())
        .num_days();
    Ok(days as f64 * 24.0 + ut)
}

/// Build a continuous time axis for a block of samples.
///
/// # Arguments
///
/// * `date` - yyyymmdd date of each sample
/// * `ut` - time of day of each sample in hours
///
/// # Returns
///
/// Hours since the reference day for every sample. The result must be
/// monotonically non-decreasing; a time reversal (including one produced by
/// a mismatched date/ut pair at a day boundary) is an error.
pub fn continuous_axis(date: ArrayView1<i32>, ut: ArrayView1<f64>) -> Result<Array1<f64>, TimeError> {
    if date.len() != ut.len() {
        return Err(TimeError::LengthMismatch(date.len(), ut.len()));
    }

    let mut epoch = Array1::zeros(date.len());
    for (i, (&d, &u)) in date.iter().zip(ut.iter()).enumerate() {
        epoch[i] = continuous_time(d, u)?;
        if i > 0 && epoch[i] < epoch[i - 1] {
            return Err(TimeError::NonMonotonic(i));
        }
    }
    Ok(epoch)
}

/// A request for one or more dates, normalised before it reaches the core.
#[derive(Debug, Clone)]
pub enum DateSelection {
    /// A single yyyymmdd date
    Single(i32),
    /// Every date from start to end inclusive
    Range(i32, i32),
    /// An explicit list of dates
    List(Vec<i32>),
}

impl DateSelection {
    /// Resolve the selection to a concrete list of dates.
    pub fn resolve(&self) -> Result<Vec<i32>, TimeError> {
        match self {
            DateSelection::Single(date) => {
                parse_date(*date)?;
                Ok(vec![*date])
            }
            DateSelection::Range(start, end) => {
                let d0 = parse_date(*start)?;
                let d1 = parse_date(*end)?;
                if d1 < d0 {
                    return Err(TimeError::ReversedRange(*start, *end));
                }
                let mut dates = Vec::new();
                let mut d = d0;
                while d <= d1 {
                    dates.push(date_to_int(d));
                    d = d.succ_opt().ok_or(TimeError::InvalidDate(*end))?;
                }
                Ok(dates)
            }
            DateSelection::List(list) => {
                for date in list {
                    parse_date(*date)?;
                }
                Ok(list.clone())
            }
        }
    }
}
