//! Spectrogram analysis for particle and wave instrument data.
//!
//! This crate provides the two core pieces of a spacecraft spectrogram
//! pipeline:
//!
//! - [`pitch_angle`]: projection of per-look-direction flux samples onto a
//!   fixed grid of pitch angle bins (a PAD, pitch angle distribution).
//! - [`series`]: an append-only container of spectral blocks that derives
//!   bin widths, a continuous time axis, phase space density and
//!   auto-ranged display extents, and answers spectrum queries at arbitrary
//!   times.
//!
//! File parsing, downloading, field-line tracing and plotting live in
//! separate subsystems; [`ingest`] defines the seam they feed data through.

pub mod constants;
pub mod energy;
pub mod ingest;
pub mod pitch_angle;
pub mod psd;
pub mod series;
pub mod species;
pub mod time;

pub use ingest::{ProductConfig, ProductReader, RawProduct, Validity};
pub use pitch_angle::{bin_pitch_angles, AngleBins, BinError, PadCube, PitchAngles};
pub use series::{
    BinAxis, BinWidth, Extent, MergedSpectrum, SampleMethod, ScaleMode, SeriesError,
    SeriesOptions, SpectralSeries, Spectrum, SpectrumQuery,
};
pub use species::Species;
pub use time::{DateSelection, TimeError};
