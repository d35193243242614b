//! End-to-end flow: synthetic direction-resolved flux through the pitch
//! angle binner into spectral series, then spectrum queries.

use approx::assert_relative_eq;
use ndarray::{array, Array2, Array3};
use spectra::{
    bin_pitch_angles, AngleBins, BinAxis, PitchAngles, SampleMethod, Species, SpectralSeries,
    SpectrumQuery,
};

/// Synthetic sky: two look directions near 45° and two near 135°, with the
/// field-aligned pair twice as bright at every energy.
fn synthetic_cube(nt: usize, ne: usize) -> (Array2<f64>, Array3<f64>) {
    let mut angles = Array2::zeros((nt, 4));
    let mut flux = Array3::zeros((nt, ne, 4));
    for it in 0..nt {
        angles[[it, 0]] = 40.0;
        angles[[it, 1]] = 44.0;
        angles[[it, 2]] = 130.0;
        angles[[it, 3]] = 134.0;
        for ie in 0..ne {
            let base = (it + 1) as f64 * 10.0 + ie as f64;
            flux[[it, ie, 0]] = 2.0 * base;
            flux[[it, ie, 1]] = 2.0 * base;
            flux[[it, ie, 2]] = base;
            flux[[it, ie, 3]] = base;
        }
    }
    (angles, flux)
}

#[test]
fn test_binner_to_series_round_trip() {
    let (angles, flux) = synthetic_cube(3, 2);
    let bins = AngleBins::new(4).unwrap();
    let cube = bin_pitch_angles(
        &PitchAngles::PerDirection(angles.view()),
        flux.view(),
        &bins,
    )
    .unwrap();

    // both 40° and 44° fall in the first bin, 130°/134° in the third;
    // the other two bins saw nothing
    assert_relative_eq!(cube.flux()[[0, 0, 0]], 20.0);
    assert!(cube.flux()[[0, 0, 1]].is_nan());
    assert_relative_eq!(cube.flux()[[0, 0, 2]], 10.0);
    assert!(cube.flux()[[0, 0, 3]].is_nan());

    // feed the parallel bin into a series and query it back
    let mut series = SpectralSeries::new(Species::Electron);
    series
        .add_data(
            array![20170301, 20170301, 20170301].view(),
            array![1.0, 2.0, 3.0].view(),
            BinAxis::Fixed(array![10.0, 20.0]),
            cube.angle_slice(0).to_owned(),
            None,
            None,
            "PAD 0-45 deg",
        )
        .unwrap();

    let spectra = series
        .spectra_at(20170301, 2.0, &SpectrumQuery::default())
        .unwrap();
    assert_eq!(spectra.len(), 1);
    assert_relative_eq!(spectra[0].values[0], 40.0);
    assert_relative_eq!(spectra[0].values[1], 42.0);
}

#[test]
fn test_spec_scenario_nearest_and_interpolated() {
    // one block of 3 timestamps and 2 energy bins
    let mut series = SpectralSeries::new(Species::Electron);
    series
        .add_data(
            array![20170301, 20170301, 20170301].view(),
            array![1.0, 2.0, 3.0].view(),
            BinAxis::Fixed(array![10.0, 20.0]),
            array![[10.0, 20.0], [30.0, 40.0], [50.0, 60.0]],
            None,
            None,
            "synthetic",
        )
        .unwrap();

    // nearest at the middle timestamp
    let merged = series
        .spectrum_at(20170301, 2.0, &SpectrumQuery::default())
        .unwrap();
    assert_relative_eq!(merged.values[0], 30.0);
    assert_relative_eq!(merged.values[1], 40.0);
    assert!(merged.axis[0] < merged.axis[1]);

    // interpolated exactly halfway between the first two rows
    let query = SpectrumQuery {
        method: SampleMethod::Interpolate,
        max_dt: 3600.0,
        use_psd: false,
    };
    let merged = series.spectrum_at(20170301, 1.5, &query).unwrap();
    assert_relative_eq!(merged.values[0], 20.0);
    assert_relative_eq!(merged.values[1], 30.0);
}

#[test]
fn test_multi_day_series_spans_midnight() {
    let mut series = SpectralSeries::new(Species::Electron);
    for (date, ut) in [(20170301, 23.0), (20170302, 1.0)] {
        series
            .add_data(
                array![date].view(),
                array![ut].view(),
                BinAxis::Fixed(array![10.0, 20.0]),
                array![[1.0, 2.0]],
                None,
                Some(1.0),
                "day block",
            )
            .unwrap();
    }

    // the continuous axis bridges midnight: 23:00 to 01:00 plus one hour
    let t = series.time_extent().unwrap();
    assert_relative_eq!(t.span(), 3.0);

    // a query on the second day only reaches the second block
    let spectra = series
        .spectra_at(20170302, 1.0, &SpectrumQuery::default())
        .unwrap();
    assert_eq!(spectra.len(), 1);
    assert_relative_eq!(spectra[0].values[0], 1.0);
}
