use std::ops::RangeInclusive;

use crate::data::model::Spectrum;

/// Closed mass interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassWindow {
    pub lower: f64,
    pub upper: f64,
}

impl MassWindow {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Symmetric window `[center - half_width, center + half_width]`.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self::new(center - half_width, center + half_width)
    }

    pub fn contains(&self, mz: f64) -> bool {
        self.lower <= mz && mz <= self.upper
    }
}

impl From<MassWindow> for RangeInclusive<f64> {
    fn from(value: MassWindow) -> Self {
        value.lower..=value.upper
    }
}

/// Intensity of the most intense peak of `spectrum` whose mass lies within
/// `target_mass ± half_window`, or `None` when the window holds no peak.
///
/// Every peak is visited, so the spectrum does not need to be sorted.
pub fn find_highest_in_window(spectrum: &Spectrum, target_mass: f64, half_window: f64) -> Option<f64> {
    highest_in_window(
        &spectrum.mz,
        &spectrum.intensity,
        MassWindow::around(target_mass, half_window),
    )
}

pub fn highest_in_window(mz: &[f64], intensity: &[f64], window: MassWindow) -> Option<f64> {
    mz.iter()
        .zip(intensity)
        .filter(|(m, _)| window.contains(**m))
        .map(|(_, &i)| i)
        .reduce(f64::max)
}

// ---------------------------------------------------------------------------
// Sorted peak index – binary-searched window bounds
// ---------------------------------------------------------------------------

/// Peaks of one spectrum re-ordered by mass, so each window lookup costs two
/// binary searches plus a scan over the peaks that actually match.
///
/// Peaks with a NaN mass can never fall in a window and are dropped.
#[derive(Debug, Clone, Default)]
pub struct SortedPeaks {
    mz: Vec<f64>,
    intensity: Vec<f64>,
}

impl SortedPeaks {
    pub fn new(spectrum: &Spectrum) -> Self {
        let mut order: Vec<usize> = (0..spectrum.mz.len().min(spectrum.intensity.len()))
            .filter(|&i| !spectrum.mz[i].is_nan())
            .collect();
        order.sort_unstable_by(|&a, &b| spectrum.mz[a].total_cmp(&spectrum.mz[b]));

        Self {
            mz: order.iter().map(|&i| spectrum.mz[i]).collect(),
            intensity: order.iter().map(|&i| spectrum.intensity[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Same answer as [`highest_in_window`] on the unsorted peaks.
    pub fn highest_in_window(&self, window: MassWindow) -> Option<f64> {
        let start = self.mz.partition_point(|&m| m < window.lower);
        let end = self.mz.partition_point(|&m| m <= window.upper);
        if start >= end {
            return None;
        }
        self.intensity[start..end].iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum() -> Spectrum {
        Spectrum::from_peaks(
            0.0,
            &[(200.0, 10.0), (100.05, 80.0), (99.95, 30.0), (100.5, 20.0)],
        )
    }

    #[test]
    fn window_is_closed() {
        let w = MassWindow::around(100.0, 0.5);
        assert!(w.contains(99.5));
        assert!(w.contains(100.5));
        assert!(!w.contains(100.5000001));
        let range: RangeInclusive<f64> = w.into();
        assert_eq!(range, 99.5..=100.5);
    }

    #[test]
    fn picks_most_intense_peak_in_unsorted_spectrum() {
        let sp = spectrum();
        assert_eq!(find_highest_in_window(&sp, 100.0, 0.1), Some(80.0));
        assert_eq!(find_highest_in_window(&sp, 100.5, 0.01), Some(20.0));
    }

    #[test]
    fn window_covering_everything_returns_base_peak() {
        let sp = spectrum();
        assert_eq!(find_highest_in_window(&sp, 150.0, 100.0), Some(80.0));
        assert_eq!(
            find_highest_in_window(&sp, 150.0, 100.0),
            Some(sp.base_peak_intensity())
        );
    }

    #[test]
    fn empty_window_or_spectrum_is_not_found() {
        let sp = spectrum();
        assert_eq!(find_highest_in_window(&sp, 500.0, 0.1), None);
        let empty = Spectrum::new(0.0, vec![], vec![]);
        assert_eq!(find_highest_in_window(&empty, 100.0, 0.1), None);
        assert!(SortedPeaks::new(&empty).is_empty());
    }

    #[test]
    fn zero_intensity_peak_is_still_found() {
        let sp = Spectrum::from_peaks(0.0, &[(100.0, 0.0)]);
        assert_eq!(find_highest_in_window(&sp, 100.0, 0.1), Some(0.0));
    }

    #[test]
    fn sorted_index_agrees_with_linear_scan() {
        let sp = Spectrum::from_peaks(
            0.0,
            &[
                (300.2, 5.0),
                (100.0, 7.0),
                (100.1, 9.0),
                (f64::NAN, 1000.0),
                (99.9, 2.0),
                (250.0, 11.0),
                (100.1, 3.0),
            ],
        );
        let sorted = SortedPeaks::new(&sp);
        assert_eq!(sorted.len(), 6);
        for center in [99.9, 100.0, 100.05, 100.1, 250.0, 300.2, 400.0, 50.0] {
            for half in [0.001, 0.05, 0.1, 0.2, 200.0] {
                let window = MassWindow::around(center, half);
                assert_eq!(
                    sorted.highest_in_window(window),
                    highest_in_window(&sp.mz, &sp.intensity, window),
                    "center {center} half {half}"
                );
            }
        }
    }
}
