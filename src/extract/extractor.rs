use std::sync::atomic::{AtomicBool, Ordering};

use crate::data::model::{
    ExtractedIonChromatogram, ExtractionResult, Spectrum, TargetMass, TimeSeries,
};
use crate::errors::{ConfigurationError, ExtractorError, Result};

use super::window::{highest_in_window, MassWindow, SortedPeaks};

/// With at least this many targets, sorting each spectrum once is cheaper
/// than scanning it once per target.
pub const SORTED_SEARCH_MIN_TARGETS: usize = 8;

/// How window lookups are performed. All strategies return identical values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Scan every peak once per target.
    Linear,
    /// Sort each spectrum by mass once and binary-search every window.
    Sorted,
    /// `Sorted` for long target lists, `Linear` otherwise.
    #[default]
    Auto,
}

/// Builds the BPC and one EIC per target from an ordered run of spectra.
#[derive(Debug, Clone)]
pub struct ChromatogramExtractor<'a> {
    targets: &'a [TargetMass],
    windows: Vec<MassWindow>,
    strategy: SearchStrategy,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> ChromatogramExtractor<'a> {
    /// Fails on the first target with a non-positive mass or window.
    pub fn new(targets: &'a [TargetMass]) -> Result<Self> {
        for (index, target) in targets.iter().enumerate() {
            if !(target.mass.is_finite() && target.mass > 0.0) {
                return Err(ConfigurationError::NonPositiveMass {
                    index,
                    mass: target.mass,
                }
                .into());
            }
            if !(target.half_window.is_finite() && target.half_window > 0.0) {
                return Err(ConfigurationError::NonPositiveTargetWindow {
                    index,
                    mass: target.mass,
                    half_window: target.half_window,
                }
                .into());
            }
        }

        Ok(Self {
            targets,
            windows: targets
                .iter()
                .map(|t| MassWindow::around(t.mass, t.half_window))
                .collect(),
            strategy: SearchStrategy::default(),
            cancel: None,
        })
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Checked once per spectrum; when set the extraction stops with
    /// [`ExtractorError::Cancelled`].
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn use_sorted_peaks(&self) -> bool {
        match self.strategy {
            SearchStrategy::Linear => false,
            SearchStrategy::Sorted => true,
            SearchStrategy::Auto => self.targets.len() >= SORTED_SEARCH_MIN_TARGETS,
        }
    }

    /// Single pass over `spectra` in source order.
    pub fn extract<'s, I>(&self, spectra: I) -> Result<ExtractionResult>
    where
        I: IntoIterator<Item = &'s Spectrum>,
    {
        let spectra = spectra.into_iter();
        let capacity = spectra.size_hint().0;
        let sorted = self.use_sorted_peaks();

        let mut base_peak = TimeSeries::with_capacity(capacity);
        let mut series: Vec<TimeSeries> = self
            .targets
            .iter()
            .map(|_| TimeSeries::with_capacity(capacity))
            .collect();

        let mut previous_rt = f64::NEG_INFINITY;
        let mut warned_unordered = false;

        for (index, spectrum) in spectra.enumerate() {
            if let Some(flag) = self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(ExtractorError::Cancelled {
                        spectrum_index: index,
                    });
                }
            }
            check_spectrum(index, spectrum)?;

            let rt = spectrum.retention_time;
            if rt < previous_rt && !warned_unordered {
                log::warn!("spectrum {index}: retention time {rt} is lower than {previous_rt}");
                warned_unordered = true;
            }
            previous_rt = rt;

            base_peak.push(rt, spectrum.base_peak_intensity());

            if sorted {
                let peaks = SortedPeaks::new(spectrum);
                for (window, eic) in self.windows.iter().zip(series.iter_mut()) {
                    eic.push(rt, peaks.highest_in_window(*window).unwrap_or(0.0));
                }
            } else {
                for (window, eic) in self.windows.iter().zip(series.iter_mut()) {
                    let value =
                        highest_in_window(&spectrum.mz, &spectrum.intensity, *window);
                    eic.push(rt, value.unwrap_or(0.0));
                }
            }
        }

        log::debug!(
            "extracted {} chromatograms over {} spectra (sorted search: {sorted})",
            self.targets.len(),
            base_peak.len()
        );

        let extracted = self
            .targets
            .iter()
            .cloned()
            .zip(series)
            .map(|(target, s)| ExtractedIonChromatogram::new(target, s))
            .collect();
        Ok(ExtractionResult::new(base_peak, extracted))
    }
}

fn check_spectrum(index: usize, spectrum: &Spectrum) -> Result<()> {
    if !spectrum.retention_time.is_finite() {
        return Err(ExtractorError::InvalidSpectrum {
            index,
            reason: format!("retention time {} is not finite", spectrum.retention_time),
        });
    }
    if spectrum.mz.len() != spectrum.intensity.len() {
        return Err(ExtractorError::InvalidSpectrum {
            index,
            reason: format!(
                "{} masses but {} intensities",
                spectrum.mz.len(),
                spectrum.intensity.len()
            ),
        });
    }
    Ok(())
}

/// Extract the BPC and one EIC per target with the default strategy.
pub fn extract(spectra: &[Spectrum], targets: &[TargetMass]) -> Result<ExtractionResult> {
    ChromatogramExtractor::new(targets)?.extract(spectra)
}
