use serde::{Deserialize, Serialize};

use crate::errors::{ExtractorError, Result};

// ---------------------------------------------------------------------------
// Spectrum – one scan of an acquisition
// ---------------------------------------------------------------------------

/// A single mass spectrum acquired at one retention time.
///
/// Peaks are stored as two parallel arrays. They are not required to be
/// sorted by mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Retention time in seconds.
    pub retention_time: f64,
    /// Peak masses (m/z).
    pub mz: Vec<f64>,
    /// Peak intensities – same length as `mz`.
    pub intensity: Vec<f64>,
}

impl Spectrum {
    pub fn new(retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            retention_time,
            mz,
            intensity,
        }
    }

    /// Build a spectrum from `(mass, intensity)` pairs.
    pub fn from_peaks(retention_time: f64, peaks: &[(f64, f64)]) -> Self {
        let (mz, intensity) = peaks.iter().copied().unzip();
        Self::new(retention_time, mz, intensity)
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Whether the spectrum has no peaks.
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Highest peak intensity, `0.0` for a spectrum without peaks.
    pub fn base_peak_intensity(&self) -> f64 {
        self.intensity.iter().copied().fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Acquisition – everything read from one file
// ---------------------------------------------------------------------------

/// The spectra of one acquisition file, in retention-time order.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// File stem; outputs are named after it.
    pub name: String,
    pub spectra: Vec<Spectrum>,
}

impl Acquisition {
    pub fn new(name: impl Into<String>, spectra: Vec<Spectrum>) -> Self {
        Self {
            name: name.into(),
            spectra,
        }
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the acquisition is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TargetMass – one line of the mass list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMass {
    pub mass: f64,
    /// Free text, may be empty.
    #[serde(default)]
    pub label: String,
    /// Half width of the extraction window, in mass units.
    pub half_window: f64,
}

impl TargetMass {
    pub fn new(mass: f64, label: impl Into<String>, half_window: f64) -> Self {
        Self {
            mass,
            label: label.into(),
            half_window,
        }
    }

    /// Column / legend name: `label_mass`, or just the mass when unlabeled.
    pub fn display_name(&self) -> String {
        if self.label.is_empty() {
            format_mass(self.mass)
        } else {
            format!("{}_{}", self.label, format_mass(self.mass))
        }
    }
}

/// Shortest representation that keeps a decimal point (`100.0`, `100.05`).
pub fn format_mass(mass: f64) -> String {
    format!("{mass:?}")
}

// ---------------------------------------------------------------------------
// TimeSeries – values aligned to retention times
// ---------------------------------------------------------------------------

/// One value per spectrum, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    retention_times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(retention_times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if retention_times.len() != values.len() {
            return Err(ExtractorError::Alignment {
                series: "time series values".to_string(),
                expected: retention_times.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            retention_times,
            values,
        })
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            retention_times: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, retention_time: f64, value: f64) {
        self.retention_times.push(retention_time);
        self.values.push(value);
    }

    pub fn retention_times(&self) -> &[f64] {
        &self.retention_times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ExtractionResult – BPC plus one EIC per target
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedIonChromatogram {
    target: TargetMass,
    series: TimeSeries,
}

impl ExtractedIonChromatogram {
    pub(crate) fn new(target: TargetMass, series: TimeSeries) -> Self {
        Self { target, series }
    }

    pub fn target(&self) -> &TargetMass {
        &self.target
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }
}

/// Chromatograms of one acquisition. Never mutated once built; re-extracting
/// produces a new result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    base_peak: TimeSeries,
    extracted: Vec<ExtractedIonChromatogram>,
}

impl ExtractionResult {
    pub(crate) fn new(base_peak: TimeSeries, extracted: Vec<ExtractedIonChromatogram>) -> Self {
        Self {
            base_peak,
            extracted,
        }
    }

    pub fn base_peak_chromatogram(&self) -> &TimeSeries {
        &self.base_peak
    }

    /// EICs in target-list order.
    pub fn extracted_ion_chromatograms(&self) -> &[ExtractedIonChromatogram] {
        &self.extracted
    }

    pub fn spectrum_count(&self) -> usize {
        self.base_peak.len()
    }

    /// Every EIC must have one entry per spectrum and share the BPC's
    /// retention times index by index.
    pub fn check_alignment(&self) -> Result<()> {
        let expected = self.base_peak.retention_times();
        for eic in &self.extracted {
            let series = eic.series();
            if series.len() != expected.len() {
                return Err(ExtractorError::Alignment {
                    series: eic.target().display_name(),
                    expected: expected.len(),
                    found: series.len(),
                });
            }
            if let Some(index) = expected
                .iter()
                .zip(series.retention_times())
                .position(|(a, b)| a != b)
            {
                return Err(ExtractorError::AlignmentMismatch {
                    series: eic.target().display_name(),
                    index,
                });
            }
        }
        Ok(())
    }
}
