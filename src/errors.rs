use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors – detected before any extraction work begins
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no output directory selected")]
    MissingOutputDirectory,

    #[error("output directory {0} does not exist")]
    OutputDirectoryNotFound(PathBuf),

    #[error("output path {0} is not a directory")]
    OutputNotADirectory(PathBuf),

    #[error("extraction window must be a positive number, got {0}")]
    NonPositiveWindow(f64),

    #[error("target #{index} has mass {mass}; target masses must be positive")]
    NonPositiveMass { index: usize, mass: f64 },

    #[error("target #{index} ({mass}) has extraction window {half_window}; windows must be positive")]
    NonPositiveTargetWindow {
        index: usize,
        mass: f64,
        half_window: f64,
    },

    #[error("target #{index} ({mass}) has extraction window {half_window}, but the batch window is {extraction_window}")]
    WindowMismatch {
        index: usize,
        mass: f64,
        half_window: f64,
        extraction_window: f64,
    },

    #[error("writing {output} would overwrite the input {input}")]
    OutputOverwritesInput { input: PathBuf, output: PathBuf },

    #[error("mass list line {line} ({content:?}): {reason}")]
    MalformedMassLine {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("acquisitions {first} and {second} would both be written as {name}")]
    DuplicateOutputName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("cannot derive an output name from {0}")]
    UnnamedAcquisition(PathBuf),

    #[error("cannot access mass list {path}: {source}")]
    MassListFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Everything else
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Raised by the spectrum source; fatal for that one acquisition only.
    #[error("failed to read acquisition {path}: {cause:#}")]
    SourceRead { path: PathBuf, cause: anyhow::Error },

    #[error("spectrum {index}: {reason}")]
    InvalidSpectrum { index: usize, reason: String },

    /// A series does not have one entry per spectrum.
    #[error("series {series} has {found} entries, expected {expected}")]
    Alignment {
        series: String,
        expected: usize,
        found: usize,
    },

    /// A series has the right length but its retention times disagree with the BPC.
    #[error("series {series} retention time at row {index} differs from the base peak chromatogram")]
    AlignmentMismatch { series: String, index: usize },

    #[error("extraction cancelled at spectrum {spectrum_index}")]
    Cancelled { spectrum_index: usize },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ExtractorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Alignment failures point at a logic bug upstream, never at bad input.
    pub fn is_alignment(&self) -> bool {
        matches!(self, Self::Alignment { .. } | Self::AlignmentMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
