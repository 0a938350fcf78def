use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codec::table::TIME_COLUMN;
use crate::codec::{from_record, read_record, to_record, to_table, write_record, write_table};
use crate::data::loader::SpectrumSource;
use crate::data::model::TargetMass;
use crate::errors::{ConfigurationError, ExtractorError, Result};
use crate::extract::ChromatogramExtractor;

pub const RECORD_EXTENSION: &str = "json";
pub const TABLE_EXTENSION: &str = "csv";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything one extraction batch needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Half window in mass units, shared by all targets.
    pub extraction_window: f64,
    pub targets: Vec<TargetMass>,
    pub acquisition_files: Vec<PathBuf>,
    pub output_directory: PathBuf,
    /// Process acquisition files on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl BatchConfig {
    /// Checks everything that can be checked without reading an acquisition.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigurationError::MissingOutputDirectory);
        }
        if !self.output_directory.exists() {
            return Err(ConfigurationError::OutputDirectoryNotFound(
                self.output_directory.clone(),
            ));
        }
        if !self.output_directory.is_dir() {
            return Err(ConfigurationError::OutputNotADirectory(
                self.output_directory.clone(),
            ));
        }
        if !(self.extraction_window.is_finite() && self.extraction_window > 0.0) {
            return Err(ConfigurationError::NonPositiveWindow(self.extraction_window));
        }
        for (index, target) in self.targets.iter().enumerate() {
            if !(target.mass.is_finite() && target.mass > 0.0) {
                return Err(ConfigurationError::NonPositiveMass {
                    index,
                    mass: target.mass,
                });
            }
            if !(target.half_window.is_finite() && target.half_window > 0.0) {
                return Err(ConfigurationError::NonPositiveTargetWindow {
                    index,
                    mass: target.mass,
                    half_window: target.half_window,
                });
            }
            if target.half_window != self.extraction_window {
                return Err(ConfigurationError::WindowMismatch {
                    index,
                    mass: target.mass,
                    half_window: target.half_window,
                    extraction_window: self.extraction_window,
                });
            }
        }

        let output_directory = resolve(&self.output_directory);
        let mut seen: HashMap<String, &PathBuf> = HashMap::new();
        for path in &self.acquisition_files {
            let name = output_stem(path)?;
            if let Some(first) = seen.insert(name.clone(), path) {
                return Err(ConfigurationError::DuplicateOutputName {
                    name: format!("{name}.{RECORD_EXTENSION}"),
                    first: first.clone(),
                    second: path.clone(),
                });
            }
            let output = output_directory.join(format!("{name}.{RECORD_EXTENSION}"));
            if resolve(path) == output {
                return Err(ConfigurationError::OutputOverwritesInput {
                    input: path.clone(),
                    output,
                });
            }
        }
        Ok(())
    }

    pub fn record_path(&self, acquisition: &Path) -> std::result::Result<PathBuf, ConfigurationError> {
        let stem = output_stem(acquisition)?;
        Ok(self
            .output_directory
            .join(format!("{stem}.{RECORD_EXTENSION}")))
    }
}

/// Canonical form of `path`, or of its parent when the file does not exist yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn output_stem(path: &Path) -> std::result::Result<String, ConfigurationError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConfigurationError::UnnamedAcquisition(path.to_path_buf()))
}

// ---------------------------------------------------------------------------
// Per-file outcomes
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// The written file, or why nothing was written.
    pub result: Result<PathBuf>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Same order as the input files.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} acquisitions extracted, {} failed",
            self.succeeded(),
            self.outcomes.len(),
            self.failed()
        )
    }
}

// ---------------------------------------------------------------------------
// Extraction batch
// ---------------------------------------------------------------------------

/// Extract every acquisition in `config` and write one JSON record each.
///
/// Configuration problems abort before any file is touched. A file that
/// cannot be read or extracted is reported in its [`FileOutcome`] and the
/// remaining files are still processed.
pub fn run_batch(
    config: &BatchConfig,
    source: &dyn SpectrumSource,
    cancel: Option<&AtomicBool>,
) -> Result<BatchReport> {
    config.validate()?;
    log::info!(
        "Extracting {} chromatograms from {} acquisitions (window ±{})",
        config.targets.len(),
        config.acquisition_files.len(),
        config.extraction_window
    );

    let process = |path: &PathBuf| {
        let result = process_file(config, source, path, cancel);
        match &result {
            Ok(out) => log::info!("Saved chromatograms from {} to {}", path.display(), out.display()),
            Err(e) => log::error!("{}: {e}", path.display()),
        }
        FileOutcome {
            input: path.clone(),
            result,
        }
    };

    let outcomes: Vec<FileOutcome> = if config.parallel {
        config.acquisition_files.par_iter().map(process).collect()
    } else {
        config.acquisition_files.iter().map(process).collect()
    };

    let report = BatchReport { outcomes };
    if report.failed() > 0 {
        log::warn!("{report}");
    } else {
        log::info!("{report}");
    }
    Ok(report)
}

fn process_file(
    config: &BatchConfig,
    source: &dyn SpectrumSource,
    path: &Path,
    cancel: Option<&AtomicBool>,
) -> Result<PathBuf> {
    log::info!("Loading {} ...", path.display());
    let acquisition = source
        .read_acquisition(path)
        .map_err(|cause| ExtractorError::SourceRead {
            path: path.to_path_buf(),
            cause,
        })?;
    log::debug!("{}: {} spectra", acquisition.name, acquisition.len());

    let mut extractor = ChromatogramExtractor::new(&config.targets)?;
    if let Some(flag) = cancel {
        extractor = extractor.with_cancel_flag(flag);
    }
    let result = extractor.extract(&acquisition.spectra)?;

    let out = config.record_path(path)?;
    write_record(&out, &to_record(&result))?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// JSON → table conversion
// ---------------------------------------------------------------------------

/// Convert every JSON record in `directory` into a CSV table next to it.
///
/// With `remove_json` the record is deleted once its table is written.
pub fn convert_directory(directory: &Path, remove_json: bool) -> Result<Vec<FileOutcome>> {
    if directory.as_os_str().is_empty() {
        return Err(ConfigurationError::MissingOutputDirectory.into());
    }
    if !directory.is_dir() {
        return Err(ConfigurationError::OutputDirectoryNotFound(directory.to_path_buf()).into());
    }

    let entries = std::fs::read_dir(directory).map_err(|e| ExtractorError::io(directory, e))?;
    let mut records = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ExtractorError::io(directory, e))?.path();
        let is_record = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(RECORD_EXTENSION));
        if is_record && path.is_file() {
            records.push(path);
        }
    }
    records.sort();

    if records.is_empty() {
        log::warn!("No records found in {}", directory.display());
    }

    let outcomes = records
        .into_iter()
        .map(|path| {
            let result = convert_record(&path, remove_json);
            if let Err(e) = &result {
                log::error!("{}: {e}", path.display());
            }
            FileOutcome {
                input: path,
                result,
            }
        })
        .collect();
    Ok(outcomes)
}

fn convert_record(path: &Path, remove_json: bool) -> Result<PathBuf> {
    let result = from_record(read_record(path)?)?;
    let table = to_table(&result)?;
    let out = path.with_extension(TABLE_EXTENSION);
    if !is_replaceable_table(&out) {
        return Err(ConfigurationError::OutputOverwritesInput {
            input: out.clone(),
            output: out,
        }
        .into());
    }
    write_table(&out, &table)?;
    if remove_json {
        std::fs::remove_file(path).map_err(|e| ExtractorError::io(path, e))?;
    }
    log::info!("Converted {} to {}", path.display(), out.display());
    Ok(out)
}

/// A missing file, or a table an earlier conversion wrote.
fn is_replaceable_table(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }
    csv::Reader::from_path(path).is_ok_and(|mut reader| {
        reader
            .headers()
            .is_ok_and(|headers| headers.get(0) == Some(TIME_COLUMN))
    })
}
