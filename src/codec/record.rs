use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::model::{ExtractedIonChromatogram, ExtractionResult, TargetMass, TimeSeries};
use crate::errors::{ExtractorError, Result};

// ---------------------------------------------------------------------------
// Persisted shape
// ---------------------------------------------------------------------------

/// On-disk form of an [`ExtractionResult`]:
///
/// ```json
/// {
///     "BPC": { "rt": [0.0, 1.0], "i": [50, 80] },
///     "EIC": [ { "mass": 100.0, "name": "", "rt": [0.0, 1.0], "i": [50.0, 80.0], "window": 0.1 } ]
/// }
/// ```
///
/// Unknown keys are ignored when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromatogramRecord {
    #[serde(rename = "BPC")]
    pub bpc: BasePeakRecord,
    #[serde(rename = "EIC", default)]
    pub eic: Vec<EicRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePeakRecord {
    pub rt: Vec<f64>,
    /// Truncated towards zero.
    pub i: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EicRecord {
    pub mass: f64,
    #[serde(default)]
    pub name: String,
    pub rt: Vec<f64>,
    pub i: Vec<f64>,
    /// Half window used for the extraction; absent in older files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<f64>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Lossy only for the BPC intensities, which are stored as integers
/// (`7.9` becomes `7`).
pub fn to_record(result: &ExtractionResult) -> ChromatogramRecord {
    let bpc = result.base_peak_chromatogram();
    ChromatogramRecord {
        bpc: BasePeakRecord {
            rt: bpc.retention_times().to_vec(),
            i: bpc.values().iter().map(|&v| v as i64).collect(),
        },
        eic: result
            .extracted_ion_chromatograms()
            .iter()
            .map(|eic| EicRecord {
                mass: eic.target().mass,
                name: eic.target().label.clone(),
                rt: eic.series().retention_times().to_vec(),
                i: eic.series().values().to_vec(),
                window: Some(eic.target().half_window),
            })
            .collect(),
    }
}

/// Inverse of [`to_record`]. A record without a `window` yields targets
/// with a half window of `0.0`.
pub fn from_record(record: ChromatogramRecord) -> Result<ExtractionResult> {
    let bpc = series(
        "BPC",
        record.bpc.rt,
        record.bpc.i.into_iter().map(|v| v as f64).collect(),
    )?;

    let extracted = record
        .eic
        .into_iter()
        .map(|eic| {
            let target = TargetMass::new(eic.mass, eic.name, eic.window.unwrap_or(0.0));
            let series = series(&target.display_name(), eic.rt, eic.i)?;
            Ok(ExtractedIonChromatogram::new(target, series))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExtractionResult::new(bpc, extracted))
}

fn series(name: &str, rt: Vec<f64>, values: Vec<f64>) -> Result<TimeSeries> {
    TimeSeries::new(rt, values).map_err(|e| match e {
        ExtractorError::Alignment { expected, found, .. } => ExtractorError::Alignment {
            series: name.to_string(),
            expected,
            found,
        },
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Write `record` as JSON indented with four spaces.
pub fn write_record(path: &Path, record: &ChromatogramRecord) -> Result<()> {
    let file = File::create(path).map_err(|e| ExtractorError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    record.serialize(&mut serializer)?;
    writer.flush().map_err(|e| ExtractorError::io(path, e))
}

pub fn read_record(path: &Path) -> Result<ChromatogramRecord> {
    let file = File::open(path).map_err(|e| ExtractorError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
