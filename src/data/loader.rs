use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Acquisition, Spectrum};

// ---------------------------------------------------------------------------
// Spectrum sources
// ---------------------------------------------------------------------------

/// Anything that can turn an acquisition path into an ordered list of spectra.
///
/// Implementations must be `Sync` so one source can serve several worker
/// threads, each reading a different file.
pub trait SpectrumSource: Sync {
    fn read_acquisition(&self, path: &Path) -> Result<Acquisition>;
}

/// Reads acquisitions from disk, dispatching on the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl SpectrumSource for FileSource {
    fn read_acquisition(&self, path: &Path) -> Result<Acquisition> {
        load_file(path)
    }
}

/// Load an acquisition from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per spectrum with `rt`, `mz` and `intensity` columns
/// * `.json`    – `[{ "rt": 0.5, "mz": [...], "intensity": [...] }, ...]`
/// * `.csv`     – columns `rt`, `mz`, `intensity`; peak lists semicolon-separated
pub fn load_file(path: &Path) -> Result<Acquisition> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let spectra = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("acquisition");

    log::debug!("Read {} spectra from {}", spectra.len(), path.display());
    Ok(Acquisition::new(name, spectra))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema, one object per spectrum in acquisition order:
///
/// ```json
/// [
///   { "rt": 0.52, "mz": [100.0, 200.1], "intensity": [50.0, 10.0] },
///   ...
/// ]
/// ```
/// Any other keys are ignored.
fn load_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Spectrum {i} is not a JSON object"))?;

        let rt = obj
            .get("rt")
            .and_then(JsonValue::as_f64)
            .with_context(|| format!("Spectrum {i}: missing or invalid 'rt'"))?;
        let mz = json_array_to_f64(obj.get("mz"), i, "mz")?;
        let intensity = json_array_to_f64(obj.get("intensity"), i, "intensity")?;

        if mz.len() != intensity.len() {
            bail!(
                "Spectrum {i}: mz has {} values but intensity has {}",
                mz.len(),
                intensity.len()
            );
        }

        spectra.push(Spectrum::new(rt, mz, intensity));
    }

    Ok(spectra)
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Spectrum {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Spectrum {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, one spectrum per record.
/// `mz` and `intensity` hold semicolon-separated floats:
///   `0.52,"100.0;200.1","50.0;10.0"`
/// An empty cell is a spectrum without peaks.
fn load_csv(path: &Path) -> Result<Vec<Spectrum>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let rt_idx = column("rt")?;
    let mz_idx = column("mz")?;
    let int_idx = column("intensity")?;

    let mut spectra = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let rt_cell = record.get(rt_idx).unwrap_or("").trim();
        let rt = rt_cell
            .parse::<f64>()
            .with_context(|| format!("Row {row_no}, rt: '{rt_cell}' is not a number"))?;
        let mz = parse_semicolon_floats(record.get(mz_idx).unwrap_or(""), row_no, "mz")?;
        let intensity =
            parse_semicolon_floats(record.get(int_idx).unwrap_or(""), row_no, "intensity")?;

        if mz.len() != intensity.len() {
            bail!(
                "CSV row {row_no}: mz has {} values but intensity has {}",
                mz.len(),
                intensity.len()
            );
        }

        spectra.push(Spectrum::new(rt, mz, intensity));
    }

    Ok(spectra)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one row per spectrum.
///
/// Expected schema:
/// - `rt`: Float64 or Float32 – retention time in seconds
/// - `mz`: List<Float64> or LargeList<Float64> (Float32 items accepted)
/// - `intensity`: same list types as `mz`; a null item in either list drops that peak
/// - Other columns are ignored.
fn load_parquet(path: &Path) -> Result<Vec<Spectrum>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))
        };
        let rt_col = batch.column(index_of("rt")?);
        let mz_col = batch.column(index_of("mz")?);
        let int_col = batch.column(index_of("intensity")?);

        for row in 0..batch.num_rows() {
            let offset = spectra.len();
            let rt = extract_f64(rt_col, row)
                .with_context(|| format!("Spectrum {offset}: failed to read 'rt'"))?;
            let mz = extract_f64_list(mz_col, row)
                .with_context(|| format!("Spectrum {offset}: failed to read 'mz'"))?;
            let intensity = extract_f64_list(int_col, row)
                .with_context(|| format!("Spectrum {offset}: failed to read 'intensity'"))?;

            if mz.len() != intensity.len() {
                bail!(
                    "Spectrum {offset}: mz has {} values but intensity has {}",
                    mz.len(),
                    intensity.len()
                );
            }
            let len = mz.len();

            // a peak with a null mass or intensity is dropped, not zeroed
            let (mz, intensity): (Vec<f64>, Vec<f64>) = mz
                .into_iter()
                .zip(intensity)
                .filter_map(|(m, i)| Some((m?, i?)))
                .unzip();
            let dropped = len - mz.len();
            if dropped > 0 {
                log::debug!("Spectrum {offset}: dropped {dropped} peaks with null values");
            }

            spectra.push(Spectrum::new(rt, mz, intensity));
        }
    }

    Ok(spectra)
}

// -- Parquet / Arrow helpers --

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("Expected Float64 or Float32, got {:?}", col.data_type())
    }
}

/// Extract the items of a List or LargeList column at the given row.
/// Null items stay `None`.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<Option<f64>>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.map(f64::from)).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolon_floats() {
        assert_eq!(
            parse_semicolon_floats("100.0; 200.5;300", 0, "mz").unwrap(),
            vec![100.0, 200.5, 300.0]
        );
        assert!(parse_semicolon_floats("", 0, "mz").unwrap().is_empty());
        let err = parse_semicolon_floats("1.0;x", 3, "mz").unwrap_err();
        assert!(format!("{err:#}").contains("Row 3, mz[1]"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("run01.mzML")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
