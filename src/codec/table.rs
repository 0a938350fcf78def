use std::io;
use std::path::Path;

use crate::data::model::ExtractionResult;
use crate::errors::{ExtractorError, Result};

pub const TIME_COLUMN: &str = "time (s)";
pub const BPC_COLUMN: &str = "BPC";

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Flat, spreadsheet-shaped view of one acquisition: retention time, BPC,
/// then one column per EIC in target order. Every column has one row per
/// spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromatogramTable {
    columns: Vec<Column>,
}

impl ChromatogramTable {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }
}

/// Fails with an alignment error, never pads or truncates, when any EIC is
/// out of step with the BPC.
pub fn to_table(result: &ExtractionResult) -> Result<ChromatogramTable> {
    result.check_alignment()?;

    let bpc = result.base_peak_chromatogram();
    let mut columns = Vec::with_capacity(2 + result.extracted_ion_chromatograms().len());
    columns.push(Column {
        name: TIME_COLUMN.to_string(),
        values: bpc.retention_times().to_vec(),
    });
    columns.push(Column {
        name: BPC_COLUMN.to_string(),
        values: bpc.values().to_vec(),
    });
    for eic in result.extracted_ion_chromatograms() {
        columns.push(Column {
            name: eic.target().display_name(),
            values: eic.series().values().to_vec(),
        });
    }
    Ok(ChromatogramTable { columns })
}

pub fn write_csv<W: io::Write>(table: &ChromatogramTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.headers())?;

    let rows = table.row_count();
    for row in 0..rows {
        let mut record = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let value = column.values.get(row).ok_or_else(|| ExtractorError::Alignment {
                series: column.name.clone(),
                expected: rows,
                found: column.values.len(),
            })?;
            record.push(value.to_string());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer
        .flush()
        .map_err(|e| ExtractorError::Csv(csv::Error::from(e)))
}

pub fn write_table(path: &Path, table: &ChromatogramTable) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| ExtractorError::io(path, e))?;
    write_csv(table, io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::record::{from_record, BasePeakRecord, ChromatogramRecord, EicRecord};
    use crate::data::model::{Spectrum, TargetMass};
    use crate::extract::extract;

    #[test]
    fn columns_follow_target_order() {
        let spectra = vec![
            Spectrum::from_peaks(0.0, &[(100.0, 50.0), (200.0, 10.0)]),
            Spectrum::from_peaks(1.0, &[(100.05, 80.0), (200.0, 5.0)]),
            Spectrum::from_peaks(2.0, &[(100.5, 20.0)]),
        ];
        let targets = vec![
            TargetMass::new(200.0, "", 0.1),
            TargetMass::new(100.0, "caffeine", 0.1),
        ];
        let table = to_table(&extract(&spectra, &targets).unwrap()).unwrap();

        assert_eq!(
            table.headers(),
            vec!["time (s)", "BPC", "200.0", "caffeine_100.0"]
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("200.0").unwrap().values, vec![10.0, 5.0, 0.0]);
        assert_eq!(
            table.column("caffeine_100.0").unwrap().values,
            vec![50.0, 80.0, 0.0]
        );

        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("time (s),BPC,200.0,caffeine_100.0"));
        assert_eq!(lines.next(), Some("0,50,10,50"));
        assert_eq!(lines.nth(1), Some("2,20,0,0"));
    }

    #[test]
    fn misaligned_result_is_fatal() {
        let record = ChromatogramRecord {
            bpc: BasePeakRecord {
                rt: vec![0.0, 1.0, 2.0],
                i: vec![1, 2, 3],
            },
            eic: vec![EicRecord {
                mass: 100.0,
                name: String::new(),
                rt: vec![0.0, 1.0],
                i: vec![1.0, 2.0],
                window: None,
            }],
        };
        let result = from_record(record).unwrap();
        let err = to_table(&result).unwrap_err();
        assert!(matches!(
            err,
            ExtractorError::Alignment {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }
}
