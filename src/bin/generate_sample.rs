use std::sync::Arc;

use arrow::array::{Float64Array, Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Compounds eluting in the synthetic run: (label, m/z, apex rt (s), peak width (s), height).
const COMPOUNDS: [(&str, f64, f64, f64, f64); 4] = [
    ("caffeine", 195.0877, 120.0, 6.0, 4.0e5),
    ("tryptophan", 205.0972, 210.0, 8.0, 1.5e5),
    ("palmitate", 255.2324, 420.0, 10.0, 8.0e5),
    ("reserpine", 609.2812, 480.0, 5.0, 6.0e4),
];

fn elution(rt: f64, apex: f64, width: f64, height: f64) -> f64 {
    height * (-(rt - apex).powi(2) / (2.0 * width.powi(2))).exp()
}

/// Small deterministic generator (splitmix64), enough for background noise.
struct NoiseRng(u64);

impl NoiseRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn generate_spectrum(rt: f64, rng: &mut NoiseRng) -> (Vec<f64>, Vec<f64>) {
    let mut peaks: Vec<(f64, f64)> = (0..200)
        .map(|_| (100.0 + rng.uniform() * 900.0, rng.uniform() * 2.0e3))
        .collect();

    for &(_, mz, apex, width, height) in &COMPOUNDS {
        let intensity = elution(rt, apex, width, height);
        if intensity > 1.0 {
            // a few ppm of mass error
            let jitter = (rng.uniform() - 0.5) * 2.0 * mz * 3e-6;
            peaks.push((mz + jitter, intensity));
        }
    }

    peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
    peaks.into_iter().unzip()
}

fn list_array(rows: &[Vec<f64>]) -> arrow::array::ListArray {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.values().append_slice(row);
        builder.append(true);
    }
    builder.finish()
}

fn main() -> anyhow::Result<()> {
    let mut rng = NoiseRng(42);

    // One MS1 scan every 0.5 s for 10 minutes
    let rts: Vec<f64> = (0..1200).map(|i| i as f64 * 0.5).collect();

    let mut all_mz = Vec::with_capacity(rts.len());
    let mut all_intensity = Vec::with_capacity(rts.len());
    for &rt in &rts {
        let (mz, intensity) = generate_spectrum(rt, &mut rng);
        all_mz.push(mz);
        all_intensity.push(intensity);
    }

    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("rt", DataType::Float64, false),
        Field::new("mz", DataType::List(item.clone()), false),
        Field::new("intensity", DataType::List(item), false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(rts.clone())),
            Arc::new(list_array(&all_mz)),
            Arc::new(list_array(&all_intensity)),
        ],
    )?;

    let output_path = "sample_run.parquet";
    let file = std::fs::File::create(output_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let masses: String = COMPOUNDS
        .iter()
        .map(|(label, mz, ..)| format!("{mz}={label}\n"))
        .collect();
    std::fs::write("sample_masses.txt", masses)?;

    println!(
        "Wrote {} spectra to {output_path} and {} target masses to sample_masses.txt",
        rts.len(),
        COMPOUNDS.len()
    );
    Ok(())
}
