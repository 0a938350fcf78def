//! Base peak and extracted ion chromatograms from LC-MS acquisitions.
//!
//! ```text
//!  acquisition ──► data::loader ──► extract ──► codec::record ──► <name>.json
//!                                                     │
//!                                                     └──► codec::table ──► <name>.csv
//! ```

pub mod batch;
pub mod codec;
pub mod data;
pub mod errors;
pub mod extract;
pub mod state;

pub use crate::batch::{convert_directory, run_batch, BatchConfig, BatchReport, FileOutcome};
pub use crate::data::loader::{FileSource, SpectrumSource};
pub use crate::data::model::{Acquisition, ExtractionResult, Spectrum, TargetMass, TimeSeries};
pub use crate::errors::{ConfigurationError, ExtractorError};
pub use crate::extract::{extract, ChromatogramExtractor};
pub use crate::state::Session;
