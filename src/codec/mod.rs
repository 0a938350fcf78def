//! Persisted forms of an extraction: a JSON record per acquisition and a
//! flat table for spreadsheet use.

pub mod record;
pub mod table;

pub use record::{from_record, read_record, to_record, write_record, ChromatogramRecord};
pub use table::{to_table, write_csv, write_table, ChromatogramTable};
