//! Windowed peak search and the single-pass chromatogram extraction built on it.

pub mod extractor;
pub mod window;

pub use extractor::{extract, ChromatogramExtractor, SearchStrategy};
pub use window::{find_highest_in_window, MassWindow, SortedPeaks};
