use std::path::{Path, PathBuf};

use crate::batch::BatchConfig;
use crate::data::masses::parse_mass_list;
use crate::errors::ConfigurationError;

pub const DEFAULT_EXTRACTION_WINDOW: f64 = 0.02;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// What a user has assembled before running an extraction, independent of
/// how it was entered. Turned into a [`BatchConfig`] by [`Session::to_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Raw mass list, one `mass[=label]` per line.
    pub masses_text: String,

    /// Half window in mass units.
    pub extraction_window: f64,

    /// Acquisitions in the order they were added.
    pub acquisition_files: Vec<PathBuf>,

    /// Where records are written (None until chosen).
    pub output_directory: Option<PathBuf>,

    /// Process files in parallel.
    pub parallel: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            masses_text: String::new(),
            extraction_window: DEFAULT_EXTRACTION_WINDOW,
            acquisition_files: Vec::new(),
            output_directory: None,
            parallel: true,
        }
    }
}

impl Session {
    /// Replace the mass list with the contents of `path`.
    pub fn load_masses(&mut self, path: &Path) -> Result<(), ConfigurationError> {
        self.masses_text =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::MassListFile {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Opened mass file: {}", path.display());
        Ok(())
    }

    pub fn save_masses(&self, path: &Path) -> Result<(), ConfigurationError> {
        std::fs::write(path, &self.masses_text).map_err(|source| {
            ConfigurationError::MassListFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        log::info!("Saved mass file: {}", path.display());
        Ok(())
    }

    /// Append acquisitions; earlier additions keep their position.
    pub fn add_files<I, P>(&mut self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.acquisition_files
            .extend(files.into_iter().map(Into::into));
    }

    pub fn clear_files(&mut self) {
        self.acquisition_files.clear();
    }

    pub fn set_output_directory(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        log::info!("Selected output directory: {}", dir.display());
        self.output_directory = Some(dir);
    }

    /// Parse the mass list and validate the whole batch.
    pub fn to_config(&self) -> Result<BatchConfig, ConfigurationError> {
        let output_directory = self
            .output_directory
            .clone()
            .ok_or(ConfigurationError::MissingOutputDirectory)?;
        let targets = parse_mass_list(&self.masses_text, self.extraction_window)?;

        let config = BatchConfig {
            extraction_window: self.extraction_window,
            targets,
            acquisition_files: self.acquisition_files.clone(),
            output_directory,
            parallel: self.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_appended_and_cleared() {
        let mut session = Session::default();
        session.add_files(["b.json", "a.json"]);
        session.add_files(vec![PathBuf::from("c.json")]);
        assert_eq!(
            session.acquisition_files,
            vec![
                PathBuf::from("b.json"),
                PathBuf::from("a.json"),
                PathBuf::from("c.json")
            ]
        );
        session.clear_files();
        assert!(session.acquisition_files.is_empty());
    }

    #[test]
    fn config_requires_output_directory() {
        let mut session = Session::default();
        session.masses_text = "100.0".to_string();
        assert!(matches!(
            session.to_config(),
            Err(ConfigurationError::MissingOutputDirectory)
        ));
    }

    #[test]
    fn config_carries_window_into_targets() {
        let mut session = Session::default();
        session.masses_text = "100.0=a\n200.0\n".to_string();
        session.extraction_window = 0.5;
        session.set_output_directory(std::env::temp_dir());
        let config = session.to_config().unwrap();
        assert_eq!(config.targets.len(), 2);
        assert!(config.targets.iter().all(|t| t.half_window == 0.5));
    }

    #[test]
    fn malformed_masses_stop_config() {
        let mut session = Session::default();
        session.masses_text = "100.0\nabc".to_string();
        session.set_output_directory(std::env::temp_dir());
        assert!(matches!(
            session.to_config(),
            Err(ConfigurationError::MalformedMassLine { line: 2, .. })
        ));
    }
}
