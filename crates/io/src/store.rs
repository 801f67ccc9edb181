// Measurement mapping store
// Loaded once at the start of a run, saved once before its outputs are written.

use std::path::{Path, PathBuf};

use reprice_recon::{MeasurementMapping, ReconError};

use crate::csv::{read_file_as_utf8, write_text};

pub const DEFAULT_MAPPING_FILE: &str = "measurement_mappings.json";

/// A [`MeasurementMapping`] together with the file it came from.
#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
    pub mapping: MeasurementMapping,
}

impl MappingStore {
    /// Load the mapping at `path`; a missing file is an empty mapping.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ReconError> {
        let path = path.into();
        let mapping = if path.exists() {
            let content = read_file_as_utf8(&path)?;
            MeasurementMapping::from_json(&content)
                .map_err(|e| ReconError::Mapping(format!("{}: {e}", path.display())))?
        } else {
            tracing::debug!(path = %path.display(), "no mapping file, starting empty");
            MeasurementMapping::new()
        };
        Ok(Self { path, mapping })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the mapping if anything was learned since loading. Returns
    /// whether the file was written.
    pub fn save(&mut self) -> Result<bool, ReconError> {
        if !self.mapping.is_dirty() {
            return Ok(false);
        }
        let json = self.mapping.to_json()?;
        write_text(&self.path, &json)?;
        self.mapping.mark_clean();
        tracing::info!(path = %self.path.display(), entries = self.mapping.len(), "saved measurement mapping");
        Ok(true)
    }
}
