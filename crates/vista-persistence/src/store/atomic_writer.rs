use std::path::Path;
use vista_core::{VistaError, VistaResult};

/// Atomic file writer that prevents data corruption
/// Uses write-to-temp-file → atomic-rename pattern for safety
pub struct AtomicWriter;

impl AtomicWriter {
    /// Write data to a file atomically
    /// Writes to a temporary file first, then atomically renames it
    /// This prevents corruption if the process crashes mid-write
    pub fn write_atomic(path: &Path, data: &[u8]) -> VistaResult<()> {
        // Create temp file in same directory to ensure same filesystem
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;
        let temp_file = tempfile::NamedTempFile::new_in(parent)?;

        std::fs::write(temp_file.path(), data)?;

        temp_file
            .persist(path)
            .map_err(|e| VistaError::Storage(e.to_string()))?;

        tracing::debug!("Atomically wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    /// Read all data from a file
    pub fn read_all(path: &Path) -> VistaResult<Vec<u8>> {
        let data = std::fs::read(path)?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }
}
