use crate::error::AppError;
use crate::metadata::MetadataRecord;
use std::path::Path;

/// Something that can describe every photo below a directory.
///
/// The organizer, exporter and aspect-ratio commands only ever talk to this
/// trait, so tests can hand them a fixed record set instead of a real tool.
pub trait MetadataSource {
    fn name(&self) -> &str;

    /// Reads one record per discovered file. `extension` restricts the scan
    /// to files with that extension (case-insensitive).
    fn read_dir(
        &self,
        dir: &Path,
        extension: Option<&str>,
    ) -> Result<Vec<MetadataRecord>, AppError>;
}
