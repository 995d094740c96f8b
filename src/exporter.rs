use crate::error::AppError;
use crate::metadata::MetadataRecord;
use crate::metadata_source::MetadataSource;
use crate::walker;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every record under `src_dir` to `dest_file` as an indented JSON array.
pub fn export_exif_to_json(
    source: &dyn MetadataSource,
    src_dir: &Path,
    dest_file: &Path,
    extension: Option<&str>,
) -> Result<usize, AppError> {
    walker::ensure_dir(src_dir)?;
    log::info!(
        "Exporting EXIF data from directory: {:?} to JSON file: {:?}",
        src_dir,
        dest_file
    );

    let records = source.read_dir(src_dir, extension)?;

    if let Some(parent) = dest_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(dest_file)?);
    write_records(&records, &mut writer)?;
    writer.flush()?;

    log::info!("EXIF metadata for {} files written to: {:?}", records.len(), dest_file);
    Ok(records.len())
}

fn write_records(records: &[MetadataRecord], writer: &mut impl Write) -> Result<(), AppError> {
    let mut serializer = Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    writeln!(writer)?;
    Ok(())
}
