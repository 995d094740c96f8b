use crate::error::AppError;
use crate::metadata::{MetadataRecord, IMAGE_HEIGHT, IMAGE_WIDTH, SOURCE_FILE};
use crate::metadata_source::MetadataSource;
use crate::walker;
use exif::{Exif, In, Reader, Tag};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Photo formats exiftool would pick up when scanning a directory.
const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "heic", "heif", "webp", "gif", "bmp", "arw", "cr2",
    "cr3", "nef", "dng", "raf", "orf", "rw2",
];

/// Reads EXIF in-process, without exiftool. Emits the same tag names exiftool does.
#[derive(Debug, Default)]
pub struct NativeSource;

impl NativeSource {
    pub fn new() -> Self {
        NativeSource
    }
}

impl MetadataSource for NativeSource {
    fn name(&self) -> &str {
        "native"
    }

    fn read_dir(
        &self,
        dir: &Path,
        extension: Option<&str>,
    ) -> Result<Vec<MetadataRecord>, AppError> {
        let mut records = Vec::new();
        for path in walker::discover_files(dir, extension, None)? {
            if !PHOTO_EXTENSIONS.iter().any(|ext| walker::has_extension(&path, ext)) {
                log::trace!("Skipping non-photo file: {:?}", path);
                continue;
            }
            records.push(read_file(&path));
        }
        log::debug!("Read {} records from {:?}", records.len(), dir);
        Ok(records)
    }
}

/// One record per file. A file that cannot be read still gets a record,
/// carrying the reason under `Error` the way exiftool reports it.
fn read_file(path: &Path) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    record.insert(
        SOURCE_FILE.to_string(),
        Value::from(path.to_string_lossy().to_string()),
    );
    if let Some(name) = path.file_name() {
        record.insert("FileName".to_string(), Value::from(name.to_string_lossy().to_string()));
    }
    if let Some(parent) = path.parent() {
        record.insert("Directory".to_string(), Value::from(parent.to_string_lossy().to_string()));
    }

    if let Err(e) = read_tags(path, &mut record) {
        log::warn!("Could not read {:?}: {}", path, e);
        record.insert("Error".to_string(), Value::from(e.to_string()));
    }
    record
}

fn read_tags(path: &Path, record: &mut MetadataRecord) -> Result<(), AppError> {
    log::trace!("Extracting EXIF data for image: {:?}", path);
    let mut buf_reader = BufReader::new(File::open(path)?);
    let exif = match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => Some(exif),
        Err(e) => {
            log::debug!("No EXIF data found for {:?}: {}", path, e);
            None
        }
    };

    if let Some(exif) = &exif {
        for (tag, key) in [
            (Tag::Make, "Make"),
            (Tag::Model, "Model"),
            (Tag::DateTimeOriginal, "DateTimeOriginal"),
            (Tag::DateTimeDigitized, "CreateDate"),
            (Tag::DateTime, "ModifyDate"),
        ] {
            if let Some(text) = ascii_field(exif, tag) {
                log::trace!("{}: {}", key, text);
                record.insert(key.to_string(), Value::from(text));
            }
        }
    }

    let dimensions = match image::image_dimensions(path) {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            log::debug!("Could not decode dimensions for {:?}: {}", path, e);
            exif.as_ref().and_then(exif_dimensions)
        }
    };
    if let Some((width, height)) = dimensions {
        log::debug!("Dimensions for {:?}: {}x{}", path, width, height);
        record.insert(IMAGE_WIDTH.to_string(), Value::from(width));
        record.insert(IMAGE_HEIGHT.to_string(), Value::from(height));
    }

    Ok(())
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).trim_end_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn exif_dimensions(exif: &Exif) -> Option<(u32, u32)> {
    let uint = |tag| {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    };
    uint(Tag::PixelXDimension)
        .zip(uint(Tag::PixelYDimension))
        .or_else(|| uint(Tag::ImageWidth).zip(uint(Tag::ImageLength)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn decodes_dimensions_without_exif() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("frame.jpg");
        image::RgbImage::new(64, 48).save(&jpg).unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a photo").unwrap();

        let records = NativeSource::new().read_dir(dir.path(), None).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record[SOURCE_FILE], Value::from(jpg.to_string_lossy().to_string()));
        assert_eq!(record["FileName"], Value::from("frame.jpg"));
        assert_eq!(record[IMAGE_WIDTH], Value::from(64));
        assert_eq!(record[IMAGE_HEIGHT], Value::from(48));
        assert!(record.get("DateTimeOriginal").is_none());
    }

    #[test]
    fn unreadable_photos_still_yield_a_record() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DSC0001.ARW"), b"definitely not tiff").unwrap();

        let records = NativeSource::new().read_dir(dir.path(), Some("ARW")).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get(IMAGE_WIDTH).is_none());
    }

    #[test]
    fn file_gone_before_reading_is_reported_in_its_record() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("a.jpg");
        image::RgbImage::new(8, 8).save(&kept).unwrap();
        let gone = dir.path().join("b.jpg");

        let records: Vec<_> = [&kept, &gone].iter().map(|p| read_file(p)).collect();

        assert_eq!(records[0][IMAGE_WIDTH], Value::from(8));
        assert!(records[0].get("Error").is_none());
        assert_eq!(records[1]["FileName"], Value::from("b.jpg"));
        assert!(records[1]["Error"].as_str().unwrap().starts_with("I/O error"));
        assert!(records[1].get(IMAGE_WIDTH).is_none());
    }

    #[test]
    fn extension_filter_applies() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(8, 8).save(dir.path().join("a.jpg")).unwrap();

        let records = NativeSource::new().read_dir(dir.path(), Some("ARW")).unwrap();
        assert!(records.is_empty());
    }
}
