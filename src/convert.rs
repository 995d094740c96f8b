use crate::error::AppError;
use crate::report::BatchReport;
use crate::tools::find_executable;
use crate::walker;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Tags exiftool can dump as a full-size JPEG, best first.
const EMBEDDED_JPEG_TAGS: [&str; 2] = ["-JpgFromRaw", "-PreviewImage"];

pub trait RawConverter {
    fn name(&self) -> &str;
    fn target_extension(&self) -> &str;

    /// Converts one file into `target`. `target` does not exist yet.
    fn convert(&self, source: &Path, target: &Path) -> Result<(), AppError>;
}

/// `arw2jpg`: pulls the camera-rendered JPEG embedded in the raw file.
pub struct EmbeddedJpegExtractor {
    exiftool: PathBuf,
}

impl EmbeddedJpegExtractor {
    pub fn new(exiftool: &str) -> Result<Self, AppError> {
        Ok(Self {
            exiftool: find_executable(exiftool)?,
        })
    }
}

impl RawConverter for EmbeddedJpegExtractor {
    fn name(&self) -> &str {
        "exiftool"
    }

    fn target_extension(&self) -> &str {
        "jpg"
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<(), AppError> {
        for tag in EMBEDDED_JPEG_TAGS {
            let output = Command::new(&self.exiftool)
                .arg("-b")
                .arg(tag)
                .arg(source)
                .output()?;

            if output.status.success() && output.stdout.starts_with(&JPEG_SOI) {
                fs::write(target, &output.stdout)?;
                log::debug!("Extracted {} from {:?}", tag, source);
                return Ok(());
            }
            log::trace!("No usable {} in {:?}", tag, source);
        }

        Err(AppError::ConversionFailed {
            path: source.to_path_buf(),
            reason: "no embedded JPEG found".to_string(),
        })
    }
}

/// `arw2dng`: drives Adobe DNG Converter.
pub struct DngConverter {
    program: PathBuf,
}

impl DngConverter {
    pub fn new(program: &str) -> Result<Self, AppError> {
        Ok(Self {
            program: find_executable(program)?,
        })
    }
}

impl RawConverter for DngConverter {
    fn name(&self) -> &str {
        "Adobe DNG Converter"
    }

    fn target_extension(&self) -> &str {
        "dng"
    }

    fn convert(&self, source: &Path, target: &Path) -> Result<(), AppError> {
        let failed = |reason: String| AppError::ConversionFailed {
            path: source.to_path_buf(),
            reason,
        };
        let (Some(dir), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(failed(format!("invalid target {:?}", target)));
        };

        let output = Command::new(&self.program)
            .arg("-c")
            .arg("-d")
            .arg(dir)
            .arg("-o")
            .arg(name)
            .arg(source)
            .output()?;

        if !output.status.success() {
            return Err(failed(format!(
                "{} ({})",
                String::from_utf8_lossy(&output.stderr).trim(),
                output.status
            )));
        }
        if !target.is_file() {
            return Err(failed("converter produced no output".to_string()));
        }
        Ok(())
    }
}

/// Converts every raw file under `src_dir` into `dest_dir`, one file at a time.
/// Outputs mirror the source's subfolders. A failed file is reported and the
/// batch moves on.
pub fn convert_directory(
    converter: &dyn RawConverter,
    src_dir: &Path,
    dest_dir: &Path,
    raw_extension: &str,
) -> Result<BatchReport, AppError> {
    log::info!(
        "Converting {} files in directory: {:?} to {} with {}",
        raw_extension,
        src_dir,
        converter.target_extension().to_uppercase(),
        converter.name()
    );
    let sources = walker::discover_files(src_dir, Some(raw_extension), None)?;
    fs::create_dir_all(dest_dir)?;

    let mut report = BatchReport::default();
    for source in &sources {
        match convert_file(converter, source, src_dir, dest_dir) {
            Ok(target) => {
                log::info!("Converted: {:?} -> {:?}", source, target);
                report.success();
            }
            Err(e) => report.record(&e),
        }
    }

    log::info!("Conversion finished: {}", report);
    Ok(report)
}

fn convert_file(
    converter: &dyn RawConverter,
    source: &Path,
    src_dir: &Path,
    dest_dir: &Path,
) -> Result<PathBuf, AppError> {
    let mut target = walker::mirrored_path(src_dir, source, dest_dir)
        .ok_or_else(|| AppError::skipped(source.display().to_string(), "path has no file name"))?;
    target.set_extension(converter.target_extension());
    if target.exists() {
        return Err(AppError::DestinationCollision(target));
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    converter.convert(source, &target).map_err(|e| match e {
        AppError::Io(io) => AppError::ConversionFailed {
            path: source.to_path_buf(),
            reason: io.to_string(),
        },
        other => other,
    })?;
    Ok(target)
}
