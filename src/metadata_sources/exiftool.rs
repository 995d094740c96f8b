use crate::error::AppError;
use crate::metadata::MetadataRecord;
use crate::metadata_source::MetadataSource;
use crate::tools::find_executable;
use crate::walker;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct ExifToolSource {
    program: PathBuf,
}

impl ExifToolSource {
    pub fn new(program: &str) -> Result<Self, AppError> {
        let program = find_executable(program)?;
        log::debug!("Using exiftool at {:?}", program);
        Ok(Self { program })
    }

    fn command(&self, dir: &Path, extension: Option<&str>) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-r").arg("-json");
        if let Some(ext) = extension {
            command.arg("-ext").arg(ext);
        }
        command.arg(dir);
        command
    }
}

impl MetadataSource for ExifToolSource {
    fn name(&self) -> &str {
        "exiftool"
    }

    fn read_dir(
        &self,
        dir: &Path,
        extension: Option<&str>,
    ) -> Result<Vec<MetadataRecord>, AppError> {
        // exiftool exits non-zero when a scan finds nothing to read.
        if walker::discover_files(dir, extension, None)?.is_empty() {
            log::info!("No matching files in {:?}", dir);
            return Ok(Vec::new());
        }

        let mut command = self.command(dir, extension);
        log::debug!("Running {:?}", command);
        let output = command.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => AppError::ToolUnavailable {
                tool: self.program.display().to_string(),
            },
            _ => AppError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("Exiftool error:\n{}", stderr);
            return Err(AppError::ExtractionFailed {
                tool: "exiftool".to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let records: Vec<MetadataRecord> = serde_json::from_slice(&output.stdout)?;
        log::debug!("exiftool returned {} records for {:?}", records.len(), dir);
        Ok(records)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn dir_with_photo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DSC0001.ARW"), b"raw").unwrap();
        dir
    }

    #[test]
    fn missing_tool_is_reported_at_construction() {
        assert!(matches!(
            ExifToolSource::new("photo-utils-missing-exiftool"),
            Err(AppError::ToolUnavailable { .. })
        ));
    }

    #[test]
    fn nonzero_exit_is_extraction_failure() {
        let dir = dir_with_photo();
        let source = ExifToolSource::new("false").unwrap();
        let err = source.read_dir(dir.path(), None).unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed { tool, .. } if tool == "exiftool"));
    }

    #[test]
    fn silent_success_is_an_empty_sequence() {
        let dir = dir_with_photo();
        let source = ExifToolSource::new("true").unwrap();
        assert!(source.read_dir(dir.path(), Some("ARW")).unwrap().is_empty());
    }

    #[test]
    fn empty_directory_does_not_invoke_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        // `false` would fail if it were run.
        let source = ExifToolSource::new("false").unwrap();
        assert!(source.read_dir(dir.path(), None).unwrap().is_empty());
    }

    #[test]
    fn unparseable_output_is_a_json_error() {
        let dir = dir_with_photo();
        // echo prints its arguments, which is not a JSON array.
        let source = ExifToolSource::new("echo").unwrap();
        assert!(matches!(
            source.read_dir(dir.path(), None),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn command_carries_recursion_json_and_extension() {
        let source = ExifToolSource::new("true").unwrap();
        let command = source.command(Path::new("/photos"), Some("ARW"));
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-r", "-json", "-ext", "ARW", "/photos"]);
    }
}
