use crate::error::AppError;
use crate::metadata::{MetadataRecord, PhotoRecord};
use crate::metadata_source::MetadataSource;
use crate::report::BatchReport;
use crate::walker;
use chrono::NaiveDateTime;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transfer {
    #[default]
    Move,
    Copy,
}

impl Transfer {
    fn verb(self) -> &'static str {
        match self {
            Transfer::Move => "Moved",
            Transfer::Copy => "Copied",
        }
    }
}

/// Files every dated photo under `src_dir` into `<dest_dir>/<YYYY>/<MM>-<DD>/`.
pub fn organize(
    source: &dyn MetadataSource,
    src_dir: &Path,
    dest_dir: &Path,
    transfer: Transfer,
) -> Result<BatchReport, AppError> {
    walker::ensure_dir(src_dir)?;
    log::info!(
        "Organizing photos from directory: {:?} to {:?} using {}",
        src_dir,
        dest_dir,
        source.name()
    );

    let records = source.read_dir(src_dir, None)?;
    log::debug!("{} records to organize", records.len());

    let mut report = BatchReport::default();
    for record in &records {
        match organize_record(record, dest_dir, transfer) {
            Ok(_) => report.success(),
            Err(e) => report.record(&e),
        }
    }

    log::info!("Organize finished: {}", report);
    Ok(report)
}

fn organize_record(
    record: &MetadataRecord,
    dest_root: &Path,
    transfer: Transfer,
) -> Result<PathBuf, AppError> {
    let photo = PhotoRecord::from_metadata(record)?;
    let taken = photo.capture_time()?;
    let name = photo
        .file_name()
        .ok_or_else(|| AppError::skipped(photo.display_path(), "path has no file name"))?;

    let target = destination_for(dest_root, &taken, name);
    place_file(&photo.source, &target, transfer)?;
    log::info!("{}: {:?} -> {:?}", transfer.verb(), photo.source, target);
    Ok(target)
}

pub fn destination_for(root: &Path, taken: &NaiveDateTime, name: &OsStr) -> PathBuf {
    root.join(taken.format("%Y").to_string())
        .join(taken.format("%m-%d").to_string())
        .join(name)
}

/// Moves or copies `source` to `target`, creating parent directories.
/// Never overwrites: an existing target is a `DestinationCollision`.
pub fn place_file(source: &Path, target: &Path, transfer: Transfer) -> Result<(), AppError> {
    if target.exists() {
        return Err(AppError::DestinationCollision(target.to_path_buf()));
    }
    if !source.is_file() {
        return Err(AppError::skipped(
            source.display().to_string(),
            "source file no longer exists",
        ));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    match transfer {
        Transfer::Move => move_file(source, target)?,
        Transfer::Copy => {
            fs::copy(source, target)?;
        }
    }
    Ok(())
}

/// `rename` first; across filesystems fall back to copy then remove.
fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!("rename {:?} failed ({}), copying instead", source, e);
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}
