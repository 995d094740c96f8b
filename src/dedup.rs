use crate::error::AppError;
use crate::organizer::{place_file, Transfer};
use crate::report::BatchReport;
use crate::walker;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Buffer size for streaming hash computation (64KB)
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Files sharing one content hash. `keep` is the oldest by modification
/// time, ties broken by path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub hash: String,
    pub keep: PathBuf,
    pub duplicates: Vec<PathBuf>,
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    modified: SystemTime,
}

pub fn hash_file(path: &Path) -> Result<String, AppError> {
    log::trace!("Calculating hash for: {:?}", path);
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; HASH_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    let hash = format!("{:x}", hasher.finalize());
    log::debug!("Calculated hash for {:?}: {}", path, hash);
    Ok(hash)
}

/// Groups identical files under `root`. Only files of equal size are hashed.
/// Unreadable files are counted as failures in `report` and left out.
pub fn find_duplicates(
    root: &Path,
    exclude: Option<&Path>,
    report: &mut BatchReport,
) -> Result<Vec<DuplicateGroup>, AppError> {
    let mut by_size: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();
    for path in walker::discover_files(root, None, exclude)? {
        match fs::metadata(&path) {
            Ok(meta) => by_size.entry(meta.len()).or_default().push(path),
            Err(e) => report.record(&AppError::Io(e)),
        }
    }

    let mut by_hash: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    for paths in by_size.into_values().filter(|p| p.len() > 1) {
        for path in paths {
            let hashed = hash_file(&path).and_then(|hash| {
                let modified = fs::metadata(&path)?
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Ok((hash, modified))
            });
            match hashed {
                Ok((hash, modified)) => by_hash
                    .entry(hash)
                    .or_default()
                    .push(Candidate { path, modified }),
                Err(e) => report.record(&e),
            }
        }
    }

    let mut groups: Vec<DuplicateGroup> = by_hash
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(hash, mut members)| {
            members.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
            let mut paths = members.into_iter().map(|c| c.path);
            let keep = paths.next().unwrap_or_default();
            DuplicateGroup {
                hash,
                keep,
                duplicates: paths.collect(),
            }
        })
        .collect();
    groups.sort_by(|a, b| a.keep.cmp(&b.keep));
    Ok(groups)
}

/// Moves every non-retained copy into `<src_dir>/<quarantine>/<relative path>`.
pub fn clean_dupes(
    src_dir: &Path,
    quarantine: &str,
    dry_run: bool,
) -> Result<BatchReport, AppError> {
    walker::ensure_dir(src_dir)?;
    log::info!("Cleaning duplicates in directory: {:?}", src_dir);

    let quarantine_dir = src_dir.join(quarantine);
    let mut report = BatchReport::default();
    let groups = find_duplicates(src_dir, Some(&quarantine_dir), &mut report)?;
    log::info!("Found {} groups of identical files", groups.len());

    for group in &groups {
        log::info!("Keeping {:?} ({})", group.keep, group.hash);
        for duplicate in &group.duplicates {
            let relative = duplicate.strip_prefix(src_dir).unwrap_or(duplicate);
            let target = quarantine_dir.join(relative);

            if dry_run {
                log::info!("Would move duplicate: {:?} -> {:?}", duplicate, target);
                report.success();
                continue;
            }

            match place_file(duplicate, &target, Transfer::Move) {
                Ok(()) => {
                    log::info!("Moved duplicate: {:?} -> {:?}", duplicate, target);
                    report.success();
                }
                Err(e) => report.record(&e),
            }
        }
    }

    log::info!("Duplicate cleanup finished: {}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};

    fn outside_quarantine(dir: &Path) -> Vec<PathBuf> {
        walker::discover_files(dir, None, Some(&dir.join("_duplicates"))).unwrap()
    }

    #[test]
    fn one_duplicated_jpeg_leaves_one_copy_outside_quarantine() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("DSC0001.JPG");
        let copy = dir.path().join("copy_DSC0001.JPG");
        fs::write(&original, b"jpeg bytes").unwrap();
        fs::copy(&original, &copy).unwrap();

        let report = clean_dupes(dir.path(), "_duplicates", false).unwrap();

        assert_eq!(report.processed, 1);
        assert!(dir.path().join("_duplicates").is_dir());
        assert_eq!(outside_quarantine(dir.path()).len(), 1);
        assert_eq!(walker::discover_files(&dir.path().join("_duplicates"), None, None).unwrap().len(), 1);
        assert!(!copy.exists() || !original.exists());
    }

    #[test]
    fn oldest_copy_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let newer = dir.path().join("a.jpg");
        let older = dir.path().join("b.jpg");
        fs::write(&newer, b"same").unwrap();
        fs::write(&older, b"same").unwrap();
        set_file_mtime(&newer, FileTime::from_unix_time(2_000_000_000, 0)).unwrap();
        set_file_mtime(&older, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();

        clean_dupes(dir.path(), "_duplicates", false).unwrap();

        assert!(older.exists());
        assert!(!newer.exists());
        assert!(dir.path().join("_duplicates/a.jpg").exists());
    }

    #[test]
    fn equal_times_fall_back_to_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jpg");
        let second = dir.path().join("b.jpg");
        let stamp = FileTime::from_unix_time(1_500_000_000, 0);
        for path in [&second, &first] {
            fs::write(path, b"same").unwrap();
            set_file_mtime(path, stamp).unwrap();
        }

        let mut report = BatchReport::default();
        let groups = find_duplicates(dir.path(), None, &mut report).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keep, first);
        assert_eq!(groups[0].duplicates, vec![second]);
    }

    #[test]
    fn same_name_or_same_size_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("day1")).unwrap();
        fs::create_dir_all(dir.path().join("day2")).unwrap();
        fs::write(dir.path().join("day1/DSC0001.JPG"), b"first shot").unwrap();
        fs::write(dir.path().join("day2/DSC0001.JPG"), b"other shot").unwrap();
        fs::write(dir.path().join("lonely.JPG"), b"unique content here").unwrap();

        let report = clean_dupes(dir.path(), "_duplicates", false).unwrap();

        assert_eq!(report, BatchReport::default());
        assert!(!dir.path().join("_duplicates").exists());
        assert_eq!(outside_quarantine(dir.path()).len(), 3);
    }

    #[test]
    fn nested_duplicates_keep_their_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("card/DCIM")).unwrap();
        let keep = dir.path().join("a.jpg");
        let nested = dir.path().join("card/DCIM/a.jpg");
        fs::write(&keep, b"same").unwrap();
        fs::write(&nested, b"same").unwrap();
        set_file_mtime(&keep, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();
        set_file_mtime(&nested, FileTime::from_unix_time(1_000_000_100, 0)).unwrap();

        clean_dupes(dir.path(), "_duplicates", false).unwrap();

        assert!(keep.exists());
        assert!(dir.path().join("_duplicates/card/DCIM/a.jpg").exists());
    }

    #[test]
    fn dry_run_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"same").unwrap();
        fs::write(dir.path().join("b.jpg"), b"same").unwrap();

        let report = clean_dupes(dir.path(), "_duplicates", true).unwrap();

        assert_eq!(report.processed, 1);
        assert!(!dir.path().join("_duplicates").exists());
        assert_eq!(outside_quarantine(dir.path()).len(), 2);
    }

    #[test]
    fn quarantine_is_not_rescanned() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"same").unwrap();
        fs::write(dir.path().join("b.jpg"), b"same").unwrap();

        clean_dupes(dir.path(), "_duplicates", false).unwrap();
        let again = clean_dupes(dir.path(), "_duplicates", false).unwrap();

        assert_eq!(again, BatchReport::default());
        assert_eq!(outside_quarantine(dir.path()).len(), 1);
    }

    #[test]
    fn hash_is_sha256_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
