use crate::error::AppError;
use crate::metadata::{MetadataRecord, PhotoRecord};
use crate::metadata_source::MetadataSource;
use crate::organizer::{place_file, Transfer};
use crate::report::BatchReport;
use crate::walker;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A width:height proportion in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Reduces `width:height` by their GCD. Zero on either side has no ratio.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let divisor = gcd(width, height);
        Some(AspectRatio {
            width: width / divisor,
            height: height / divisor,
        })
    }
}

impl FromStr for AspectRatio {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidAspectRatio(s.to_string());
        let side = |part: &str| -> Result<u32, AppError> {
            let part = part.trim();
            // u32 parsing alone would let a leading '+' through.
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let (w, h) = s.split_once(':').ok_or_else(invalid)?;
        AspectRatio::new(side(w)?, side(h)?).ok_or_else(invalid)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Which photos `check_aspect_ratio` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    All,
    Match,
    NotMatch,
}

impl OutputMode {
    fn shows(self, matched: bool) -> bool {
        match self {
            OutputMode::All => true,
            OutputMode::Match => matched,
            OutputMode::NotMatch => !matched,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RatioSummary {
    pub matched: Vec<PathBuf>,
    /// Non-matching photos with their own reduced ratio.
    pub not_matched: Vec<(PathBuf, AspectRatio)>,
    /// Photos without width/height; in neither of the lists above.
    pub missing_dimensions: Vec<PathBuf>,
    pub unreadable: usize,
}

impl fmt::Display for RatioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} match, {} do not match, {} without width/height data",
            self.matched.len(),
            self.not_matched.len(),
            self.missing_dimensions.len()
        )
    }
}

pub fn classify(records: &[MetadataRecord], target: AspectRatio) -> RatioSummary {
    let mut summary = RatioSummary::default();
    for record in records {
        let photo = match PhotoRecord::from_metadata(record) {
            Ok(photo) => photo,
            Err(e) => {
                log::warn!("{}", e);
                summary.unreadable += 1;
                continue;
            }
        };

        match photo
            .dimensions()
            .and_then(|(w, h)| AspectRatio::new(w, h))
        {
            Some(actual) if actual == target => summary.matched.push(photo.source),
            Some(actual) => summary.not_matched.push((photo.source, actual)),
            None => summary.missing_dimensions.push(photo.source),
        }
    }
    summary
}

pub fn check_aspect_ratio(
    source: &dyn MetadataSource,
    src_dir: &Path,
    target: AspectRatio,
    extension: Option<&str>,
    mode: OutputMode,
    out: &mut dyn Write,
) -> Result<RatioSummary, AppError> {
    walker::ensure_dir(src_dir)?;
    log::info!(
        "Checking aspect ratio in directory: {:?} for aspect ratio: {}",
        src_dir,
        target
    );

    let summary = classify(&source.read_dir(src_dir, extension)?, target);

    if mode.shows(true) {
        for path in &summary.matched {
            writeln!(out, "Photo {} matches aspect ratio {}", path.display(), target)?;
        }
    }
    if mode.shows(false) {
        for (path, actual) in &summary.not_matched {
            writeln!(
                out,
                "Photo {} does not match aspect ratio {} (actual: {})",
                path.display(),
                target,
                actual
            )?;
        }
    }
    for path in &summary.missing_dimensions {
        writeln!(out, "Photo {} does not have width/height data", path.display())?;
    }
    writeln!(out, "{}", summary)?;

    Ok(summary)
}

/// Lists photos of the target ratio and, with `dest_dir`, copies them there.
pub fn get_by_aspect_ratio(
    source: &dyn MetadataSource,
    src_dir: &Path,
    target: AspectRatio,
    extension: Option<&str>,
    dest_dir: Option<&Path>,
    out: &mut dyn Write,
) -> Result<BatchReport, AppError> {
    walker::ensure_dir(src_dir)?;
    log::info!(
        "Getting photos by aspect ratio {} in directory: {:?}",
        target,
        src_dir
    );

    let summary = classify(&source.read_dir(src_dir, extension)?, target);
    let mut report = BatchReport::default();

    for path in &summary.matched {
        writeln!(out, "{}", path.display())?;

        let Some(dest_dir) = dest_dir else {
            report.success();
            continue;
        };
        let Some(target_path) = walker::mirrored_path(src_dir, path, dest_dir) else {
            report.record(&AppError::skipped(path.display().to_string(), "path has no file name"));
            continue;
        };
        match place_file(path, &target_path, Transfer::Copy) {
            Ok(()) => {
                log::info!("Copied: {:?} -> {:?}", path, target_path);
                report.success();
            }
            Err(e) => report.record(&e),
        }
    }

    if !summary.missing_dimensions.is_empty() {
        log::warn!(
            "{} photos have no width/height data and were not considered",
            summary.missing_dimensions.len()
        );
    }
    log::info!("Aspect ratio selection finished: {}", report);
    Ok(report)
}
