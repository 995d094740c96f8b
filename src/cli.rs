use crate::aspect_ratio::{AspectRatio, OutputMode};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Long options also accepted with a single dash, e.g. `-src_dir`.
const SINGLE_DASH_OPTIONS: &[&str] = &[
    "src_dir",
    "dest_dir",
    "dest_file",
    "aspect_ratio",
    "ext",
    "dry_run",
    "config",
];

#[derive(Parser, Debug)]
#[command(name = "photo-utils", version, about = "Photography utilities command line tool", long_about = None)]
pub struct Cli {
    /// Extra configuration file, layered over config/default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clean duplicate photos
    #[command(name = "clean_dupes")]
    CleanDupes {
        /// Source directory containing photos
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Report duplicates without moving them
        #[arg(short = 'd', long = "dry_run")]
        dry_run: bool,
    },

    /// Convert ARW files to JPG
    #[command(name = "arw2jpg")]
    Arw2Jpg {
        /// Source directory containing ARW files
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Destination directory for converted JPG files
        #[arg(long = "dest_dir")]
        dest_dir: PathBuf,
    },

    /// Convert ARW files to DNG
    #[command(name = "arw2dng")]
    Arw2Dng {
        /// Source directory containing ARW files
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Destination directory for converted DNG files
        #[arg(long = "dest_dir")]
        dest_dir: PathBuf,
    },

    /// Convert EXIF data to JSON
    #[command(name = "exif2json")]
    Exif2Json {
        /// Source directory containing photos
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Destination JSON file for EXIF data
        #[arg(long = "dest_file")]
        dest_file: PathBuf,

        #[command(flatten)]
        filter: ExtensionArg,
    },

    /// Organize photos by date
    #[command(name = "organize")]
    Organize {
        /// Source directory containing photos
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Destination directory for organized photos
        #[arg(long = "dest_dir")]
        dest_dir: PathBuf,

        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,
    },

    /// Check aspect ratio of photos
    #[command(name = "check_aspect_ratio")]
    CheckAspectRatio {
        /// Source directory containing photos
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Aspect ratio to check (e.g., 16:9)
        #[arg(long = "aspect_ratio", value_parser = parse_aspect_ratio)]
        aspect_ratio: AspectRatio,

        #[command(flatten)]
        mode: ModeFlags,

        #[command(flatten)]
        filter: ExtensionArg,
    },

    /// Get photos by aspect ratio
    #[command(name = "get_by_aspect_ratio")]
    GetByAspectRatio {
        /// Source directory containing photos
        #[arg(long = "src_dir")]
        src_dir: PathBuf,

        /// Aspect ratio to filter by (e.g., 16:9)
        #[arg(long = "aspect_ratio", value_parser = parse_aspect_ratio)]
        aspect_ratio: AspectRatio,

        /// Copy matching photos into this directory
        #[arg(long = "dest_dir")]
        dest_dir: Option<PathBuf>,

        #[command(flatten)]
        filter: ExtensionArg,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExtensionArg {
    /// Only read files with this extension ("*" for every file) [default: configured raw_extension]
    #[arg(long = "ext", value_name = "EXT")]
    pub ext: Option<String>,
}

impl ExtensionArg {
    pub fn resolve(&self, default: &str) -> Option<String> {
        match self.ext.as_deref().unwrap_or(default).trim_start_matches('.') {
            "" | "*" => None,
            ext => Some(ext.to_string()),
        }
    }
}

#[derive(Args, Debug, Clone, Copy, Default)]
#[group(multiple = false)]
pub struct ModeFlags {
    /// Print all photos
    #[arg(long)]
    pub all: bool,

    /// Print only matching photos
    #[arg(long = "match")]
    pub matching: bool,

    /// Print only non-matching photos
    #[arg(long = "not_match")]
    pub not_matching: bool,
}

impl ModeFlags {
    pub fn resolve(self) -> OutputMode {
        if self.matching {
            OutputMode::Match
        } else if self.not_matching {
            OutputMode::NotMatch
        } else {
            OutputMode::All
        }
    }
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

/// Rewrites `-src_dir` style options to `--src_dir` so clap accepts them.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let rewritten = arg.to_str().and_then(|s| {
                let rest = s.strip_prefix('-').filter(|r| !r.starts_with('-'))?;
                let name = rest.split('=').next().unwrap_or(rest);
                SINGLE_DASH_OPTIONS
                    .contains(&name)
                    .then(|| OsString::from(format!("-{}", s)))
            });
            rewritten.unwrap_or(arg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn single_dash_long_options_are_accepted() {
        let cli = parse(&["photo-utils", "organize", "-src_dir", "in", "-dest_dir=out"]).unwrap();
        match cli.command {
            Command::Organize { src_dir, dest_dir, copy } => {
                assert_eq!(src_dir, PathBuf::from("in"));
                assert_eq!(dest_dir, PathBuf::from("out"));
                assert!(!copy);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn dry_run_short_flag() {
        let cli = parse(&["photo-utils", "clean_dupes", "-src_dir", "in", "-d"]).unwrap();
        assert!(matches!(cli.command, Command::CleanDupes { dry_run: true, .. }));
    }

    #[test]
    fn mode_defaults_to_all_and_flags_are_exclusive() {
        let cli = parse(&["photo-utils", "check_aspect_ratio", "-src_dir", "in", "-aspect_ratio", "3:2"]).unwrap();
        match cli.command {
            Command::CheckAspectRatio { aspect_ratio, mode, .. } => {
                assert_eq!(aspect_ratio.to_string(), "3:2");
                assert_eq!(mode.resolve(), OutputMode::All);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = parse(&["photo-utils", "check_aspect_ratio", "-src_dir", "in", "-aspect_ratio", "3:2", "--not_match"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::CheckAspectRatio { mode, .. } if mode.resolve() == OutputMode::NotMatch
        ));

        assert!(parse(&["photo-utils", "check_aspect_ratio", "-src_dir", "in", "-aspect_ratio", "3:2", "--match", "--not_match"]).is_err());
    }

    #[test]
    fn bad_ratio_is_a_usage_error() {
        assert!(parse(&["photo-utils", "get_by_aspect_ratio", "-src_dir", "in", "-aspect_ratio", "16x9"]).is_err());
    }

    #[test]
    fn extension_filter_resolution() {
        let default = ExtensionArg::default();
        assert_eq!(default.resolve("ARW").as_deref(), Some("ARW"));
        let all = ExtensionArg { ext: Some("*".to_string()) };
        assert_eq!(all.resolve("ARW"), None);
        let jpg = ExtensionArg { ext: Some(".jpg".to_string()) };
        assert_eq!(jpg.resolve("ARW").as_deref(), Some("jpg"));
    }

    #[test]
    fn values_that_look_like_options_are_untouched() {
        let args = normalize_args(["-x", "--src_dir", "-d", "-srcdir"].map(OsString::from));
        assert_eq!(args, ["-x", "--src_dir", "-d", "-srcdir"].map(OsString::from));
    }
}
